use chrono::Utc;

use crate::model::TodoId;

/// Source of fresh todo ids, injected into the store.
pub trait IdGenerator {
    /// `None` once the id space above everything issued is used up.
    fn next_id(&mut self) -> Option<TodoId>;

    /// Called once after loading so later ids land above everything persisted.
    fn seed(&mut self, max_existing: TodoId);
}

#[derive(Debug)]
pub struct SequentialIds {
    next: Option<u64>,
}

impl SequentialIds {
    pub fn new() -> Self {
        SequentialIds { next: Some(1) }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        SequentialIds::new()
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self) -> Option<TodoId> {
        let id = self.next?;
        self.next = id.checked_add(1);
        Some(TodoId(id))
    }

    fn seed(&mut self, max_existing: TodoId) {
        self.next = match (self.next, max_existing.0.checked_add(1)) {
            (Some(next), Some(above)) => Some(next.max(above)),
            _ => None,
        };
    }
}

/// Millisecond timestamps, bumped so two ids from the same tick still differ.
#[derive(Debug)]
pub struct ClockIds<F = fn() -> u64> {
    now: F,
    last: Option<u64>,
}

fn now_millis() -> u64 {
    u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0)
}

impl ClockIds {
    pub fn new() -> Self {
        ClockIds {
            now: now_millis,
            last: None,
        }
    }
}

impl Default for ClockIds {
    fn default() -> Self {
        ClockIds::new()
    }
}

impl<F: FnMut() -> u64> ClockIds<F> {
    #[cfg(test)]
    pub fn with_clock(now: F) -> Self {
        ClockIds { now, last: None }
    }
}

impl<F: FnMut() -> u64> IdGenerator for ClockIds<F> {
    fn next_id(&mut self) -> Option<TodoId> {
        let now = (self.now)();
        let id = match self.last {
            Some(last) => now.max(last.checked_add(1)?),
            None => now,
        };
        self.last = Some(id);
        Some(TodoId(id))
    }

    fn seed(&mut self, max_existing: TodoId) {
        let last = self.last.map_or(max_existing.0, |last| last.max(max_existing.0));
        self.last = Some(last);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequential_starts_at_one() {
        let mut ids = SequentialIds::new();
        assert_eq!(ids.next_id(), Some(TodoId(1)));
        assert_eq!(ids.next_id(), Some(TodoId(2)));
    }

    #[test]
    fn sequential_seed_skips_existing() {
        let mut ids = SequentialIds::new();
        ids.seed(TodoId(10));
        assert_eq!(ids.next_id(), Some(TodoId(11)));
        ids.seed(TodoId(3));
        assert_eq!(ids.next_id(), Some(TodoId(12)));
    }

    #[test]
    fn clock_ids_follow_the_clock() {
        let mut tick = 1_000;
        let mut ids = ClockIds::with_clock(move || {
            tick += 5;
            tick
        });
        assert_eq!(ids.next_id(), Some(TodoId(1_005)));
        assert_eq!(ids.next_id(), Some(TodoId(1_010)));
    }

    #[test]
    fn clock_ids_never_collide_within_a_tick() {
        let mut ids = ClockIds::with_clock(|| 1_700_000_000_000);
        let a = ids.next_id().unwrap();
        let b = ids.next_id().unwrap();
        let c = ids.next_id().unwrap();
        assert!(a < b && b < c);
    }

    #[test]
    fn clock_ids_stay_above_seed() {
        let mut ids = ClockIds::with_clock(|| 50);
        ids.seed(TodoId(100));
        assert_eq!(ids.next_id(), Some(TodoId(101)));
    }

    #[test]
    fn system_clock_is_monotonic() {
        let mut ids = ClockIds::new();
        let a = ids.next_id().unwrap();
        let b = ids.next_id().unwrap();
        assert!(b > a);
    }

    #[test]
    fn sequential_seeded_with_max_id_is_exhausted() {
        let mut ids = SequentialIds::new();
        ids.seed(TodoId(u64::MAX));
        assert_eq!(ids.next_id(), None);
    }

    #[test]
    fn sequential_stops_after_max_id() {
        let mut ids = SequentialIds::new();
        ids.seed(TodoId(u64::MAX - 1));
        assert_eq!(ids.next_id(), Some(TodoId(u64::MAX)));
        assert_eq!(ids.next_id(), None);
    }

    #[test]
    fn clock_ids_seeded_with_max_id_are_exhausted() {
        let mut ids = ClockIds::with_clock(|| 1_700_000_000_000);
        ids.seed(TodoId(u64::MAX));
        assert_eq!(ids.next_id(), None);
    }

    #[test]
    fn clock_at_max_issues_one_id() {
        let mut ids = ClockIds::with_clock(|| u64::MAX);
        assert_eq!(ids.next_id(), Some(TodoId(u64::MAX)));
        assert_eq!(ids.next_id(), None);
    }
}
