use std::{fmt, num::ParseIntError, str::FromStr};

use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TodoId(pub u64);

impl From<u64> for TodoId {
    fn from(id: u64) -> Self {
        TodoId(id)
    }
}

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid todo id {input:?}: {source}")]
pub struct IdParseError {
    input: String,
    source: ParseIntError,
}

/// Ids typed into the UI arrive as text and are coerced into the numeric
/// domain used at creation, so `" 42 "` and `42` name the same record.
impl FromStr for TodoId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(TodoId)
            .map_err(|source| IdParseError {
                input: s.to_string(),
                source,
            })
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Pending,
    Completed,
}

impl Status {
    pub fn toggled(self) -> Status {
        match self {
            Status::Pending => Status::Completed,
            Status::Completed => Status::Pending,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::Completed => "completed",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: TodoId,
    pub description: String,
    #[serde(rename = "dueDate", default)]
    pub due_date: String,
    #[serde(default)]
    pub status: Status,
}

impl Todo {
    pub fn is_completed(&self) -> bool {
        self.status == Status::Completed
    }

    /// Shallow merge: every field set on the patch overwrites, the rest stay.
    pub fn apply(&mut self, patch: TodoPatch) {
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = due_date;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
    }
}

/// Partial set of fields for an update. The id is not patchable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoPatch {
    pub description: Option<String>,
    pub due_date: Option<String>,
    pub status: Option<Status>,
}

impl TodoPatch {
    pub fn status(status: Status) -> Self {
        TodoPatch {
            status: Some(status),
            ..TodoPatch::default()
        }
    }
}
