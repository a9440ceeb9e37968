use std::{collections::HashMap, path::Path};

use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("could not serialize todos: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not determine home directory")]
    NoHomeDir,
    #[error("no todo ids left above the largest stored id")]
    IdsExhausted,
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Durable string-keyed storage. `set` replaces the whole value under the key.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> StorageResult<()>;
}

pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    pub fn open(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;
        init_db(&conn)?;
        debug!(path = %path.display(), "opened sqlite storage");
        Ok(SqliteStorage { conn })
    }

    #[cfg(test)]
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        init_db(&conn)?;
        Ok(SqliteStorage { conn })
    }
}

fn init_db(conn: &Connection) -> StorageResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS storage (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
        params![],
    )?;

    Ok(())
}

impl KeyValueStore for SqliteStorage {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM storage WHERE key = ?",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> StorageResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO storage (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        debug!(key, bytes = value.len(), "wrote storage value");
        Ok(())
    }
}

/// Process-local storage for `--ephemeral` sessions and tests.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: HashMap<String, String>,
    writes: usize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        MemoryStorage::default()
    }

    #[cfg(test)]
    pub fn with_value(key: &str, value: &str) -> Self {
        let mut values = HashMap::new();
        values.insert(key.to_string(), value.to_string());
        MemoryStorage { values, writes: 0 }
    }

    /// Number of `set` calls so far.
    #[cfg(test)]
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl KeyValueStore for MemoryStorage {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> StorageResult<()> {
        self.values.insert(key.to_string(), value.to_string());
        self.writes += 1;
        debug!(key, writes = self.writes, "wrote memory value");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn sqlite_get_missing_key_is_none() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        assert_eq!(storage.get("todos").unwrap(), None);
    }

    #[test]
    fn sqlite_set_replaces_value() {
        let mut storage = SqliteStorage::open_in_memory().unwrap();
        storage.set("todos", "[]").unwrap();
        storage.set("todos", "[1]").unwrap();
        assert_eq!(storage.get("todos").unwrap().as_deref(), Some("[1]"));
    }

    #[test]
    fn sqlite_keys_are_independent() {
        let mut storage = SqliteStorage::open_in_memory().unwrap();
        storage.set("a", "1").unwrap();
        storage.set("b", "2").unwrap();
        assert_eq!(storage.get("a").unwrap().as_deref(), Some("1"));
        assert_eq!(storage.get("b").unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn sqlite_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("todos.sqlite");
        {
            let mut storage = SqliteStorage::open(&path).unwrap();
            storage.set("todos", r#"[{"id":1}]"#).unwrap();
        }
        let storage = SqliteStorage::open(&path).unwrap();
        assert_eq!(
            storage.get("todos").unwrap().as_deref(),
            Some(r#"[{"id":1}]"#)
        );
    }

    #[test]
    fn memory_counts_writes() {
        let mut storage = MemoryStorage::with_value("todos", "[]");
        assert_eq!(storage.writes(), 0);
        assert_eq!(storage.get("todos").unwrap().as_deref(), Some("[]"));
        storage.set("todos", "[ ]").unwrap();
        assert_eq!(storage.writes(), 1);
        assert_eq!(storage.get("other").unwrap(), None);
    }
}
