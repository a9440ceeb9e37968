use std::{
    env, fs,
    path::{Path, PathBuf},
};

use clap::{Parser, Subcommand};

use crate::{
    model::TodoId,
    storage::{StorageError, StorageResult},
    store::DEFAULT_KEY,
};

#[derive(Debug, Parser)]
#[command(name = "todo-store", version, about = "Keep a todo list in a local store")]
pub struct Cli {
    /// SQLite file holding the list [default: ~/.todo/todos.sqlite]
    #[arg(long, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// Storage key the list is kept under
    #[arg(long, default_value = DEFAULT_KEY)]
    pub key: String,

    /// Keep the list in memory only; nothing is written to disk
    #[arg(long, conflicts_with = "db")]
    pub ephemeral: bool,

    /// Log filter, e.g. `debug` or `todo_store=trace`
    #[arg(long, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the list
    List,
    /// Add a todo
    Add {
        description: String,
        #[arg(long, default_value = "")]
        due: String,
    },
    /// Flip a todo between pending and completed
    Toggle { id: TodoId },
    /// Delete a todo
    Delete { id: TodoId },
    /// Remove every completed todo
    ClearCompleted,
}

impl Cli {
    pub fn db_path(&self) -> StorageResult<PathBuf> {
        match &self.db {
            Some(path) => {
                if let Some(parent) = path.parent() {
                    ensure_dir(parent)?;
                }
                Ok(path.clone())
            }
            None => default_db_path(),
        }
    }
}

fn default_db_path() -> StorageResult<PathBuf> {
    let home_dir: PathBuf = env::var_os("HOME")
        .map(PathBuf::from)
        .ok_or(StorageError::NoHomeDir)?;
    let dir = home_dir.join(".todo");
    ensure_dir(&dir)?;
    Ok(dir.join("todos.sqlite"))
}

fn ensure_dir(dir: &Path) -> StorageResult<()> {
    if !dir.as_os_str().is_empty() && !dir.is_dir() {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}
