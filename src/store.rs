use tracing::{debug, info, warn};

use crate::{
    ids::IdGenerator,
    model::{Status, Todo, TodoId, TodoPatch},
    storage::{KeyValueStore, StorageError, StorageResult},
};

pub const DEFAULT_KEY: &str = "todos";

type Listener = Box<dyn FnMut(&[Todo])>;

/// Owns the todo list. Every change is written to storage first and only then
/// committed in memory and pushed to the subscribers, so a failed write leaves
/// both sides as they were.
pub struct TodoStore<S, G> {
    storage: S,
    ids: G,
    key: String,
    todos: Vec<Todo>,
    listeners: Vec<Listener>,
}

impl<S: KeyValueStore, G: IdGenerator> TodoStore<S, G> {
    pub fn open(storage: S, mut ids: G, key: &str) -> StorageResult<Self> {
        let todos = match storage.get(key)? {
            Some(raw) => match serde_json::from_str::<Vec<Todo>>(&raw) {
                Ok(todos) => todos,
                Err(error) => {
                    warn!(key, %error, "stored todos are malformed, starting empty");
                    vec![]
                }
            },
            None => vec![],
        };
        if let Some(max) = todos.iter().map(|todo| todo.id).max() {
            ids.seed(max);
        }
        info!(key, count = todos.len(), "loaded todos");

        Ok(TodoStore {
            storage,
            ids,
            key: key.to_string(),
            todos,
            listeners: vec![],
        })
    }

    /// Registers a render callback, called with the full list after every change.
    pub fn subscribe(&mut self, listener: impl FnMut(&[Todo]) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn add_todo(&mut self, description: &str, due_date: &str) -> StorageResult<Option<Todo>> {
        let description = description.trim();
        if description.is_empty() {
            return Ok(None);
        }

        let todo = Todo {
            id: self.ids.next_id().ok_or(StorageError::IdsExhausted)?,
            description: description.to_string(),
            due_date: due_date.to_string(),
            status: Status::Pending,
        };
        let mut todos = self.todos.clone();
        todos.push(todo.clone());
        self.commit(todos)?;
        debug!(id = %todo.id, "added todo");
        Ok(Some(todo))
    }

    pub fn get_todos(&self) -> Vec<Todo> {
        self.todos.clone()
    }

    pub fn get_todo(&self, id: TodoId) -> Option<Todo> {
        self.todos.iter().find(|todo| todo.id == id).cloned()
    }

    /// Returns `false` without touching storage when no todo has `id`.
    pub fn update_todo(&mut self, id: TodoId, patch: TodoPatch) -> StorageResult<bool> {
        let Some(index) = self.todos.iter().position(|todo| todo.id == id) else {
            return Ok(false);
        };

        let mut todos = self.todos.clone();
        todos[index].apply(patch);
        self.commit(todos)?;
        Ok(true)
    }

    /// Always reports `true`, even when nothing had `id`.
    pub fn delete_todo(&mut self, id: TodoId) -> StorageResult<bool> {
        let todos = self
            .todos
            .iter()
            .filter(|todo| todo.id != id)
            .cloned()
            .collect();
        self.commit(todos)?;
        Ok(true)
    }

    pub fn toggle_status(&mut self, id: TodoId) -> StorageResult<()> {
        if let Some(todo) = self.get_todo(id) {
            self.update_todo(id, TodoPatch::status(todo.status.toggled()))?;
        }
        Ok(())
    }

    pub fn clear_completed_tasks(&mut self) -> StorageResult<()> {
        let todos = self
            .todos
            .iter()
            .filter(|todo| !todo.is_completed())
            .cloned()
            .collect();
        self.commit(todos)
    }

    pub fn len(&self) -> usize {
        self.todos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.todos.is_empty()
    }

    pub fn completed_count(&self) -> usize {
        self.todos.iter().filter(|todo| todo.is_completed()).count()
    }

    pub fn pending_count(&self) -> usize {
        self.len() - self.completed_count()
    }

    fn commit(&mut self, todos: Vec<Todo>) -> StorageResult<()> {
        let raw = serde_json::to_string(&todos)?;
        self.storage.set(&self.key, &raw)?;
        self.todos = todos;
        for listener in self.listeners.iter_mut() {
            listener(&self.todos);
        }
        Ok(())
    }
}

#[cfg(test)]
impl<S, G> TodoStore<S, G> {
    pub fn storage(&self) -> &S {
        &self.storage
    }
}
