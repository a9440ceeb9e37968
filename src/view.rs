//! Turns the todo list into display rows. Nothing here touches the terminal;
//! the TUI and the plain-text printer both draw from these rows.

use chrono::NaiveDate;

use crate::model::{Status, Todo, TodoId};

const DUE_DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemView {
    pub id: TodoId,
    pub description: String,
    pub due: String,
    pub status: String,
    pub toggle_label: &'static str,
    pub delete_label: &'static str,
    pub completed: bool,
    pub overdue: bool,
}

impl ItemView {
    pub fn line(&self) -> String {
        let mut line = format!("{} {}", self.id, self.description);
        if !self.due.is_empty() {
            line.push(' ');
            line.push_str(&self.due);
        }
        format!(
            "{}  {}  [{}] [{}]",
            line, self.status, self.toggle_label, self.delete_label
        )
    }
}

/// One full render pass: a row per todo, in list order.
pub fn render(todos: &[Todo], today: NaiveDate) -> Vec<ItemView> {
    todos.iter().map(|todo| item(todo, today)).collect()
}

fn item(todo: &Todo, today: NaiveDate) -> ItemView {
    let due = match todo.due_date.is_empty() {
        true => String::new(),
        false => format!("(Due: {})", todo.due_date),
    };
    let overdue = todo.status == Status::Pending
        && NaiveDate::parse_from_str(todo.due_date.trim(), DUE_DATE_FORMAT)
            .map(|date| date < today)
            .unwrap_or(false);

    ItemView {
        id: todo.id,
        description: todo.description.clone(),
        due,
        status: format!("Status: {}", todo.status),
        toggle_label: match todo.status {
            Status::Pending => "Complete",
            Status::Completed => "Undo",
        },
        delete_label: "Delete",
        completed: todo.is_completed(),
        overdue,
    }
}
