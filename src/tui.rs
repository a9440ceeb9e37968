use std::{
    cell::RefCell,
    cmp::min,
    error::Error,
    io::{self, Stdout},
    rc::Rc,
    time::Duration,
};

use chrono::Local;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::Backend,
    prelude::{Alignment, Constraint, CrosstermBackend, Direction, Layout},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, List, ListItem, ListState, Paragraph},
    Terminal,
};
use tracing::error;

use crate::{
    ids::IdGenerator,
    storage::{KeyValueStore, StorageResult},
    store::TodoStore,
    view::{render, ItemView},
};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum InputField {
    Description,
    DueDate,
}

impl InputField {
    fn title(self) -> &'static str {
        match self {
            InputField::Description => "Task description",
            InputField::DueDate => "Due date (YYYY-MM-DD)",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AppState {
    List,
    Create,
    Input(InputField),
}

#[derive(Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct State {
    pub todo_description: String,
    pub todo_due_date: String,
    pub state: AppState,
    pub input: String,
    pub todo_list_state: ListState,
    pub message: Option<String>,
    rows: Rc<RefCell<Vec<ItemView>>>,
}

impl State {
    /// Paints the store's current list and re-renders on every later change.
    pub fn attach<S: KeyValueStore, G: IdGenerator>(store: &mut TodoStore<S, G>) -> Self {
        let rows = Rc::new(RefCell::new(render(
            &store.get_todos(),
            Local::now().date_naive(),
        )));
        let sink = Rc::clone(&rows);
        store.subscribe(move |todos| {
            *sink.borrow_mut() = render(todos, Local::now().date_naive());
        });

        let mut todo_list_state = ListState::default();
        if !rows.borrow().is_empty() {
            todo_list_state.select(Some(0));
        }

        State {
            todo_description: "".to_string(),
            todo_due_date: "".to_string(),
            state: AppState::List,
            input: "".to_string(),
            todo_list_state,
            message: None,
            rows,
        }
    }

    pub fn rows(&self) -> Vec<ItemView> {
        self.rows.borrow().clone()
    }

    fn selected_row(&self) -> Option<ItemView> {
        let index = self.todo_list_state.selected()?;
        self.rows.borrow().get(index).cloned()
    }

    fn clamp_selection(&mut self) {
        let len = self.rows.borrow().len();
        let selected = match (len, self.todo_list_state.selected()) {
            (0, _) => None,
            (len, Some(index)) => Some(min(index, len - 1)),
            (_, None) => None,
        };
        self.todo_list_state.select(selected);
    }
}

pub fn run<S: KeyValueStore, G: IdGenerator>(
    store: &mut TodoStore<S, G>,
) -> Result<(), Box<dyn Error>> {
    let state = State::attach(store);
    let mut terminal = setup_terminal()?;
    let result = event_loop(&mut terminal, store, state);
    restore_terminal(&mut terminal)?;
    result
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>, Box<dyn Error>> {
    let mut stdout = io::stdout();
    enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen)?;
    Ok(Terminal::new(CrosstermBackend::new(stdout))?)
}

fn restore_terminal(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
) -> Result<(), Box<dyn Error>> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen,)?;
    Ok(terminal.show_cursor()?)
}

fn event_loop<B: Backend, S: KeyValueStore, G: IdGenerator>(
    terminal: &mut Terminal<B>,
    store: &mut TodoStore<S, G>,
    mut state: State,
) -> Result<(), Box<dyn Error>> {
    loop {
        draw(terminal, &mut state)?;

        if event::poll(Duration::from_millis(250))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if handle_key(&mut state, store, key.code) == Flow::Quit {
                    return Ok(());
                }
            }
        }
    }
}

/// Applies one key press. Storage failures are logged and shown in the footer.
pub fn handle_key<S: KeyValueStore, G: IdGenerator>(
    state: &mut State,
    store: &mut TodoStore<S, G>,
    code: KeyCode,
) -> Flow {
    let result = match state.state {
        AppState::List => list_key(state, store, code),
        AppState::Create => create_key(state, store, code),
        AppState::Input(field) => {
            input_key(state, field, code);
            Ok(Flow::Continue)
        }
    };
    state.clamp_selection();

    match result {
        Ok(flow) => flow,
        Err(err) => {
            error!(%err, "storage operation failed");
            state.message = Some(format!("Could not save: {}", err));
            Flow::Continue
        }
    }
}

fn list_key<S: KeyValueStore, G: IdGenerator>(
    state: &mut State,
    store: &mut TodoStore<S, G>,
    code: KeyCode,
) -> StorageResult<Flow> {
    state.message = None;
    match code {
        KeyCode::Char('q') => return Ok(Flow::Quit),
        KeyCode::Char('N') => state.state = AppState::Create,
        KeyCode::Char('j') | KeyCode::Down => move_down(state),
        KeyCode::Char('k') | KeyCode::Up => move_up(state),
        KeyCode::Char(' ') | KeyCode::Char('l') => {
            if let Some(row) = state.selected_row() {
                store.toggle_status(row.id)?;
            }
        }
        KeyCode::Char('D') => {
            if let Some(row) = state.selected_row() {
                store.delete_todo(row.id)?;
            }
        }
        KeyCode::Char('C') => store.clear_completed_tasks()?,
        _ => {}
    }
    Ok(Flow::Continue)
}

fn create_key<S: KeyValueStore, G: IdGenerator>(
    state: &mut State,
    store: &mut TodoStore<S, G>,
    code: KeyCode,
) -> StorageResult<Flow> {
    match code {
        KeyCode::Char('q') => {
            state.state = AppState::List;
        }
        KeyCode::Char('d') => {
            state.input = state.todo_description.clone();
            state.state = AppState::Input(InputField::Description);
        }
        KeyCode::Char('u') => {
            state.input = state.todo_due_date.clone();
            state.state = AppState::Input(InputField::DueDate);
        }
        KeyCode::Char('s') => {
            if store
                .add_todo(&state.todo_description, &state.todo_due_date)?
                .is_some()
            {
                state.todo_description = "".to_string();
                state.todo_due_date = "".to_string();
                state.state = AppState::List;
                let last = state.rows.borrow().len().checked_sub(1);
                state.todo_list_state.select(last);
            }
        }
        _ => {}
    }
    Ok(Flow::Continue)
}

fn input_key(state: &mut State, field: InputField, code: KeyCode) {
    match code {
        KeyCode::Char(c) => {
            state.input.push(c);
        }
        KeyCode::Backspace => {
            state.input.pop();
        }
        KeyCode::Esc => {
            state.input = "".to_string();
            state.state = AppState::Create;
        }
        KeyCode::Enter => {
            let value = std::mem::take(&mut state.input);
            match field {
                InputField::Description => state.todo_description = value,
                InputField::DueDate => state.todo_due_date = value,
            }
            state.state = AppState::Create;
        }
        _ => {}
    }
}

fn move_up(state: &mut State) {
    match state.todo_list_state.selected() {
        Some(v) => {
            state.todo_list_state.select(Some(v.saturating_sub(1)));
        }
        None => {
            state.todo_list_state.select(Some(0));
        }
    }
}

fn move_down(state: &mut State) {
    let len = state.rows.borrow().len();
    if len == 0 {
        return;
    }
    match state.todo_list_state.selected() {
        Some(v) => {
            state.todo_list_state.select(Some(min(v + 1, len - 1)));
        }
        None => {
            state.todo_list_state.select(Some(0));
        }
    }
}

pub fn draw<B: Backend>(terminal: &mut Terminal<B>, state: &mut State) -> io::Result<()> {
    match state.state {
        AppState::List => draw_todos(terminal, state),
        AppState::Create => draw_create_todo(terminal, state),
        AppState::Input(field) => draw_input(terminal, state, field),
    }
}

fn draw_input<B: Backend>(
    terminal: &mut Terminal<B>,
    state: &State,
    field: InputField,
) -> io::Result<()> {
    terminal.draw(|frame| {
        let size = frame.size();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(2)
            .constraints(
                [
                    Constraint::Length(3),
                    Constraint::Length(4),
                    Constraint::Min(0),
                ]
                .as_ref(),
            )
            .split(size);

        frame.render_widget(
            Paragraph::new("(Enter) Keep  (Esc) Discard")
                .style(Style::default())
                .alignment(Alignment::Center),
            chunks[0],
        );
        frame.render_widget(
            Paragraph::new(state.input.clone())
                .block(
                    Block::default()
                        .title(field.title())
                        .borders(Borders::ALL)
                        .border_type(BorderType::Rounded),
                )
                .style(Style::default())
                .alignment(Alignment::Center),
            chunks[1],
        )
    })?;
    Ok(())
}

fn draw_todos<B: Backend>(terminal: &mut Terminal<B>, state: &mut State) -> io::Result<()> {
    let rows = state.rows();
    let completed = rows.iter().filter(|row| row.completed).count();

    let todo_items: Vec<_> = rows
        .iter()
        .map(|row| {
            let description_style = match (row.completed, row.overdue) {
                (true, _) => Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::CROSSED_OUT),
                (false, true) => Style::default().fg(Color::Red),
                (false, false) => Style::default(),
            };
            ListItem::new(Line::from(vec![
                Span::styled(row.description.clone(), description_style),
                Span::raw(" "),
                Span::styled(row.due.clone(), Style::default().fg(Color::Gray)),
                Span::raw("  "),
                Span::raw(row.status.clone()),
                Span::raw("  "),
                Span::styled(
                    format!("[{}]", row.toggle_label),
                    Style::default().fg(Color::Green),
                ),
                Span::raw(" "),
                Span::styled(
                    format!("[{}]", row.delete_label),
                    Style::default().fg(Color::Red),
                ),
            ]))
        })
        .collect();

    let todo_ui = List::new(todo_items)
        .block(Block::default().title("Todos").borders(Borders::ALL))
        .style(Style::default().fg(Color::White))
        .highlight_style(Style::default().add_modifier(Modifier::ITALIC))
        .highlight_symbol(">>");

    let footer = match &state.message {
        Some(message) => Line::from(Span::styled(
            message.clone(),
            Style::default().fg(Color::Red),
        )),
        None => Line::from(format!(
            "{} pending, {} completed   (N) New  (space) Complete/Undo  (D) Delete  (C) Clear completed  (q) Quit",
            rows.len() - completed,
            completed
        )),
    };

    terminal.draw(|frame| {
        let size = frame.size();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(2)
            .constraints([Constraint::Min(2), Constraint::Length(1)].as_ref())
            .split(size);

        frame.render_stateful_widget(todo_ui, chunks[0], &mut state.todo_list_state);
        frame.render_widget(Paragraph::new(footer), chunks[1]);
    })?;
    Ok(())
}

fn draw_create_todo<B: Backend>(terminal: &mut Terminal<B>, state: &State) -> io::Result<()> {
    terminal.draw(|frame| {
        let size = frame.size();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(2)
            .constraints(
                [
                    Constraint::Min(2),
                    Constraint::Min(5),
                    Constraint::Length(4),
                    Constraint::Length(4),
                ]
                .as_ref(),
            )
            .split(size);

        let text = vec![
            Line::from("(d) Input description"),
            Line::from("(u) Input due date"),
            Line::from("(s) Save todo".green().italic()),
            Line::from("(q) Cancel".red()),
        ];

        frame.render_widget(
            Paragraph::new("New todo")
                .style(Style::default())
                .alignment(Alignment::Center),
            chunks[0],
        );
        frame.render_widget(
            Paragraph::new(text)
                .style(Style::default())
                .alignment(Alignment::Center),
            chunks[1],
        );

        frame.render_widget(
            Paragraph::new(state.todo_description.clone())
                .block(
                    Block::default()
                        .title("Description")
                        .borders(Borders::ALL)
                        .border_type(BorderType::Rounded),
                )
                .style(Style::default())
                .alignment(Alignment::Center),
            chunks[2],
        );

        frame.render_widget(
            Paragraph::new(state.todo_due_date.clone())
                .block(
                    Block::default()
                        .title("Due date")
                        .borders(Borders::ALL)
                        .border_type(BorderType::Rounded),
                )
                .style(Style::default())
                .alignment(Alignment::Center),
            chunks[3],
        );
    })?;
    Ok(())
}
