use std::{error::Error, fs::OpenOptions, path::Path, sync::Mutex};

use chrono::Local;
use clap::Parser;
use config::{Cli, Command};
use ids::{ClockIds, IdGenerator, SequentialIds};
use storage::{KeyValueStore, MemoryStorage, SqliteStorage};
use store::TodoStore;
use tracing_subscriber::EnvFilter;
use view::render;

mod config;
mod ids;
mod model;
mod storage;
mod store;
mod tui;
mod view;

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if cli.ephemeral {
        init_logging(&cli.log_level, None)?;
        let store = TodoStore::open(MemoryStorage::new(), SequentialIds::new(), &cli.key)?;
        return dispatch(store, cli.command);
    }

    let db_path = cli.db_path()?;
    init_logging(&cli.log_level, Some(&db_path.with_file_name("todo-store.log")))?;
    let storage = SqliteStorage::open(&db_path)?;
    let store = TodoStore::open(storage, ClockIds::new(), &cli.key)?;
    dispatch(store, cli.command)
}

/// Logs go to a file beside the database so they never draw over the UI.
fn init_logging(filter: &str, log_file: Option<&Path>) -> Result<(), Box<dyn Error>> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(filter)?)
        .with_target(false);

    match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.with_writer(std::io::stderr).init(),
    }
    Ok(())
}

fn dispatch<S: KeyValueStore, G: IdGenerator>(
    mut store: TodoStore<S, G>,
    command: Option<Command>,
) -> Result<(), Box<dyn Error>> {
    let Some(command) = command else {
        return tui::run(&mut store);
    };

    store.subscribe(|todos| print_list(&render(todos, Local::now().date_naive())));

    match command {
        Command::List => {
            if store.is_empty() {
                println!("No todos");
            } else {
                print_list(&render(&store.get_todos(), Local::now().date_naive()));
                println!(
                    "{} pending, {} completed",
                    store.pending_count(),
                    store.completed_count()
                );
            }
        }
        Command::Add { description, due } => {
            if store.add_todo(&description, &due)?.is_none() {
                println!("Nothing added: description is empty");
            }
        }
        Command::Toggle { id } => {
            if store.get_todo(id).is_none() {
                println!("No todo with id {}", id);
            }
            store.toggle_status(id)?;
        }
        Command::Delete { id } => {
            store.delete_todo(id)?;
        }
        Command::ClearCompleted => store.clear_completed_tasks()?,
    }
    Ok(())
}

fn print_list(rows: &[view::ItemView]) {
    for row in rows {
        match row.overdue {
            true => println!("{}  (overdue)", row.line()),
            false => println!("{}", row.line()),
        }
    }
}
