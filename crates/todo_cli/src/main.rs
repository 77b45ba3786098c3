//! Command-line driver for the task list core.
//!
//! # Responsibility
//! - Act as the view layer: emit one event per invocation, wait for its
//!   deferred commit, and print the resulting list.
//! - Persist through a SQLite file given on the command line.
//!
//! Usage: `todo_cli <db-path> <command> [args]`

use std::process::ExitCode;
use todo_core::db::open_db;
use todo_core::{
    default_log_level, init_logging, open_session, Filter, SqliteKeyValueStore, StateStore,
    StoreConfig, TodoEvent, TodoId, UiStatus,
};

const USAGE: &str = "usage: todo_cli <db-path> <list|add <text>|toggle <n>|edit <n> <text>|remove <n>|clear-completed|filter <all|active|completed>>";

fn main() -> ExitCode {
    match run(std::env::args().skip(1).collect()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Vec<String>) -> Result<(), String> {
    let (db_path, command) = match args.split_first() {
        Some((path, rest)) if !rest.is_empty() => (path, rest),
        _ => return Err(USAGE.to_string()),
    };

    if let Ok(log_dir) = std::env::var("TODOS_LOG_DIR") {
        let level =
            std::env::var("TODOS_LOG_LEVEL").unwrap_or_else(|_| default_log_level().to_string());
        init_logging(&level, &log_dir)?;
    }

    let conn = open_db(db_path).map_err(|err| format!("cannot open `{db_path}`: {err}"))?;
    let config = StoreConfig::default();
    let (mut store, reactions) = open_session(&config, Box::new(SqliteKeyValueStore::new(conn)))
        .map_err(|err| format!("cannot load state: {err}"))?;

    if let Some(event) = parse_command(&store, command)? {
        store.emit(event);
        if store.pending_jobs() > 0 {
            println!("Saving...");
        }
        store.advance(config.latency);
        store.run_until_idle();
    }

    for err in reactions.take_errors() {
        eprintln!("error: {err}");
    }
    print_state(&store);
    Ok(())
}

fn parse_command(store: &StateStore, command: &[String]) -> Result<Option<TodoEvent>, String> {
    let name = command[0].as_str();
    let args = &command[1..];
    let event = match (name, args) {
        ("list", []) => return Ok(None),
        ("add", [_, ..]) => TodoEvent::create(todo_text(args)?),
        ("toggle", [n]) => TodoEvent::Toggle {
            id: todo_at(store, n)?,
        },
        ("edit", [n, text @ ..]) if !text.is_empty() => {
            let id = todo_at(store, n)?;
            TodoEvent::update(id, todo_text(text)?)
        }
        ("remove", [n]) => TodoEvent::Delete {
            id: todo_at(store, n)?,
        },
        ("clear-completed", []) => TodoEvent::ClearCompleted,
        ("filter", [value]) => TodoEvent::Filter {
            filter: value.parse::<Filter>().map_err(|err| err.to_string())?,
        },
        _ => return Err(USAGE.to_string()),
    };
    Ok(Some(event))
}

/// Joins words into a todo title; blank titles are rejected.
fn todo_text(words: &[String]) -> Result<String, String> {
    let text = words.join(" ").trim().to_string();
    if text.is_empty() {
        return Err("todo text cannot be empty".to_string());
    }
    Ok(text)
}

/// Resolves a 1-based list position to a todo id.
fn todo_at(store: &StateStore, position: &str) -> Result<TodoId, String> {
    let index = position
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .ok_or_else(|| format!("invalid position `{position}`"))?;
    store
        .state()
        .todos
        .get(index)
        .map(|todo| todo.id())
        .ok_or_else(|| format!("no todo at position {position}"))
}

fn print_state(store: &StateStore) {
    let state = store.state();
    for (position, todo) in state.todos.iter().enumerate() {
        if !state.filter.matches(todo) {
            continue;
        }
        let mark = if todo.is_completed() { "x" } else { " " };
        let pending = match todo.status() {
            UiStatus::Ready => "",
            UiStatus::Updating => " (updating)",
            UiStatus::Deleting => " (deleting)",
        };
        println!("{:>3}. [{mark}] {}{pending}", position + 1, todo.title());
    }
    println!(
        "{} active, {} completed, showing {}",
        state.active_count(),
        state.completed_count(),
        state.filter
    );
    log::debug!(
        "event=cli_done module=cli status=ok virtual_ms={} todo_count={}",
        store.now().as_millis(),
        state.todos.len()
    );
}
