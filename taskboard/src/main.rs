//! `taskboard` — kanban task board on the command line.
//!
//! Tasks live in a single JSON document under the data directory.
//! Configuration via CLI flags, environment variables, or config file
//! (`~/.config/taskboard/config.toml`).
//!
//! ```bash
//! # Board view, highest priority first
//! cargo run --bin taskboard -- board --query "sortField=priority&sortDirection=desc"
//!
//! # Add a task and drag it to Done
//! cargo run --bin taskboard -- add --title "Ship it" --description "Release 1.0"
//! cargo run --bin taskboard -- move <id> Done
//!
//! # Throwaway session
//! TASKBOARD_DATA_DIR=/tmp/board cargo run --bin taskboard -- --in-memory list
//! ```

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;

use taskboard::app::App;
use taskboard::board::{DragOutcome, DropTarget};
use taskboard::clock::Clock;
use taskboard::config::{CliArgs, ClientConfig, Command, ViewArgs};
use taskboard::storage::{FileKvStore, InMemoryKvStore, KeyValueStore, TaskStorage};
use taskboard::tasks::{TaskError, TaskManager};
use taskboard_proto::task::{DraftError, Task, TaskDraft, TaskId, TaskPatch};

/// Failures reported to the user before exiting non-zero.
#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Draft(#[from] DraftError),

    #[error(transparent)]
    Task(#[from] TaskError),

    #[error("task not found: {0}")]
    UnknownTask(TaskId),
}

fn main() -> ExitCode {
    let cli = CliArgs::parse();

    // Load and resolve configuration (CLI args > env > config file > defaults).
    let config = match ClientConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Warning: failed to load config file: {e}");
            ClientConfig::default()
        }
    };

    // Logs go to a file so they never interleave with command output.
    let _log_guard = init_logging(&cli.log_level, cli.log_file.as_deref());

    tracing::info!(data_dir = %config.data_dir.display(), in_memory = config.in_memory, "taskboard starting");

    let store: Box<dyn KeyValueStore> = if config.in_memory {
        Box::new(InMemoryKvStore::new())
    } else {
        Box::new(FileKvStore::new(&config.data_dir))
    };
    let storage = TaskStorage::new(&*store).with_key(config.storage_key.clone());
    let mut app = App::new(TaskManager::open(storage));

    if app.manager().migrated() {
        eprintln!("Note: stored tasks were upgraded to the current format.");
    }
    if app.manager().seeded() {
        eprintln!("Note: no saved tasks found, created sample tasks.");
    }

    let command = cli.command.unwrap_or(Command::List(ViewArgs::default()));
    let result = run(&mut app, &config, command);

    if let Some(warning) = app.warning() {
        eprintln!("Warning: {warning}");
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initialize file-based logging.
///
/// Returns a guard that must be held for the lifetime of the program to
/// ensure logs are flushed.
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let default_path = std::env::temp_dir().join("taskboard.log");
    let log_path = file_path.unwrap_or(&default_path);

    let log_dir = log_path.parent()?;
    let file_name = log_path.file_name()?.to_str()?;

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .init();

    Some(guard)
}

fn run<S: KeyValueStore, C: Clock>(
    app: &mut App<S, C>,
    config: &ClientConfig,
    command: Command,
) -> Result<(), CliError> {
    match command {
        Command::List(view) => {
            app.set_view(view.view_state(&config.default_query));
            let tasks = app.visible_tasks();
            if tasks.is_empty() {
                println!("No tasks match the current filters.");
            }
            for task in &tasks {
                println!("{}", task_line(task));
            }
            let query = app.query_string();
            if !query.is_empty() {
                println!();
                println!("?{query}");
            }
        }
        Command::Board(view) => {
            app.set_view(view.view_state(&config.default_query));
            for (status, tasks) in app.board().columns() {
                println!("== {status} ({}) ==", tasks.len());
                if tasks.is_empty() {
                    println!("  No tasks in this column");
                }
                for task in tasks {
                    println!("  {}", task_line(task));
                }
            }
        }
        Command::Add {
            title,
            description,
            status,
            priority,
            assignee,
            tags,
        } => {
            let draft = TaskDraft::new(title.trim(), description.trim())
                .with_status(status)
                .with_priority(priority)
                .with_assignee(assignee.trim())
                .with_tags(tags);
            draft.validate(config.max_title_len)?;
            let id = app.add_task(draft)?;
            println!("{id}");
        }
        Command::Edit {
            id,
            title,
            description,
            priority,
            assignee,
            tags,
            clear_tags,
        } => {
            let id = TaskId::from_string(id);
            let current = app
                .manager()
                .get(&id)
                .cloned()
                .ok_or_else(|| CliError::UnknownTask(id.clone()))?;

            // Check the edited task the way the form would.
            let title = title.map(|t| t.trim().to_string());
            let description = description.map(|d| d.trim().to_string());
            TaskDraft::new(
                title.clone().unwrap_or(current.title),
                description.clone().unwrap_or(current.description),
            )
            .validate(config.max_title_len)?;

            let tags = if clear_tags {
                Some(Vec::new())
            } else if tags.is_empty() {
                None
            } else {
                Some(tags)
            };
            let patch = TaskPatch {
                title,
                description,
                priority,
                assignee: assignee.map(|a| a.trim().to_string()),
                tags,
                ..TaskPatch::default()
            };
            app.update_task(&id, patch)?;
            println!("updated {id}");
        }
        Command::Move { id, status } => {
            let id = TaskId::from_string(id);
            if !app.drag_start(&id) {
                return Err(CliError::UnknownTask(id));
            }
            let target = DropTarget::Column(status);
            app.drag_over(&target);
            match app.drag_end(Some(&target))? {
                DragOutcome::Commit { task_id, from, to } => {
                    println!("moved {task_id}: {from} -> {to}");
                }
                DragOutcome::Revert => println!("{id} is already in {status}"),
            }
        }
        Command::Delete { id } => {
            let id = TaskId::from_string(id);
            app.delete_task(&id)?;
            println!("deleted {id}");
        }
    }
    Ok(())
}

fn task_line(task: &Task) -> String {
    let mut line = format!(
        "{}  [{}] {:<6} {}",
        task.id,
        task.status,
        task.priority.as_str(),
        task.title
    );
    if !task.assignee.is_empty() {
        line.push_str(&format!("  @{}", task.assignee));
    }
    if !task.tags.is_empty() {
        line.push_str(&format!("  #{}", task.tags.join(" #")));
    }
    line
}
