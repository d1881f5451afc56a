use clap::{Parser, Subcommand};
use colored::*;
use eyre::{Result, eyre};
use std::path::PathBuf;
use todolist::config::Config;
use todolist::session::{self, SessionId};
use todolist::storage::{Backend, SessionStorage};
use todolist::{DragGesture, TaskListError, TaskListStore, logging};

#[derive(Parser)]
#[command(name = "todolist")]
#[command(about = "Session-scoped to-do list")]
#[command(version = env!("GIT_DESCRIBE"))]
struct Cli {
    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Session id (create one with `todolist session`)
    #[arg(short, long, env = "TODOLIST_SESSION")]
    session: Option<String>,

    /// Storage backend (overrides config)
    #[arg(short, long, value_enum)]
    backend: Option<Backend>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a new session and print its id
    Session,

    /// Add a task
    Add {
        /// Task text
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// Show pending tasks
    List {
        /// Also show recently completed tasks
        #[arg(long)]
        completed: bool,
    },

    /// Mark the task at a position as done
    Done { position: usize },

    /// Delete the task at a position
    Rm { position: usize },

    /// Drag a task from one position to another
    Mv { from: usize, to: usize },

    /// End the session and discard its tasks
    End,
}

/// Convert a 1-based position as shown by `list` into an index
fn to_index(position: usize) -> Result<usize> {
    position
        .checked_sub(1)
        .ok_or_else(|| eyre!("Positions start at 1"))
}

fn explain(err: TaskListError) -> eyre::Report {
    match err {
        TaskListError::InvalidIndex { index, len, .. } => {
            eyre!("No task at position {} ({} pending)", index + 1, len)
        }
        other => other.into(),
    }
}

fn print_list<S: SessionStorage>(store: &TaskListStore<S>) {
    if store.pending().is_empty() {
        println!("{}", "Nothing to do".dimmed());
    }
    for (i, task) in store.pending().iter().enumerate() {
        println!("{} {}", format!("{:>3}.", i + 1).cyan(), task);
    }

    if store.show_completed() {
        println!();
        println!("{}", "Recently Completed Tasks".bold());
        for task in store.completed() {
            println!("     {} {}", "✓".green(), task.to_string().strikethrough());
        }
    }
}

fn session_id(raw: Option<&str>) -> Result<SessionId> {
    raw.ok_or_else(|| eyre!("No session given; run `todolist session` and export TODOLIST_SESSION"))?
        .parse()
}

fn run_command<S: SessionStorage>(command: Commands, store: &mut TaskListStore<S>) -> Result<()> {
    match command {
        Commands::Add { text } => {
            let before = store.pending().len();
            store.add(&text.join(" "));
            if store.pending().len() == before {
                println!("{}", "Nothing to add".yellow());
            }
        }
        Commands::List { completed } => {
            if completed {
                store.toggle_completed_visibility();
            }
        }
        Commands::Done { position } => store.complete(to_index(position)?).map_err(explain)?,
        Commands::Rm { position } => store.remove(to_index(position)?).map_err(explain)?,
        Commands::Mv { from, to } => DragGesture::drag_to(store, to_index(from)?, to_index(to)?).map_err(explain)?,
        Commands::Session | Commands::End => {}
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_handle = logging::init();
    let config = Config::load(cli.config.as_ref())?;
    logging::apply_config(&log_handle, &config)?;

    let data_dir = config.storage.data_dir.clone();
    let backend = cli.backend.unwrap_or(config.storage.backend);

    match cli.command {
        Commands::Session => println!("{}", SessionId::new()),
        Commands::End => {
            let id = session_id(cli.session.as_deref())?;
            if session::end_session(&data_dir, &id)? {
                println!("{}", "Session ended".green());
            } else {
                println!("{}", "No such session".yellow());
            }
        }
        command => {
            let id = session_id(cli.session.as_deref())?;
            let storage = session::open_storage(backend, &session::session_dir(&data_dir, &id))?;
            let mut store = TaskListStore::open(storage);
            run_command(command, &mut store)?;
            print_list(&store);
        }
    }

    Ok(())
}
