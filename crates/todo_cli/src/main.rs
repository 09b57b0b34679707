//! Command line front end for the todo store.
//!
//! # Responsibility
//! - Resolve configuration from flags and environment.
//! - Wire the SQLite store into `TodoService` and dispatch one command.
//! - Map domain error kinds to exit codes; print results as JSON.

mod commands;
mod outcome;

use clap::{Parser, Subcommand};
use outcome::CliError;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use todo_core::db::{open_db, open_db_in_memory};
use todo_core::{default_log_level, init_logging, OpContext, SqliteTodoRepository, TodoService};

/// Manage a single task list stored in SQLite.
#[derive(Parser, Debug)]
#[command(name = "todo")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// SQLite database file
    #[arg(long, env = "TODO_DB_PATH", default_value = "todo.sqlite3")]
    pub db: PathBuf,

    /// Use a throwaway in-memory database; `--db` is ignored
    #[arg(long)]
    pub in_memory: bool,

    /// trace|debug|info|warn|error
    #[arg(long, env = "TODO_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Absolute directory for rolling log files; logging is off when unset
    #[arg(long, env = "TODO_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Abort the store call after this many milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Create a todo
    Add {
        title: String,

        #[arg(long, short = 'd')]
        description: Option<String>,

        /// low|medium|high
        #[arg(long, short = 'p')]
        priority: Option<String>,

        /// Due date as Unix epoch milliseconds
        #[arg(long)]
        due: Option<i64>,
    },

    /// List all todos, newest first
    List,

    /// Show one todo
    Get { id: i64 },

    /// Set the completion flag
    Status {
        id: i64,

        #[arg(action = clap::ArgAction::Set)]
        completed: bool,
    },

    /// Replace fields of an existing todo
    Update {
        id: i64,

        #[arg(long)]
        title: Option<String>,

        #[arg(long, short = 'd')]
        description: Option<String>,

        /// low|medium|high
        #[arg(long, short = 'p')]
        priority: Option<String>,

        /// Due date as Unix epoch milliseconds
        #[arg(long, conflicts_with = "clear_due")]
        due: Option<i64>,

        /// Remove the due date
        #[arg(long)]
        clear_due: bool,
    },

    /// Delete a todo
    Delete { id: i64 },

    /// Completion statistics
    Stats,

    /// Health check
    Ping,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{}", err.to_json());
            ExitCode::from(err.exit_code())
        }
    }
}

fn run(cli: Cli) -> Result<String, CliError> {
    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, log_dir)?;
    }

    let conn = if cli.in_memory {
        open_db_in_memory()?
    } else {
        open_db(&cli.db)?
    };
    let repo = SqliteTodoRepository::try_new(&conn)?;
    let service = TodoService::new(repo);

    let ctx = match cli.timeout_ms {
        Some(millis) => OpContext::with_timeout(Duration::from_millis(millis)),
        None => OpContext::background(),
    };

    commands::dispatch(&service, &ctx, cli.command)
}
