use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use taskboard_core::storage::local::LocalStore;
use taskboard_core::BoardSession;

mod commands;
mod config;
mod render;

#[derive(Parser)]
#[command(name = "taskboard")]
#[command(version, about = "Kanban board in the terminal")]
pub struct Cli {
    /// Config file. Defaults to ~/.config/taskboard/config.json
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Board file. Overrides the config's stateFile
    #[arg(long, global = true)]
    pub state: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the board, optionally filtered by a search
    Show {
        #[arg(short, long)]
        query: Option<String>,
        /// Case-insensitive substring search instead of fuzzy matching
        #[arg(long)]
        plain: bool,
    },
    /// List matching tasks across all columns
    Search {
        query: String,
        #[arg(long)]
        plain: bool,
    },
    Column {
        #[command(subcommand)]
        command: ColumnCommands,
    },
    Task {
        #[command(subcommand)]
        command: TaskCommands,
    },
}

#[derive(Subcommand)]
pub enum ColumnCommands {
    /// Append a column
    Add { title: Option<String> },
    Rename { id: String, title: String },
    /// Delete a column and every task in it
    Delete { id: String },
    /// Move the column at position FROM to position TO (0-based)
    Move { from: usize, to: usize },
}

#[derive(Subcommand)]
pub enum TaskCommands {
    /// Append a task to a column
    Add {
        column: String,
        text: String,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(short, long = "label")]
        labels: Vec<String>,
    },
    Edit {
        id: String,
        #[arg(long)]
        text: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Replace the labels
        #[arg(short, long = "label")]
        labels: Vec<String>,
        #[arg(long, conflicts_with = "labels")]
        clear_labels: bool,
    },
    Done {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    Reopen {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    Delete {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Move tasks to the end of another column, in the order given
    Move {
        column: String,
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Move the task at position FROM of a column to position TO (0-based)
    Reorder {
        column: String,
        from: usize,
        to: usize,
    },
}

fn init_logging(level: Option<&str>) {
    let env = env_logger::Env::default().default_filter_or(level.unwrap_or("warn"));
    env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => config::load_config_strict(path)?,
        None => config::load_config(&config::default_config_path()),
    };
    init_logging(config.log_level.as_deref());

    let state_path = config::resolve_state_path(cli.state, &config);
    log::debug!("Using board file {}", state_path.display());
    let mut session = BoardSession::open(LocalStore::new(state_path));

    let output = commands::run(&mut session, cli.command, config.search_mode())?;
    if !output.is_empty() {
        println!("{}", output);
    }
    Ok(())
}
