use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Log completed markdown checklist items to a running task log"
)]
pub struct Cli {
    /// Vault directory the documents and the log live in (defaults to the current directory)
    #[arg(long, global = true)]
    pub vault: Option<PathBuf>,

    /// Settings file (defaults to ~/.config/task_log/settings.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Log completed tasks from one document
    Log {
        /// Vault-relative path of the document
        file: Option<String>,
    },

    /// Treat every matching document in the vault as changed, once
    Sweep {
        #[command(flatten)]
        filter: Filter,
    },

    /// Poll the vault and log completed tasks from documents as they change
    Watch {
        #[command(flatten)]
        filter: Filter,

        /// Milliseconds between polls
        #[arg(long, default_value_t = 1000)]
        interval_ms: u64,

        /// Stop after this many polls
        #[arg(long)]
        max_polls: Option<u64>,
    },

    /// Print the task log
    Show,

    /// Reset the task log to its header
    Clear,

    /// Show or change settings
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(clap::Args, Debug)]
pub struct Filter {
    /// Patterns for documents to watch
    #[arg(long, num_args = 1.., default_values_t = vec!["**/*.md".to_string()])]
    pub include: Vec<String>,

    /// Patterns for documents to ignore
    #[arg(long, num_args = 1..)]
    pub exclude: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective settings
    Show,

    /// Change one setting and save it
    Set { key: String, value: String },
}
