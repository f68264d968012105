//! Command line interface of `unmand`, based on clap.
//!
//! Defines [`Cli`] with the [`Command`] subcommands (extract, poll, task)
//! and global flags overriding `unmand.toml`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Submit documents to the Unmand extraction API and report Swarm tasks.
#[derive(Debug, Parser)]
#[command(name = "unmand", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Use the test (UAT) deployment instead of production.
    #[arg(long, global = true, default_value_t = false)]
    pub test: bool,

    /// API token; overrides `unmand.toml` and `UNMAND_API_TOKEN`.
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Milliseconds to wait between status queries.
    #[arg(long, global = true)]
    pub interval_ms: Option<u64>,

    /// Status queries before giving up.
    #[arg(long, global = true)]
    pub max_attempts: Option<u32>,

    /// Suppress progress output while polling.
    #[arg(long, short, global = true, default_value_t = false)]
    pub quiet: bool,

    /// Enable verbose logging.
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Submits a document and waits for its extraction result.
    Extract {
        /// Path to the document to submit.
        file: PathBuf,

        /// Guid of the model version to extract with.
        #[arg(long)]
        model: Option<String>,

        /// Print the extraction id and return without polling.
        #[arg(long, default_value_t = false)]
        no_wait: bool,
    },

    /// Resumes polling an extraction submitted earlier.
    Poll {
        /// Extraction id returned at submission.
        id: String,
    },

    /// Reports task outcomes to Swarm.
    #[command(subcommand)]
    Task(TaskCommand),
}

#[derive(Debug, Subcommand)]
pub enum TaskCommand {
    /// Creates a task record from a JSON file.
    Upload {
        /// JSON file describing the task.
        file: PathBuf,
    },

    /// Replaces an existing task record from a JSON file.
    Update {
        /// JSON file describing the task.
        file: PathBuf,
    },
}
