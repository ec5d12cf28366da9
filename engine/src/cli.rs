//! CLI interface for CommitLens
//!
//! Defines the commands and global flags using clap's derive API.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CommitLens commit knowledge base
///
/// Answers free-text questions about a repository's commit history by
/// planning a retrieval strategy, running it, and summarizing the evidence.
#[derive(Parser, Debug)]
#[command(name = "commitlens")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log: Option<String>,

    /// Specify alternate configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Answer a question about the commit history
    Ask {
        /// The question to answer
        question: String,
    },

    /// Show the plan chosen for a question without running it
    Plan {
        /// The question to plan
        question: String,
    },

    /// Check a SQL statement against the safety gate
    CheckSql {
        /// The statement to check
        sql: String,
    },

    /// Start the HTTP API server
    Serve {
        /// Address to bind, overrides `server.bind`
        #[arg(long, value_name = "ADDR")]
        bind: Option<String>,
    },
}
