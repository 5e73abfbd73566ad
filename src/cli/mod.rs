//! CLI interface for idrotate.
//!
//! Provides command-line argument parsing using clap.

use clap::{ArgAction, Parser, Subcommand};

/// Command-line interface for idrotate.
#[derive(Parser)]
#[command(name = "idrotate")]
#[command(author, version, about = "Rotate an application's local machine identity", long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Generate a new identity and write it to every store.
    Rotate {
        /// Confirm the target application is fully closed.
        #[arg(long)]
        app_stopped: bool,

        /// Skip the platform registry step.
        #[arg(long)]
        no_registry: bool,
    },

    /// Empty the edit history and delete per-workspace storage.
    Clean {
        /// Confirm the target application is fully closed.
        #[arg(long)]
        app_stopped: bool,
    },

    /// Show the identity currently recorded in the document store.
    Show,

    /// Print every resolved store path and whether it exists.
    Paths,

    /// Write a default config file if none exists.
    InitConfig,
}
