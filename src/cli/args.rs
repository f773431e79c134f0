//! CLI argument definitions using clap
//!
//! Commands:
//! - rosterdb init --config <path>
//! - rosterdb serve --config <path> [--port <port>]
//! - rosterdb seed --config <path> [--count <n>]
//! - rosterdb query --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// rosterdb - A strict, deterministic student record store
#[derive(Parser, Debug)]
#[command(name = "rosterdb")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Initialize a new data directory
    Init {
        /// Path to configuration file
        #[arg(long, default_value = "./rosterdb.json")]
        config: PathBuf,
    },

    /// Serve the HTTP API
    Serve {
        /// Path to configuration file
        #[arg(long, default_value = "./rosterdb.json")]
        config: PathBuf,

        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Insert sample students S001..S<count>, skipping ids that exist
    Seed {
        /// Path to configuration file
        #[arg(long, default_value = "./rosterdb.json")]
        config: PathBuf,

        /// Number of sample students
        #[arg(long, default_value_t = 150)]
        count: usize,
    },

    /// Execute a single JSON request from stdin and exit
    Query {
        /// Path to configuration file
        #[arg(long, default_value = "./rosterdb.json")]
        config: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
