//! CLI module for rosterdb
//!
//! Provides command-line interface for:
//! - init: Create the data directory and storage file
//! - serve: Open the store and serve the HTTP API
//! - seed: Insert sample students
//! - query: One-shot JSON request against the store

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{
    execute_request, init, query, run, run_command, sample_student, seed, seed_store, serve,
    Config,
};
pub use errors::{CliError, CliResult};
pub use io::{read_request, read_request_from, write_error, write_error_to, write_response, write_response_to};
