//! rosterdb CLI entry point
//!
//! Parses arguments and dispatches through `cli::run`. Errors go to stderr
//! with their code and the process exits with the error's exit status.
//!
//! main.rs must not load configuration or open the store itself.

use rosterdb::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}: {}", e.code(), e);
        std::process::exit(e.exit_code());
    }
}
