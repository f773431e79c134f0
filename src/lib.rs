//! rosterdb - A strict, deterministic student record store
//!
//! - `storage`: append-only, checksummed document file
//! - `students`: the record store and its invariants
//! - `http_server`: axum facade over the record store
//! - `cli`: init, serve, seed and query commands
//! - `observability`: tracing setup, events and counters

pub mod cli;
pub mod http_server;
pub mod observability;
pub mod storage;
pub mod students;
