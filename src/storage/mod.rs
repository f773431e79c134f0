//! Document storage for rosterdb
//!
//! The storage file holds the canonical persistent state of every student
//! document as an append-only sequence of checksummed records.
//!
//! # Design Principles
//!
//! - Append-only (no in-place updates)
//! - Checksum-verified on every read
//! - Latest record wins for the same `student_id`
//! - Tombstones mask deleted keys
//! - fsync before a write is acknowledged

mod checksum;
mod errors;
mod reader;
mod record;
mod writer;

pub use checksum::{compute_checksum, verify_checksum};
pub use errors::{Severity, StorageError, StorageErrorCode, StorageResult};
pub use reader::StorageReader;
pub use record::DocumentRecord;
pub use writer::StorageWriter;

/// Name of the storage file inside `<data_dir>/data/`.
pub const STORAGE_FILE_NAME: &str = "students.dat";
