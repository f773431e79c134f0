//! CLI error types
//!
//! Each variant maps to a stable `ROSTER_CLI_*` code and a process exit
//! status:
//!
//! | exit | meaning                                            |
//! |------|----------------------------------------------------|
//! | 1    | runtime failure (I/O, server, seeding)             |
//! | 2    | setup problem the operator must fix (config, init) |
//! | 3    | storage file is corrupt; the store refused to open |

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::storage::StorageErrorCode;
use crate::students::RecordError;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Config(String),

    #[error("{0}")]
    Io(String),

    #[error("Data directory {} already initialized", .0.display())]
    AlreadyInitialized(PathBuf),

    #[error("Data directory {} not initialized. Run 'rosterdb init' first.", .0.display())]
    NotInitialized(PathBuf),

    #[error("Storage under {} is corrupt: {reason}", data_dir.display())]
    StorageCorrupt { data_dir: PathBuf, reason: String },

    #[error("{0}")]
    BootFailed(String),

    #[error("Seeding stopped at {student_id}: {source}")]
    SeedFailed {
        student_id: String,
        source: RecordError,
    },
}

impl CliError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        CliError::Config(msg.into())
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        CliError::Io(msg.into())
    }

    /// Classify a failed store open under `data_dir`.
    ///
    /// Corruption is told apart from other failures by the storage code the
    /// replay error carries.
    pub fn open_failed(data_dir: impl Into<PathBuf>, err: RecordError) -> Self {
        let reason = err.to_string();
        if reason.contains(StorageErrorCode::RosterDataCorruption.code()) {
            CliError::StorageCorrupt {
                data_dir: data_dir.into(),
                reason,
            }
        } else {
            CliError::BootFailed(format!("Store open failed: {}", reason))
        }
    }

    /// Stable error code string
    pub fn code(&self) -> &'static str {
        match self {
            CliError::Config(_) => "ROSTER_CLI_CONFIG_ERROR",
            CliError::Io(_) => "ROSTER_CLI_IO_ERROR",
            CliError::AlreadyInitialized(_) => "ROSTER_CLI_ALREADY_INITIALIZED",
            CliError::NotInitialized(_) => "ROSTER_CLI_NOT_INITIALIZED",
            CliError::StorageCorrupt { .. } => "ROSTER_CLI_STORAGE_CORRUPT",
            CliError::BootFailed(_) => "ROSTER_CLI_BOOT_FAILED",
            CliError::SeedFailed { .. } => "ROSTER_CLI_SEED_FAILED",
        }
    }

    /// Process exit status for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config(_) | CliError::AlreadyInitialized(_) | CliError::NotInitialized(_) => 2,
            CliError::StorageCorrupt { .. } => 3,
            CliError::Io(_) | CliError::BootFailed(_) | CliError::SeedFailed { .. } => 1,
        }
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

pub type CliResult<T> = Result<T, CliError>;
