//! # Record Store Errors
//!
//! `NotFound` is not a variant: `get` returns `Option` and
//! `update`/`delete` report counts.

use thiserror::Error;

use crate::storage::StorageError;

/// Result type for record store operations
pub type RecordResult<T> = Result<T, RecordError>;

/// Record store errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    /// Missing or malformed field in caller input
    #[error("Invalid field {field}: {reason}")]
    Validation { field: String, reason: String },

    /// Insert collided with an existing `student_id`
    #[error("Student ID {student_id} already exists")]
    DuplicateKey { student_id: String },

    /// The underlying store could not serve the call
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
}

impl RecordError {
    /// A required field was absent
    pub fn missing(field: impl Into<String>) -> Self {
        RecordError::Validation {
            field: field.into(),
            reason: "missing required field".to_string(),
        }
    }

    /// A field was present but its value is unacceptable
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        RecordError::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn duplicate(student_id: impl Into<String>) -> Self {
        RecordError::DuplicateKey {
            student_id: student_id.into(),
        }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        RecordError::StoreUnavailable(reason.into())
    }

    /// Stable error code string
    pub fn code(&self) -> &'static str {
        match self {
            RecordError::Validation { .. } => "ROSTER_VALIDATION_ERROR",
            RecordError::DuplicateKey { .. } => "ROSTER_DUPLICATE_KEY",
            RecordError::StoreUnavailable(_) => "ROSTER_STORE_UNAVAILABLE",
        }
    }

    /// The offending field, for validation errors
    pub fn field(&self) -> Option<&str> {
        match self {
            RecordError::Validation { field, .. } => Some(field),
            _ => None,
        }
    }
}

impl From<StorageError> for RecordError {
    fn from(err: StorageError) -> Self {
        RecordError::StoreUnavailable(err.to_string())
    }
}

impl From<serde_json::Error> for RecordError {
    fn from(err: serde_json::Error) -> Self {
        RecordError::StoreUnavailable(format!("Document encoding failed: {}", err))
    }
}
