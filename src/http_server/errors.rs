//! # HTTP Facade Errors
//!
//! Maps record store outcomes onto status codes. Every error body has the
//! same shape: `{"error", "code", "field"?}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::students::RecordError;

/// Result type for handlers
pub type ApiResult<T> = Result<T, ApiError>;

/// HTTP facade errors
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    // ==================
    // Client Errors (4xx)
    // ==================
    /// Body or query string could not be parsed at all
    #[error("Malformed request: {0}")]
    BadRequest(String),

    /// No student with this id
    #[error("Student {0} not found")]
    NotFound(String),

    // ==================
    // Store outcomes
    // ==================
    /// Validation, duplicate key or store failure
    #[error(transparent)]
    Record(#[from] RecordError),
}

impl ApiError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Record(RecordError::Validation { .. }) => StatusCode::BAD_REQUEST,
            ApiError::Record(RecordError::DuplicateKey { .. }) => StatusCode::CONFLICT,
            ApiError::Record(RecordError::StoreUnavailable(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// The offending field, when there is one
    pub fn field(&self) -> Option<&str> {
        match self {
            ApiError::Record(err) => err.field(),
            _ => None,
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl From<&ApiError> for ErrorResponse {
    fn from(err: &ApiError) -> Self {
        Self {
            error: err.to_string(),
            code: err.status_code().as_u16(),
            field: err.field().map(str::to_string),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(ErrorResponse::from(&self))).into_response()
    }
}
