//! Error types for the FAIR Data Fund backend.
//!
//! - [`StoreError`] - Persistence errors (disk, JSON)
//! - [`ServerError`] - Request-level errors, each mapped to an HTTP status
//!
//! Store errors convert into server errors via `From`, so `?` works from a
//! handler straight through the store.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::models::FieldError;

// =============================================================================
// Store Errors
// =============================================================================

/// Errors from the on-disk application store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Application not found.
    #[error("Application not found: {0}")]
    NotFound(Uuid),

    /// IO error.
    #[error("Store IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON error.
    #[error("Store JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP request errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Malformed request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// One or more form fields failed validation.
    #[error("{} field(s) failed validation", .0.len())]
    Fields(Vec<FieldError>),

    /// Unknown or malformed application id.
    #[error("Not allowed")]
    Forbidden,

    /// Resource does not exist.
    #[error("This resource does not exist")]
    NotFound,

    /// Body is not of the expected content type.
    #[error("Supported Content-Types: {0}")]
    UnsupportedMedia(&'static str),

    /// Store failure.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ServerError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, json!({ "message": message }))
            }
            ServerError::Fields(errors) => (StatusCode::BAD_REQUEST, json!(errors)),
            ServerError::Forbidden => (StatusCode::FORBIDDEN, json!({ "message": "Not allowed." })),
            ServerError::NotFound => (
                StatusCode::NOT_FOUND,
                json!({ "message": "This resource does not exist." }),
            ),
            ServerError::UnsupportedMedia(_) => {
                return (StatusCode::UNSUPPORTED_MEDIA_TYPE, self.to_string()).into_response();
            }
            ServerError::Store(StoreError::NotFound(_)) => {
                (StatusCode::FORBIDDEN, json!({ "message": "Not allowed." }))
            }
            ServerError::Store(_) => {
                tracing::error!("{}", self);
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "message": "Internal server error." }))
            }
        };
        (status, Json(body)).into_response()
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type for request handlers.
pub type ServerResult<T> = Result<T, ServerError>;
