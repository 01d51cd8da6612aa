//! Common types used across the frontend application.
//!
//! This module centralizes type definitions to avoid duplication
//! and ensure consistency across components.
//!
//! # Categories
//!
//! - **Notification Types** - transient user-facing messages
//! - **Transfer Types** - upload progress reporting
//! - **API Types** - Backend request/response structures
//! - **Error Types** - Frontend error handling

use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// Notification Types
// =============================================================================

/// Notification severity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    /// Something the user asked for worked.
    Success,
    /// Something the user asked for failed.
    Failure,
}

impl NotificationKind {
    /// Get CSS class for styling.
    pub fn css_class(&self) -> &'static str {
        match self {
            NotificationKind::Success => "success",
            NotificationKind::Failure => "failure",
        }
    }
}

/// A single message shown in the message banner.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Used to dismiss this exact message when its timer fires.
    pub id: u32,
    pub kind: NotificationKind,
    pub message: String,
    /// Timestamp string (HH:MM:SS)
    pub timestamp: String,
}

// =============================================================================
// Transfer Types
// =============================================================================

/// Raw upload progress as reported by the browser.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransferProgress {
    pub loaded: f64,
    pub total: f64,
    /// False when the browser cannot tell how large the body is.
    pub length_computable: bool,
}

impl TransferProgress {
    /// Whole percentage sent, truncated toward zero.
    ///
    /// `None` when the total is unknown, so callers keep the previous caption.
    pub fn percent(&self) -> Option<u8> {
        if !self.length_computable || self.total <= 0.0 {
            return None;
        }
        let ratio = (self.loaded / self.total).clamp(0.0, 1.0);
        Some((ratio * 100.0).floor() as u8)
    }
}

// =============================================================================
// API Types
// =============================================================================

/// One entry of a 400 response from the form endpoints.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub field_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Body of a successful submit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub redirect_to: String,
}

/// Body of a successful `POST /application-form`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedApplication {
    pub uuid: String,
}

/// An institution applicants can choose from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Institution {
    pub uuid: String,
    pub name: String,
}

/// A file already stored for a dataset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetFile {
    pub name: String,
    pub size: u64,
}

/// Status line and raw body of a finished HTTP exchange.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

// =============================================================================
// Error Types
// =============================================================================

/// Frontend application errors.
///
/// Unified error type for all frontend operations.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum AppError {
    /// The request never produced a response.
    #[error("Network error: {0}")]
    Network(String),

    /// The server answered with a non-success status.
    #[error("Server error ({status}): {body}")]
    Server { status: u16, body: String },

    /// The browser handed over an empty file slot.
    #[error("File {index} is not available")]
    MissingFile { index: usize },

    /// The file exposes neither a relative path nor a name.
    #[error("File {index} has no readable name")]
    UnnamedFile { index: usize },

    /// The server rejected one or more fields.
    #[error("Validation failed for {} field(s)", .0.len())]
    Validation(Vec<ValidationError>),

    /// JSON encoding or decoding failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A browser API refused to cooperate.
    #[error("Browser error: {0}")]
    Dom(String),
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Serialization(e.to_string())
    }
}

/// Result type alias for frontend operations.
pub type AppResult<T> = Result<T, AppError>;
