//! # Fairfund - FAIR Data Fund application backend
//!
//! Stores applications for the 4TU.ResearchData FAIR Data Fund, validates
//! drafts and submissions, receives budget and dataset uploads and records
//! reviewer scores.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Frontend   │────▶│  HTTP API   │────▶│ Validation  │────▶│    Store    │
//! │ (Leptos/WASM)│    │   (axum)    │     │ (per field) │     │ (JSON files)│
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use fairfund::{server::start_server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     start_server(ServerConfig::default()).await.unwrap();
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Store and request error types
//! - [`models`] - Applications, reviews, field errors
//! - [`validation`] - Form and review validation
//! - [`store`] - JSON file persistence
//! - [`config`] - Server configuration
//! - [`mail`] - Optional confirmation mail
//! - [`api`] - HTTP API server

// Core modules
pub mod config;
pub mod error;
pub mod models;

// Validation
pub mod validation;

// Persistence
pub mod store;

// Notifications
pub mod mail;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::ServerConfig;

pub use error::{ServerError, ServerResult, StoreError, StoreResult};

pub use models::{ApplicationFields, ApplicationForm, DatasetFile, FieldError, Institution, Review};

pub use validation::{sanitize_file_name, validate_application, validate_review};

pub use mail::{MailConfig, Mailer};

pub use store::ApplicationStore;

pub use api::types::{CreatedApplication, SubmitRedirect};

// Server
pub mod server {
    pub use crate::api::server::{router, serve, start_server, AppState};
}
