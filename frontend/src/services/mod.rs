//! Form and upload logic of the frontend.
//!
//! Everything here talks to the browser only through small traits so the
//! flows can be unit tested with in-memory doubles:
//!
//! # Services
//!
//! - [`transport`] - HTTP access (multipart uploads with progress, JSON)
//! - [`upload`] - Sequential dataset upload pipeline
//! - [`queue`] - Budget dropzone queue
//! - [`record`] - Form snapshot sent on save/submit
//! - [`submission`] - Application creation, draft save, submit and review submission
//! - [`notify`] - Transient user messages

pub mod notify;
pub mod queue;
pub mod record;
pub mod submission;
pub mod transport;
pub mod upload;

#[cfg(test)]
pub(crate) mod testing;

pub use notify::*;
pub use queue::*;
pub use record::*;
pub use submission::*;
pub use transport::*;
pub use upload::*;
