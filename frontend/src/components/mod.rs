//! UI Components for the FAIR Data Fund forms.
//!
//! # Layout Components
//! - [`Hero`] - Page title and description
//! - [`Footer`] - Page footer
//! - [`MessageBanner`] - Transient success/failure messages
//!
//! # Feature Components
//! - [`ApplicationFormPage`] - Application form with draft save and submit
//! - [`ReviewFormPage`] - Reviewer scores
//! - [`FileUploadArea`] / [`BudgetDropzone`] - Drag & drop uploads
//! - [`UploadProgress`] - Upload progress bar

mod application_form;
mod footer;
mod hero;
mod messages;
mod progress;
mod review_form;
mod upload;

pub use application_form::*;
pub use footer::*;
pub use hero::*;
pub use messages::*;
pub use progress::*;
pub use review_form::*;
pub use upload::*;
