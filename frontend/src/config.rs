//! Application configuration.
//!
//! Centralized configuration for the FAIR Data Fund forms.
//! In development, these are hardcoded. In production, they could be
//! loaded from environment or a config file.

/// Backend API base URL.
///
/// The fairfund backend serving the form and upload endpoints.
pub const BACKEND_URL: &str = "http://localhost:8080";

/// How long a notification stays on screen (in milliseconds).
pub const MESSAGE_DISPLAY_MS: u32 = 20_000;

/// Maximum notifications kept in memory.
pub const MAX_MESSAGES: usize = 10;

/// Maximum size of a budget attachment (in bytes).
///
/// 50 MB limit.
pub const MAX_BUDGET_FILE_SIZE: f64 = 50.0 * 1024.0 * 1024.0;

/// MIME types accepted by the budget dropzone. Empty accepts anything.
pub const BUDGET_ACCEPTED_TYPES: &[&str] = &[
    "application/pdf",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.oasis.opendocument.spreadsheet",
    "text/csv",
];

/// Where reviewers land after submitting scores.
pub const REVIEW_DASHBOARD_PATH: &str = "/review/dashboard";

/// Upload endpoint variants.
///
/// The dataset uploader and the budget uploader talk to different API
/// generations, so each keeps its own route shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UploadProfile {
    /// `POST /v3/datasets/{id}/upload`
    Dataset,
    /// `POST /application-form/{id}/upload-budget`
    Budget,
}

impl UploadProfile {
    /// Absolute upload URL for a target resource.
    pub fn upload_url(&self, base_url: &str, target_id: &str) -> String {
        match self {
            UploadProfile::Dataset => format!("{}/v3/datasets/{}/upload", base_url, target_id),
            UploadProfile::Budget => {
                format!("{}/application-form/{}/upload-budget", base_url, target_id)
            }
        }
    }
}

/// Reviewer form variants, each with its own score fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReviewProfile {
    /// Citation / datatypes / budget / other.
    Basic,
    /// Per-FAIR-principle scoring.
    Fair,
}

impl ReviewProfile {
    /// Score fields in display order.
    pub fn fields(&self) -> &'static [&'static str] {
        match self {
            ReviewProfile::Basic => &["citation", "datatypes", "budget", "other"],
            ReviewProfile::Fair => &[
                "refinement",
                "findable",
                "accessible",
                "interoperable",
                "reusable",
                "budget",
                "achievement",
            ],
        }
    }
}

/// `POST` target creating a new application.
pub fn new_application_url(base_url: &str) -> String {
    format!("{}/application-form", base_url)
}

/// Frontend route of an application's form.
pub fn application_form_path(application_id: &str) -> String {
    format!("/application-form/{}", application_id)
}

/// `GET` target listing the institutions applicants can pick.
pub fn institutions_url(base_url: &str) -> String {
    format!("{}/institutions", base_url)
}

/// `PUT` target for saving a draft.
pub fn draft_url(base_url: &str, application_id: &str) -> String {
    format!("{}/application-form/{}", base_url, application_id)
}

/// `PUT` target for submitting an application.
pub fn submit_url(base_url: &str, application_id: &str) -> String {
    format!("{}/application-form/{}/submit", base_url, application_id)
}

/// `PUT` target for reviewer scores.
pub fn review_url(base_url: &str, application_id: &str) -> String {
    format!("{}/review/{}", base_url, application_id)
}

/// `GET` target listing the files already uploaded for a dataset.
pub fn dataset_files_url(base_url: &str, dataset_id: &str) -> String {
    format!("{}/v3/datasets/{}/files", base_url, dataset_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_profiles_use_distinct_routes() {
        assert_eq!(
            UploadProfile::Dataset.upload_url("", "abc"),
            "/v3/datasets/abc/upload"
        );
        assert_eq!(
            UploadProfile::Budget.upload_url("http://x", "abc"),
            "http://x/application-form/abc/upload-budget"
        );
    }

    #[test]
    fn test_review_profiles_keep_their_own_fields() {
        assert_eq!(ReviewProfile::Basic.fields().len(), 4);
        assert!(ReviewProfile::Fair.fields().contains(&"interoperable"));
        assert!(!ReviewProfile::Basic.fields().contains(&"findable"));
    }
}
