//! Saving drafts, submitting applications and submitting reviews.

use serde::Serialize;

use crate::config::{
    application_form_path, draft_url, institutions_url, new_application_url, review_url, submit_url,
    REVIEW_DASHBOARD_PATH,
};
use crate::services::notify::Notifier;
use crate::services::record::{ApplicationRecord, ReviewScores};
use crate::services::transport::Transport;
use crate::types::{
    AppError, AppResult, CreatedApplication, HttpReply, Institution, SubmitResponse, ValidationError,
};

/// CSS class put on fields the server reported as missing.
pub const MISSING_REQUIRED_CLASS: &str = "missing-required";

pub const MSG_DRAFT_SAVED: &str = "Saved changes.";
pub const MSG_DRAFT_FAILED: &str = "Failed to save form.";
pub const MSG_FILL_REQUIRED: &str = "Please fill in all required fields.";
pub const MSG_SUBMIT_FAILED: &str = "Failed to submit application.";
pub const MSG_REVIEW_FAILED: &str = "Failed to submit review.";
pub const MSG_CREATE_FAILED: &str = "Could not start a new application.";

/// Element that gets flagged when the server rejects `field_name`.
///
/// Radio groups, consents and rich-text editors are wrapped in an element
/// whose id differs from the field name; anything else is flagged directly.
pub fn field_element_id(field_name: &str) -> String {
    let mapped = match field_name {
        "data_timing" => "data-timing-wrapper",
        "refinement" => "refinement-wrapper",
        "linked_publication" => "linked-publication-wrapper",
        "checkpoints_consent" | "consent_to_checkpoints" => "consent-checkpoints-wrapper",
        "financial_consent" | "consent_to_financial" => "consent-financial-wrapper",
        "organization_consent" | "consent_to_organization" => "consent-organization-wrapper",
        "interview_consent" | "consent_to_interview" => "consent-interview-wrapper",
        "description" | "whodoesit" | "achievement" | "findable" | "accessible"
        | "interoperable" | "reusable" | "summary" => {
            return format!("{}-editor", field_name);
        }
        other => other,
    };
    mapped.to_string()
}

/// Visual feedback on the form itself.
pub trait FormFeedback {
    /// Remove every missing-required marker.
    fn clear_flags(&self);
    /// Mark one element as missing-required.
    fn flag(&self, element_id: &str);
    /// Show or hide the loading overlay.
    fn set_busy(&self, busy: bool);
}

/// Hard page navigation.
pub trait Navigator {
    /// Navigate, keeping the current page in history.
    fn assign(&self, target: &str);
    /// Navigate, replacing the current history entry.
    fn replace(&self, target: &str);
}

/// Talks to the form endpoints and turns the answers into UI feedback.
pub struct FormClient<T, N, F, R> {
    transport: T,
    notifier: N,
    feedback: F,
    navigator: R,
    base_url: String,
}

impl<T, N, F, R> FormClient<T, N, F, R>
where
    T: Transport,
    N: Notifier,
    F: FormFeedback,
    R: Navigator,
{
    pub fn new(transport: T, notifier: N, feedback: F, navigator: R, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            notifier,
            feedback,
            navigator,
            base_url: base_url.into(),
        }
    }

    async fn put<B: Serialize>(&self, url: &str, body: &B) -> AppResult<HttpReply> {
        let body = serde_json::to_value(body)?;
        self.transport.put_json(url, &body).await
    }

    /// Start an application and move on to its form.
    pub async fn create(&self) -> AppResult<String> {
        let result = match self.transport.post(&new_application_url(&self.base_url)).await {
            Ok(reply) if reply.ok() => serde_json::from_str::<CreatedApplication>(&reply.body)
                .map(|created| created.uuid)
                .map_err(AppError::from),
            Ok(reply) => Err(AppError::Server { status: reply.status, body: reply.body }),
            Err(e) => Err(e),
        };

        match result {
            Ok(uuid) => {
                log::info!("Created application {}", uuid);
                self.navigator.replace(&application_form_path(&uuid));
                Ok(uuid)
            }
            Err(e) => {
                log::error!("Creating an application failed: {}", e);
                self.notifier.failure(MSG_CREATE_FAILED);
                Err(e)
            }
        }
    }

    /// Institutions for the institution picker.
    pub async fn institutions(&self) -> AppResult<Vec<Institution>> {
        let reply = self.transport.get(&institutions_url(&self.base_url)).await?;
        if !reply.ok() {
            return Err(AppError::Server { status: reply.status, body: reply.body });
        }
        Ok(serde_json::from_str(&reply.body)?)
    }

    /// Stored state of an application, for pre-filling the form.
    pub async fn load_draft(&self, application_id: &str) -> AppResult<ApplicationRecord> {
        let reply = self.transport.get(&draft_url(&self.base_url, application_id)).await?;
        if !reply.ok() {
            return Err(AppError::Server { status: reply.status, body: reply.body });
        }
        Ok(serde_json::from_str(&reply.body)?)
    }

    /// Store the record as a draft.
    ///
    /// With `notify` unset the user hears nothing either way; callers that
    /// chain work on a successful save simply await this first.
    pub async fn save_draft(&self, application_id: &str, record: &ApplicationRecord, notify: bool) -> AppResult<()> {
        let url = draft_url(&self.base_url, application_id);
        let result = match self.put(&url, record).await {
            Ok(reply) if reply.ok() => Ok(()),
            Ok(reply) => Err(AppError::Server { status: reply.status, body: reply.body }),
            Err(e) => Err(e),
        };

        match &result {
            Ok(()) => {
                log::info!("Saved draft {}", application_id);
                if notify {
                    self.notifier.success(MSG_DRAFT_SAVED);
                }
            }
            Err(e) => {
                log::error!("Saving draft {} failed: {}", application_id, e);
                if notify {
                    self.notifier.failure(MSG_DRAFT_FAILED);
                }
            }
        }
        result
    }

    /// Submit the record and follow the server's redirect.
    ///
    /// Returns the redirect target. A validation failure re-flags exactly
    /// the fields the server named.
    pub async fn submit(&self, application_id: &str, record: &ApplicationRecord) -> AppResult<String> {
        let url = submit_url(&self.base_url, application_id);
        self.feedback.set_busy(true);

        let reply = match self.put(&url, record).await {
            Ok(reply) => reply,
            Err(e) => return Err(self.submit_failed(e)),
        };

        if reply.ok() {
            let target = serde_json::from_str::<SubmitResponse>(&reply.body)
                .map(|r| r.redirect_to)
                .map_err(|e| self.submit_failed(e.into()))?;
            log::info!("Submitted application {}", application_id);
            self.navigator.assign(&target);
            return Ok(target);
        }

        match serde_json::from_str::<Vec<ValidationError>>(&reply.body) {
            Ok(errors) if !errors.is_empty() => {
                self.feedback.clear_flags();
                for error in &errors {
                    self.feedback.flag(&field_element_id(&error.field_name));
                }
                self.feedback.set_busy(false);
                self.notifier.failure(MSG_FILL_REQUIRED);
                log::warn!("Submission rejected: {} field(s) need attention", errors.len());
                Err(AppError::Validation(errors))
            }
            _ => Err(self.submit_failed(AppError::Server {
                status: reply.status,
                body: reply.body,
            })),
        }
    }

    fn submit_failed(&self, error: AppError) -> AppError {
        log::error!("Submission failed: {}", error);
        self.feedback.set_busy(false);
        self.notifier.failure(MSG_SUBMIT_FAILED);
        error
    }

    /// Send reviewer scores and return to the dashboard.
    pub async fn submit_review(&self, application_id: &str, scores: &ReviewScores) -> AppResult<()> {
        let url = review_url(&self.base_url, application_id);
        let result = match self.put(&url, scores).await {
            Ok(reply) if reply.ok() => Ok(()),
            Ok(reply) => Err(AppError::Server { status: reply.status, body: reply.body }),
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                self.navigator.replace(REVIEW_DASHBOARD_PATH);
                Ok(())
            }
            Err(e) => {
                log::error!("Review of {} failed: {}", application_id, e);
                self.notifier.failure(MSG_REVIEW_FAILED);
                Err(e)
            }
        }
    }
}
