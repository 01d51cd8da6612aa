//! Domain models for the FAIR Data Fund backend.
//!
//! - [`ApplicationFields`] - Everything an applicant can edit
//! - [`ApplicationForm`] - A stored application with its bookkeeping
//! - [`Review`] - Reviewer scores for one application
//! - [`FieldError`] - One entry of a 400 validation list
//! - [`DatasetFile`] - A file stored for a dataset
//! - [`Institution`] - An organisation applicants can pick

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Application
// =============================================================================

/// Applicant-editable part of an application.
///
/// Serialized flat, with the same keys the form sends.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationFields {
    pub name: Option<String>,
    pub pronouns: Option<String>,
    pub email: Option<String>,
    pub institution: Option<Uuid>,
    pub faculty: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
    pub discipline: Option<String>,
    pub datatype: Option<String>,
    pub description: Option<String>,
    pub size: Option<String>,
    pub whodoesit: Option<String>,
    pub achievement: Option<String>,
    pub fair_summary: Option<String>,
    pub findable: Option<String>,
    pub accessible: Option<String>,
    pub interoperable: Option<String>,
    pub reusable: Option<String>,
    pub summary: Option<String>,
    pub promotion: Option<String>,
    pub linked_publication: Option<String>,
    pub data_timing: Option<String>,
    pub refinement: Option<String>,
    pub consent_to_interview: bool,
    pub consent_to_checkpoints: bool,
    pub consent_to_financial: bool,
    pub consent_to_organization: bool,
}

/// A stored application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationForm {
    pub uuid: Uuid,
    #[serde(flatten)]
    pub fields: ApplicationFields,
    /// Set once a submit passed validation.
    #[serde(default)]
    pub submitted: bool,
    /// Original name of the uploaded budget template.
    #[serde(default)]
    pub budget_filename: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ApplicationForm {
    /// A fresh, empty application.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            uuid: Uuid::new_v4(),
            fields: ApplicationFields::default(),
            submitted: false,
            budget_filename: None,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Default for ApplicationForm {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Reviews
// =============================================================================

/// Scores a reviewer gave one application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub application_uuid: Uuid,
    pub scores: BTreeMap<String, String>,
    pub submitted_at: DateTime<Utc>,
}

// =============================================================================
// API payloads
// =============================================================================

/// One rejected field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field_name: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field_name: &str, message: impl Into<String>) -> Self {
        Self {
            field_name: field_name.to_string(),
            message: message.into(),
        }
    }
}

/// A file stored for a dataset, path relative to the dataset directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetFile {
    pub name: String,
    pub size: u64,
}

// =============================================================================
// Institutions
// =============================================================================

/// Organisation an applicant works at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Institution {
    pub uuid: Uuid,
    pub name: String,
}

/// Institutions written to a new store.
pub const DEFAULT_INSTITUTIONS: &[(u128, &str)] = &[
    (0x3f1c_9a62_5b0e_4d7a_8c21_04e6_b8d9_1a01, "Delft University of Technology"),
    (0x3f1c_9a62_5b0e_4d7a_8c21_04e6_b8d9_1a02, "Eindhoven University of Technology"),
    (0x3f1c_9a62_5b0e_4d7a_8c21_04e6_b8d9_1a03, "University of Twente"),
    (0x3f1c_9a62_5b0e_4d7a_8c21_04e6_b8d9_1a04, "Wageningen University & Research"),
];

impl Institution {
    pub fn defaults() -> Vec<Self> {
        DEFAULT_INSTITUTIONS
            .iter()
            .map(|(id, name)| Institution {
                uuid: Uuid::from_u128(*id),
                name: name.to_string(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_application_serializes_flat() {
        let mut form = ApplicationForm::new();
        form.fields.name = Some("Ada".into());
        form.fields.consent_to_financial = true;

        let value = serde_json::to_value(&form).unwrap();

        assert_eq!(value["name"], json!("Ada"));
        assert_eq!(value["consent_to_financial"], json!(true));
        assert_eq!(value["description"], json!(null));
        assert_eq!(value["submitted"], json!(false));
        assert!(value.get("fields").is_none());
    }

    #[test]
    fn test_application_roundtrips_through_disk_format() {
        let mut form = ApplicationForm::new();
        form.fields.institution = Some(Uuid::new_v4());
        form.budget_filename = Some("budget.xlsx".into());

        let text = serde_json::to_string_pretty(&form).unwrap();
        let back: ApplicationForm = serde_json::from_str(&text).unwrap();

        assert_eq!(back, form);
    }
}
