//! Snapshot of the form fields at save/submit time.
//!
//! Nothing is cached between calls: every save or submit reads the page
//! again through a [`FormSource`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::ReviewProfile;

/// What an untouched rich-text editor renders.
pub const EMPTY_EDITOR: &str = "<p><br></p>";

/// Normalize "left blank" to `None`.
///
/// Rich-text editors never yield an empty string, so their empty
/// placeholder paragraph counts as blank too.
pub fn or_null(value: &str) -> Option<String> {
    if value.is_empty() || value == EMPTY_EDITOR {
        None
    } else {
        Some(value.to_string())
    }
}

/// Read access to whatever currently renders the form.
pub trait FormSource {
    /// Value of an input, select or textarea.
    fn text(&self, id: &str) -> Option<String>;
    /// Rendered HTML of a rich-text editor.
    fn rich_text(&self, id: &str) -> Option<String>;
    fn checked(&self, id: &str) -> bool;
    /// Value of the checked option in a radio group.
    fn checked_radio(&self, group: &str) -> Option<String>;
}

/// Value of the checked option of `group`, or `None` when nothing is checked.
pub fn radio_button_value<S: FormSource + ?Sized>(source: &S, group: &str) -> Option<String> {
    source.checked_radio(group).as_deref().and_then(or_null)
}

fn text_field<S: FormSource + ?Sized>(source: &S, id: &str) -> Option<String> {
    source.text(id).as_deref().and_then(or_null)
}

fn rich_field<S: FormSource + ?Sized>(source: &S, id: &str) -> Option<String> {
    source.rich_text(id).as_deref().and_then(or_null)
}

pub const RICH_TEXT_FIELDS: &[&str] = &[
    "description",
    "whodoesit",
    "achievement",
    "findable",
    "accessible",
    "interoperable",
    "reusable",
    "summary",
];

pub const RADIO_GROUPS: &[&str] = &["linked_publication", "data_timing", "refinement"];

pub const CONSENT_FIELDS: &[&str] = &[
    "consent_to_interview",
    "consent_to_checkpoints",
    "consent_to_financial",
    "consent_to_organization",
];

/// Everything the application form sends to the server.
///
/// Every key is always serialized; blanks go out as `null`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationRecord {
    pub name: Option<String>,
    pub pronouns: Option<String>,
    pub email: Option<String>,
    pub institution: Option<String>,
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

impl ApplicationRecord {
    /// Read the form as it is right now.
    pub fn collect<S: FormSource + ?Sized>(source: &S) -> Self {
        Self {
            name: text_field(source, "name"),
            pronouns: text_field(source, "pronouns"),
            email: text_field(source, "email"),
            institution: text_field(source, "institution"),
            faculty: text_field(source, "faculty"),
            department: text_field(source, "department"),
            position: text_field(source, "position"),
            discipline: text_field(source, "discipline"),
            datatype: text_field(source, "datatype"),
            description: rich_field(source, "description"),
            size: text_field(source, "size"),
            whodoesit: rich_field(source, "whodoesit"),
            achievement: rich_field(source, "achievement"),
            fair_summary: text_field(source, "fair_summary"),
            findable: rich_field(source, "findable"),
            accessible: rich_field(source, "accessible"),
            interoperable: rich_field(source, "interoperable"),
            reusable: rich_field(source, "reusable"),
            summary: rich_field(source, "summary"),
            promotion: text_field(source, "promotion"),
            linked_publication: radio_button_value(source, "linked_publication"),
            data_timing: radio_button_value(source, "data_timing"),
            refinement: radio_button_value(source, "refinement"),
            consent_to_interview: source.checked("consent_to_interview"),
            consent_to_checkpoints: source.checked("consent_to_checkpoints"),
            consent_to_financial: source.checked("consent_to_financial"),
            consent_to_organization: source.checked("consent_to_organization"),
        }
    }

    /// String value of a field, for pre-filling inputs.
    pub fn value_of(&self, field: &str) -> Option<String> {
        let value = serde_json::to_value(self).ok()?;
        value.get(field)?.as_str().map(str::to_string)
    }

    /// Boolean value of a field, `false` for unknown names.
    pub fn flag_of(&self, field: &str) -> bool {
        match field {
            "consent_to_interview" => self.consent_to_interview,
            "consent_to_checkpoints" => self.consent_to_checkpoints,
            "consent_to_financial" => self.consent_to_financial,
            "consent_to_organization" => self.consent_to_organization,
            _ => false,
        }
    }
}

/// Reviewer scores, keyed by the profile's field names.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReviewScores(pub BTreeMap<String, Option<String>>);

impl ReviewScores {
    /// Read the `score-{field}` selects of one review profile.
    pub fn collect<S: FormSource + ?Sized>(source: &S, profile: ReviewProfile) -> Self {
        Self(
            profile
                .fields()
                .iter()
                .map(|field| (field.to_string(), source.text(&format!("score-{}", field))))
                .collect(),
        )
    }
}
