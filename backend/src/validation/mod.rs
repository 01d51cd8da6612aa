//! Validation of incoming form and review bodies.
//!
//! Every check appends to a shared error list instead of returning early,
//! so a single 400 response names every offending field.
//!
//! # Rules
//!
//! - Strings carry `(min, max)` character bounds. A present value must fit;
//!   an absent or empty value is only an error when `required`.
//! - Option fields accept a fixed set of values.
//! - Booleans must be JSON booleans when present.
//! - On submit, three consents must be given. Their errors are reported as
//!   `checkpoints_consent`, `financial_consent` and `organization_consent`.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use serde_json::Value;
use uuid::Uuid;

use crate::models::{ApplicationFields, FieldError};

pub const LINKED_PUBLICATION_OPTIONS: &[&str] = &["yes", "no"];

pub const DATA_TIMING_OPTIONS: &[&str] = &["decades-ago", "years-ago", "recent", "ongoing"];

pub const REFINEMENT_OPTIONS: &[&str] = &[
    "apply-metadata-standards",
    "additional-data",
    "anonymisation",
    "translation",
    "integration",
    "recovery",
    "visualisation",
    "promotion",
];

/// Longest accepted review score.
pub const MAX_SCORE_LENGTH: usize = 64;

const MISSING_VALUE: &str = "Missing required value.";

/// Present, non-empty value of `field`; an explicit `null` counts as absent.
fn present<'a>(record: &'a Value, field: &str) -> Option<&'a Value> {
    match record.get(field) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.is_empty() => None,
        Some(value) => Some(value),
    }
}

pub fn string_value(
    record: &Value,
    field: &str,
    min: usize,
    max: usize,
    required: bool,
    errors: &mut Vec<FieldError>,
) -> Option<String> {
    let Some(value) = present(record, field) else {
        if required {
            errors.push(FieldError::new(field, MISSING_VALUE));
        }
        return None;
    };
    let Some(text) = value.as_str() else {
        errors.push(FieldError::new(field, "Expected a string."));
        return None;
    };

    let length = text.chars().count();
    if length < min || length > max {
        errors.push(FieldError::new(
            field,
            format!("The value must be between {} and {} characters long.", min, max),
        ));
        return None;
    }
    Some(text.to_string())
}

pub fn uuid_value(record: &Value, field: &str, required: bool, errors: &mut Vec<FieldError>) -> Option<Uuid> {
    let Some(value) = present(record, field) else {
        if required {
            errors.push(FieldError::new(field, MISSING_VALUE));
        }
        return None;
    };
    match value.as_str().and_then(|s| Uuid::parse_str(s).ok()) {
        Some(uuid) => Some(uuid),
        None => {
            errors.push(FieldError::new(field, "Expected a valid UUID."));
            None
        }
    }
}

pub fn options_value(
    record: &Value,
    field: &str,
    options: &[&str],
    required: bool,
    errors: &mut Vec<FieldError>,
) -> Option<String> {
    let Some(value) = present(record, field) else {
        if required {
            errors.push(FieldError::new(field, MISSING_VALUE));
        }
        return None;
    };
    match value.as_str() {
        Some(choice) if options.contains(&choice) => Some(choice.to_string()),
        _ => {
            errors.push(FieldError::new(
                field,
                format!("Expected one of: {}.", options.join(", ")),
            ));
            None
        }
    }
}

pub fn boolean_value(record: &Value, field: &str, default: bool, errors: &mut Vec<FieldError>) -> bool {
    match record.get(field) {
        None | Some(Value::Null) => default,
        Some(Value::Bool(b)) => *b,
        Some(_) => {
            errors.push(FieldError::new(field, "Expected true or false."));
            default
        }
    }
}

/// Check an application body. `submit` turns on the required-field rules.
pub fn validate_application(record: &Value, submit: bool) -> Result<ApplicationFields, Vec<FieldError>> {
    let mut errors = Vec::new();
    if !record.is_object() {
        return Err(vec![FieldError::new("record", "Expected a JSON object.")]);
    }
    let e = &mut errors;

    let consent_to_interview = boolean_value(record, "consent_to_interview", false, e);
    let consent_to_checkpoints = boolean_value(record, "consent_to_checkpoints", false, e);
    let consent_to_financial = boolean_value(record, "consent_to_financial", false, e);
    let consent_to_organization = boolean_value(record, "consent_to_organization", false, e);

    if submit {
        if !consent_to_checkpoints {
            e.push(FieldError::new(
                "checkpoints_consent",
                "To obtain funding you must consent to attend three checkpoints with a staff member at 4TU.ResearchData.",
            ));
        }
        if !consent_to_financial {
            e.push(FieldError::new(
                "financial_consent",
                "To obtain funding you must gather the financial information from your institute.",
            ));
        }
        if !consent_to_organization {
            e.push(FieldError::new(
                "organization_consent",
                "To obtain funding you must agree that your organization will receive the requested budget.",
            ));
        }
    }

    let fields = ApplicationFields {
        name: string_value(record, "name", 1, 255, submit, e),
        pronouns: string_value(record, "pronouns", 0, 255, false, e),
        email: string_value(record, "email", 0, 512, submit, e),
        institution: uuid_value(record, "institution", submit, e),
        faculty: string_value(record, "faculty", 0, 255, submit, e),
        department: string_value(record, "department", 0, 255, submit, e),
        position: string_value(record, "position", 0, 255, submit, e),
        discipline: string_value(record, "discipline", 0, 255, submit, e),
        datatype: string_value(record, "datatype", 0, 255, submit, e),
        description: string_value(record, "description", 3, 16384, submit, e),
        size: string_value(record, "size", 0, 255, submit, e),
        whodoesit: string_value(record, "whodoesit", 0, 8192, submit, e),
        achievement: string_value(record, "achievement", 0, 8192, submit, e),
        fair_summary: string_value(record, "fair_summary", 0, 16384, submit, e),
        findable: string_value(record, "findable", 0, 16384, submit, e),
        accessible: string_value(record, "accessible", 0, 16384, submit, e),
        interoperable: string_value(record, "interoperable", 0, 16384, submit, e),
        reusable: string_value(record, "reusable", 0, 16384, submit, e),
        summary: string_value(record, "summary", 0, 16384, submit, e),
        promotion: string_value(record, "promotion", 0, 16384, submit, e),
        linked_publication: options_value(record, "linked_publication", LINKED_PUBLICATION_OPTIONS, submit, e),
        data_timing: options_value(record, "data_timing", DATA_TIMING_OPTIONS, submit, e),
        refinement: options_value(record, "refinement", REFINEMENT_OPTIONS, submit, e),
        consent_to_interview,
        consent_to_checkpoints,
        consent_to_financial,
        consent_to_organization,
    };

    if errors.is_empty() {
        Ok(fields)
    } else {
        Err(errors)
    }
}

/// Check a review body: an object of non-empty scores.
pub fn validate_review(body: &Value) -> Result<BTreeMap<String, String>, Vec<FieldError>> {
    let Some(object) = body.as_object() else {
        return Err(vec![FieldError::new("scores", "Expected a JSON object.")]);
    };
    if object.is_empty() {
        return Err(vec![FieldError::new("scores", "No scores given.")]);
    }

    let mut errors = Vec::new();
    let mut scores = BTreeMap::new();
    for (field, value) in object {
        match value.as_str() {
            Some(score) if !score.is_empty() && score.chars().count() <= MAX_SCORE_LENGTH => {
                scores.insert(field.clone(), score.to_string());
            }
            Some(score) if !score.is_empty() => errors.push(FieldError::new(
                field,
                format!("A score may be at most {} characters long.", MAX_SCORE_LENGTH),
            )),
            _ => errors.push(FieldError::new(field, MISSING_VALUE)),
        }
    }

    if errors.is_empty() {
        Ok(scores)
    } else {
        Err(errors)
    }
}

/// Relative storage path for an uploaded file name.
///
/// Folder uploads send `dir/file` names; those are kept. Empty names,
/// absolute paths and `..` segments are refused.
pub fn sanitize_file_name(name: &str) -> Option<PathBuf> {
    let normalized = name.replace('\\', "/");
    let path = Path::new(&normalized);
    let mut clean = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    if clean.as_os_str().is_empty() {
        None
    } else {
        Some(clean)
    }
}
