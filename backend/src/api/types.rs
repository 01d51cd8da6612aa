//! REST API payloads for the form frontend.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

/// Answer to `POST /application-form`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedApplication {
    pub uuid: Uuid,
}

/// Answer to a successful submit; the frontend navigates there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitRedirect {
    pub redirect_to: String,
}

impl SubmitRedirect {
    pub fn for_application(uuid: &Uuid) -> Self {
        Self {
            redirect_to: format!("/application-form/{}/submit", uuid),
        }
    }
}

/// Body of every API answer while in maintenance mode.
pub fn maintenance_response() -> Value {
    json!({ "status": "maintenance" })
}

/// robots.txt body.
pub fn robots_txt(allow_crawlers: bool) -> String {
    let rule = if allow_crawlers { "Allow: /" } else { "Disallow: /" };
    format!("User-agent: *\n{}\n", rule)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_redirect_target() {
        let uuid = Uuid::nil();
        let value = serde_json::to_value(SubmitRedirect::for_application(&uuid)).unwrap();
        assert_eq!(
            value,
            json!({ "redirect_to": "/application-form/00000000-0000-0000-0000-000000000000/submit" })
        );
    }

    #[test]
    fn test_robots_policy() {
        assert_eq!(robots_txt(false), "User-agent: *\nDisallow: /\n");
        assert_eq!(robots_txt(true), "User-agent: *\nAllow: /\n");
    }
}
