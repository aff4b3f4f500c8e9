//! Escalation form submitted from the "ask agent" card.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::domain::foundation::Timestamp;

/// Submission that cannot be turned into an [`EscalationForm`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedSubmission {
    #[error("Form submission must be a JSON object")]
    NotAnObject,

    #[error("Form field '{0}' is missing or blank")]
    MissingField(&'static str),

    #[error("Form field '{0}' must be a string")]
    NotAString(&'static str),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscalationForm {
    pub title: String,
    pub details: String,
    pub submitted_at: Timestamp,
}

impl EscalationForm {
    /// Parses `{title, details}`; both must be non-blank strings.
    pub fn from_submission(
        value: &Value,
        submitted_at: Timestamp,
    ) -> Result<Self, MalformedSubmission> {
        let fields = value.as_object().ok_or(MalformedSubmission::NotAnObject)?;
        Ok(Self {
            title: required_field(fields, "title")?,
            details: required_field(fields, "details")?,
            submitted_at,
        })
    }
}

fn required_field(
    fields: &serde_json::Map<String, Value>,
    name: &'static str,
) -> Result<String, MalformedSubmission> {
    match fields.get(name) {
        None | Some(Value::Null) => Err(MalformedSubmission::MissingField(name)),
        Some(Value::String(s)) if s.trim().is_empty() => Err(MalformedSubmission::MissingField(name)),
        Some(Value::String(s)) => Ok(s.trim().to_string()),
        Some(_) => Err(MalformedSubmission::NotAString(name)),
    }
}
