//! Data handed to the card renderer when escalating.

use serde::Serialize;
use serde_json::Value;

use crate::domain::foundation::Timestamp;
use crate::domain::transcript::{Chat, FeedbackState};

/// Email subject used for threshold transcripts.
pub const TRANSCRIPT_SUBJECT: &str = "Escalation Chat Transcript";

/// What caused an escalation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscalationKind {
    /// The rephrase threshold was reached.
    Transcript,
    /// The user filled in the ask-agent form.
    FormSubmission,
}

impl EscalationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EscalationKind::Transcript => "transcript",
            EscalationKind::FormSubmission => "form_submission",
        }
    }
}

/// Snapshot of a [`FeedbackState`] shaped for card templates.
///
/// Every field is always present so templates can bind to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EscalationReport {
    pub title: String,
    pub details: String,
    pub name: String,
    pub date_time: String,
    pub logo: String,
    pub negative_feedback_count: u32,
    pub chats: Vec<Chat>,
}

impl EscalationReport {
    /// Report for a threshold escalation. `heading` becomes the title.
    pub fn transcript(state: &FeedbackState, heading: &str, logo: Option<&str>) -> Self {
        let at = state.timestamp.unwrap_or_else(Timestamp::now);
        Self {
            title: heading.to_string(),
            details: state.details.clone().unwrap_or_default(),
            name: state.name.clone().unwrap_or_default(),
            date_time: at.to_transcript_string(),
            logo: logo.unwrap_or_default().to_string(),
            negative_feedback_count: state.negative_count,
            chats: state.chats.clone(),
        }
    }

    /// Report for a submitted form, using the submitted title and details.
    pub fn form_submission(state: &FeedbackState, logo: Option<&str>) -> Self {
        let at = state.timestamp.unwrap_or_else(Timestamp::now);
        Self {
            title: state.title.clone().unwrap_or_default(),
            details: state.details.clone().unwrap_or_default(),
            name: state.name.clone().unwrap_or_default(),
            date_time: at.to_submission_string(),
            logo: logo.unwrap_or_default().to_string(),
            negative_feedback_count: state.negative_count,
            chats: state.chats.clone(),
        }
    }

    /// Subject line for outbound channels.
    pub fn subject(&self, kind: EscalationKind) -> String {
        match kind {
            EscalationKind::Transcript => TRANSCRIPT_SUBJECT.to_string(),
            EscalationKind::FormSubmission => self.title.clone(),
        }
    }

    /// Template data; field names follow the serde shape above.
    pub fn to_value(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }
}
