//! Card Renderer Port - Turns a template and data into card, HTML and
//! channel JSON.

use serde_json::Value;
use thiserror::Error;

use crate::domain::activity::Attachment;

/// Template ids known to the bundled renderer.
pub mod templates {
    pub const WELCOME: &str = "welcome";
    pub const ESCALATION_INPUT: &str = "escalation_input";
    pub const ESCALATION_SUBMIT: &str = "escalation_submit";
    pub const ESCALATION_SUBMIT_NO_TRANSCRIPT: &str = "escalation_submit_no_transcript";
    pub const TRANSCRIPT: &str = "transcript";
}

/// The three shapes of one rendered card.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPayload {
    /// Card attachment for the user's channel.
    pub attachment: Attachment,
    /// Standalone HTML, used as an email body.
    pub html: String,
    /// Message envelope for a chat webhook.
    pub channel_json: String,
}

#[derive(Debug, Clone, Error)]
pub enum RenderError {
    #[error("Unknown template: {0}")]
    UnknownTemplate(String),

    #[error("Template {template_id} is invalid: {reason}")]
    InvalidTemplate { template_id: String, reason: String },

    #[error("Template {template_id} binds '{path}' which the data does not provide")]
    MissingBinding { template_id: String, path: String },

    #[error("Failed to serialize rendered card: {0}")]
    Serialization(String),
}

/// Port for rendering cards.
///
/// Rendering must be deterministic: the same template and data always give
/// byte-identical output.
pub trait CardRenderer: Send + Sync {
    fn render(&self, template_id: &str, data: &Value) -> Result<RenderedPayload, RenderError>;
}
