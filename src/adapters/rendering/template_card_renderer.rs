//! Template Card Renderer - CardRenderer backed by Adaptive Card JSON templates.
//!
//! Bundled templates are compiled into the binary and parsed once. Extra
//! templates can be registered per instance, e.g. for tests or branding.

use once_cell::sync::Lazy;
use serde_json::Value;
use std::collections::BTreeMap;

use super::expander::Expander;
use super::html::render_document;
use crate::domain::activity::{Attachment, ADAPTIVE_CARD_CONTENT_TYPE};
use crate::ports::{templates, CardRenderer, RenderError, RenderedPayload};

const BUNDLED_SOURCES: [(&str, &str); 5] = [
    (templates::WELCOME, include_str!("templates/welcome.json")),
    (
        templates::ESCALATION_INPUT,
        include_str!("templates/escalation_input.json"),
    ),
    (
        templates::ESCALATION_SUBMIT,
        include_str!("templates/escalation_submit.json"),
    ),
    (
        templates::ESCALATION_SUBMIT_NO_TRANSCRIPT,
        include_str!("templates/escalation_submit_no_transcript.json"),
    ),
    (templates::TRANSCRIPT, include_str!("templates/transcript.json")),
];

/// Parsed bundled templates. A template that fails to parse is kept as its
/// error so rendering it reports `InvalidTemplate`.
static BUNDLED: Lazy<BTreeMap<String, Result<Value, String>>> = Lazy::new(|| {
    BUNDLED_SOURCES
        .iter()
        .map(|(id, source)| {
            let parsed = serde_json::from_str::<Value>(source).map_err(|e| e.to_string());
            (id.to_string(), parsed)
        })
        .collect()
});

/// Renders Adaptive Card templates into attachment, HTML and channel JSON.
#[derive(Debug, Clone, Default)]
pub struct TemplateCardRenderer {
    overrides: BTreeMap<String, Value>,
}

impl TemplateCardRenderer {
    /// Creates a renderer with the bundled templates.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers or replaces a template from JSON source.
    pub fn with_template(
        mut self,
        template_id: impl Into<String>,
        source: &str,
    ) -> Result<Self, RenderError> {
        let template_id = template_id.into();
        let template =
            serde_json::from_str(source).map_err(|e| RenderError::InvalidTemplate {
                template_id: template_id.clone(),
                reason: e.to_string(),
            })?;
        self.overrides.insert(template_id, template);
        Ok(self)
    }

    /// Ids this renderer can render, sorted.
    pub fn template_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = BUNDLED.keys().cloned().collect();
        for id in self.overrides.keys() {
            if !ids.contains(id) {
                ids.push(id.clone());
            }
        }
        ids.sort();
        ids
    }

    fn template(&self, template_id: &str) -> Result<&Value, RenderError> {
        if let Some(template) = self.overrides.get(template_id) {
            return Ok(template);
        }
        match BUNDLED.get(template_id) {
            Some(Ok(template)) => Ok(template),
            Some(Err(reason)) => Err(RenderError::InvalidTemplate {
                template_id: template_id.to_string(),
                reason: reason.clone(),
            }),
            None => Err(RenderError::UnknownTemplate(template_id.to_string())),
        }
    }
}

/// Wraps a card in the message envelope chat webhooks accept.
fn channel_envelope(card_json: &str) -> String {
    format!(
        r#"{{"type":"message","attachments":[{{"contentType":"{}","contentUrl":null,"content":{}}}]}}"#,
        ADAPTIVE_CARD_CONTENT_TYPE, card_json
    )
}

impl CardRenderer for TemplateCardRenderer {
    fn render(&self, template_id: &str, data: &Value) -> Result<RenderedPayload, RenderError> {
        let template = self.template(template_id)?;
        let card = Expander::new(template_id, data).expand(template)?;

        if !card.is_object() {
            return Err(RenderError::InvalidTemplate {
                template_id: template_id.to_string(),
                reason: "card did not expand to an object".to_string(),
            });
        }

        let card_json =
            serde_json::to_string(&card).map_err(|e| RenderError::Serialization(e.to_string()))?;

        Ok(RenderedPayload {
            html: render_document(&card),
            channel_json: channel_envelope(&card_json),
            attachment: Attachment::adaptive(card),
        })
    }
}
