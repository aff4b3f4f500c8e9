//! Card attachments carried by activities.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const HERO_CARD_CONTENT_TYPE: &str = "application/vnd.microsoft.card.hero";
pub const ADAPTIVE_CARD_CONTENT_TYPE: &str = "application/vnd.microsoft.card.adaptive";

/// A rich attachment on an activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub content_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_url: Option<String>,

    #[serde(default)]
    pub content: Value,
}

impl Attachment {
    /// Wraps an expanded Adaptive Card.
    pub fn adaptive(content: Value) -> Self {
        Self {
            content_type: ADAPTIVE_CARD_CONTENT_TYPE.to_string(),
            content_url: None,
            content,
        }
    }

    /// Wraps a hero card.
    pub fn hero(card: &HeroCard) -> Self {
        Self {
            content_type: HERO_CARD_CONTENT_TYPE.to_string(),
            content_url: None,
            content: card.to_value(),
        }
    }

    pub fn is_hero_card(&self) -> bool {
        self.content_type == HERO_CARD_CONTENT_TYPE
    }

    /// Reads the content back as a hero card, if it is one.
    pub fn as_hero_card(&self) -> Option<HeroCard> {
        if !self.is_hero_card() {
            return None;
        }
        serde_json::from_value(self.content.clone()).ok()
    }
}

/// Card with a block of text and a row of buttons.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeroCard {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default)]
    pub buttons: Vec<CardAction>,
}

impl HeroCard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_button(mut self, button: CardAction) -> Self {
        self.buttons.push(button);
        self
    }

    /// Button titles in display order.
    pub fn button_titles(&self) -> Vec<&str> {
        self.buttons.iter().map(|b| b.title.as_str()).collect()
    }

    fn to_value(&self) -> Value {
        let mut card = serde_json::Map::new();
        if let Some(title) = &self.title {
            card.insert("title".to_string(), Value::String(title.clone()));
        }
        if let Some(text) = &self.text {
            card.insert("text".to_string(), Value::String(text.clone()));
        }
        card.insert(
            "buttons".to_string(),
            Value::Array(self.buttons.iter().map(CardAction::to_value).collect()),
        );
        Value::Object(card)
    }
}

/// How a card button posts back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionType {
    ImBack,
    MessageBack,
    #[serde(other)]
    Other,
}

impl ActionType {
    fn as_str(&self) -> &'static str {
        match self {
            ActionType::ImBack => "imBack",
            ActionType::MessageBack => "messageBack",
            ActionType::Other => "other",
        }
    }
}

/// One button on a card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardAction {
    #[serde(rename = "type")]
    pub kind: ActionType,

    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl CardAction {
    /// Button whose visible label is posted back as the message text.
    pub fn message_back(label: impl Into<String>) -> Self {
        let label = label.into();
        Self {
            kind: ActionType::MessageBack,
            title: label.clone(),
            text: Some(label.clone()),
            display_text: Some(label),
            value: None,
        }
    }

    /// Button that sends its label as if the user had typed it.
    pub fn im_back(label: impl Into<String>) -> Self {
        let label = label.into();
        Self {
            kind: ActionType::ImBack,
            title: label.clone(),
            text: None,
            display_text: None,
            value: Some(Value::String(label)),
        }
    }

    fn to_value(&self) -> Value {
        let mut action = serde_json::Map::new();
        action.insert("type".to_string(), Value::String(self.kind.as_str().to_string()));
        action.insert("title".to_string(), Value::String(self.title.clone()));
        if let Some(text) = &self.text {
            action.insert("text".to_string(), Value::String(text.clone()));
        }
        if let Some(display_text) = &self.display_text {
            action.insert("displayText".to_string(), Value::String(display_text.clone()));
        }
        if let Some(value) = &self.value {
            action.insert("value".to_string(), value.clone());
        }
        Value::Object(action)
    }
}
