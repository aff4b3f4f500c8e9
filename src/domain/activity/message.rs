//! Activity entity - one message or event exchanged with the user.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::foundation::{ActivityId, ConversationKey, Timestamp, UserKey, ValidationError};

use super::card::Attachment;

/// Kind of activity; only messages take part in dialogs and transcripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActivityKind {
    #[default]
    Message,
    ConversationUpdate,
    Typing,
    #[serde(other)]
    Other,
}

/// User or bot account on the channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelAccount {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ChannelAccount {
    pub fn new(id: impl Into<String>, name: Option<String>) -> Self {
        Self {
            id: id.into(),
            name,
        }
    }
}

/// Conversation reference on the channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationAccount {
    pub id: String,
}

/// A single message/event unit.
///
/// Replies (`reply_to_id` set) come from the bot side; everything else
/// from the user side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    #[serde(rename = "type", default)]
    pub kind: ActivityKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ActivityId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speak: Option<String>,

    /// Structured payload, e.g. an Adaptive Card form submission.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to_id: Option<ActivityId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<ChannelAccount>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<ChannelAccount>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation: Option<ConversationAccount>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members_added: Vec<ChannelAccount>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Timestamp>,
}

impl Activity {
    /// Plain text message.
    pub fn message(text: impl Into<String>) -> Self {
        Self {
            kind: ActivityKind::Message,
            text: Some(text.into()),
            ..Default::default()
        }
    }

    /// Message carrying a single card.
    pub fn attachment(attachment: Attachment) -> Self {
        Self {
            kind: ActivityKind::Message,
            attachments: vec![attachment],
            ..Default::default()
        }
    }

    pub fn with_speak(mut self, speak: impl Into<String>) -> Self {
        self.speak = Some(speak.into());
        self
    }

    pub fn with_value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(ActivityId::new(id));
        self
    }

    pub fn with_from(mut self, id: impl Into<String>, name: Option<String>) -> Self {
        self.from = Some(ChannelAccount::new(id, name));
        self
    }

    pub fn with_recipient(mut self, id: impl Into<String>, name: Option<String>) -> Self {
        self.recipient = Some(ChannelAccount::new(id, name));
        self
    }

    pub fn with_conversation(mut self, id: impl Into<String>) -> Self {
        self.conversation = Some(ConversationAccount { id: id.into() });
        self
    }

    pub fn is_message(&self) -> bool {
        self.kind == ActivityKind::Message
    }

    pub fn is_reply(&self) -> bool {
        self.reply_to_id.is_some()
    }

    /// Raw text, empty when absent.
    pub fn text_or_empty(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    /// Structured payload, ignoring explicit JSON nulls.
    pub fn structured_value(&self) -> Option<&Value> {
        self.value.as_ref().filter(|v| !v.is_null())
    }

    /// Trimmed text, falling back to trimmed speak. `None` when both are blank.
    pub fn display_text(&self) -> Option<String> {
        [self.text.as_deref(), self.speak.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|s| !s.is_empty())
            .map(str::to_string)
    }

    pub fn conversation_key(&self) -> Result<ConversationKey, ValidationError> {
        let id = self
            .conversation
            .as_ref()
            .map(|c| c.id.clone())
            .unwrap_or_default();
        ConversationKey::new(id)
    }

    pub fn user_key(&self) -> Result<UserKey, ValidationError> {
        let id = self.from.as_ref().map(|f| f.id.clone()).unwrap_or_default();
        UserKey::new(id)
    }

    /// Display name of the sender, if the channel supplied one.
    pub fn sender_name(&self) -> Option<&str> {
        self.from.as_ref().and_then(|f| f.name.as_deref())
    }

    /// Assigns a generated id and the current time where missing.
    pub fn stamp(&mut self) {
        if self.id.is_none() {
            self.id = Some(ActivityId::generate());
        }
        if self.timestamp.is_none() {
            self.timestamp = Some(Timestamp::now());
        }
    }

    /// Addresses this activity as a reply to `inbound`.
    pub fn address_reply_to(&mut self, inbound: &Activity) {
        self.reply_to_id = inbound.id.clone();
        if self.conversation.is_none() {
            self.conversation = inbound.conversation.clone();
        }
        if self.from.is_none() {
            self.from = inbound.recipient.clone();
        }
        if self.recipient.is_none() {
            self.recipient = inbound.from.clone();
        }
    }

    /// Members added to the conversation, other than the bot itself.
    pub fn added_members_other_than_recipient(&self) -> impl Iterator<Item = &ChannelAccount> {
        let recipient_id = self.recipient.as_ref().map(|r| r.id.as_str());
        self.members_added
            .iter()
            .filter(move |m| Some(m.id.as_str()) != recipient_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_channel_shape() {
        let activity: Activity = serde_json::from_value(json!({
            "type": "message",
            "id": "abc",
            "text": "hello",
            "replyToId": "xyz",
            "from": {"id": "u1", "name": "Alice"},
            "conversation": {"id": "c1"},
            "timestamp": "2024-01-15T10:30:00Z"
        }))
        .unwrap();

        assert!(activity.is_message());
        assert!(activity.is_reply());
        assert_eq!(activity.sender_name(), Some("Alice"));
        assert_eq!(activity.conversation_key().unwrap().as_str(), "c1");
        assert!(activity.timestamp.is_some());
    }

    #[test]
    fn unknown_activity_types_are_tolerated() {
        let activity: Activity =
            serde_json::from_value(json!({"type": "installationUpdate"})).unwrap();
        assert_eq!(activity.kind, ActivityKind::Other);
    }

    #[test]
    fn display_text_prefers_text_then_speak() {
        assert_eq!(
            Activity::message("  hi  ").display_text().as_deref(),
            Some("hi")
        );
        assert_eq!(
            Activity::message("   ").with_speak(" spoken ").display_text().as_deref(),
            Some("spoken")
        );
        assert_eq!(Activity::default().display_text(), None);
    }

    #[test]
    fn structured_value_ignores_null() {
        let activity = Activity::message("x").with_value(Value::Null);
        assert!(activity.structured_value().is_none());

        let activity = Activity::message("x").with_value(json!({"title": "t"}));
        assert!(activity.structured_value().is_some());
    }

    #[test]
    fn stamp_fills_missing_id_and_timestamp_only() {
        let mut activity = Activity::message("hi");
        activity.stamp();
        assert!(activity.id.as_ref().unwrap().is_generated());
        assert!(activity.timestamp.is_some());

        let mut existing = Activity::message("hi").with_id("1234");
        existing.stamp();
        assert_eq!(existing.id.unwrap().as_str(), "1234");
    }

    #[test]
    fn reply_addressing_swaps_accounts() {
        let inbound = Activity::message("q")
            .with_id("in-1")
            .with_from("user", Some("Alice".to_string()))
            .with_recipient("bot", None)
            .with_conversation("c1");

        let mut reply = Activity::message("a");
        reply.address_reply_to(&inbound);

        assert_eq!(reply.reply_to_id.as_ref().unwrap().as_str(), "in-1");
        assert_eq!(reply.from.as_ref().unwrap().id, "bot");
        assert_eq!(reply.recipient.as_ref().unwrap().id, "user");
        assert_eq!(reply.conversation_key().unwrap().as_str(), "c1");
    }

    #[test]
    fn missing_conversation_is_a_validation_error() {
        assert!(Activity::message("hi").conversation_key().is_err());
        assert!(Activity::message("hi").user_key().is_err());
    }

    #[test]
    fn added_members_skip_the_bot() {
        let mut activity = Activity {
            kind: ActivityKind::ConversationUpdate,
            ..Default::default()
        }
        .with_recipient("bot", None);
        activity.members_added = vec![
            ChannelAccount::new("bot", None),
            ChannelAccount::new("user", None),
        ];

        let ids: Vec<_> = activity
            .added_members_other_than_recipient()
            .map(|m| m.id.as_str())
            .collect();
        assert_eq!(ids, vec!["user"]);
    }
}
