//! Identifiers used to partition conversation state.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::ValidationError;

/// Longest identifier accepted from a channel. Keys end up in file names.
pub const MAX_IDENTIFIER_LEN: usize = 512;

fn checked(field: &'static str, id: String) -> Result<String, ValidationError> {
    if id.trim().is_empty() {
        return Err(ValidationError::MissingIdentifier(field));
    }
    if id.len() > MAX_IDENTIFIER_LEN {
        return Err(ValidationError::IdentifierTooLong {
            field,
            len: id.len(),
            max: MAX_IDENTIFIER_LEN,
        });
    }
    Ok(id)
}

/// Conversation identifier as assigned by the channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationKey(String);

impl ConversationKey {
    pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
        checked("conversation.id", id.into()).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Channel user identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserKey(String);

impl UserKey {
    pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
        checked("from.id", id.into()).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Activity identifier. Generated ids carry a `g_` prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityId(String);

impl ActivityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh id for an activity that arrived without one.
    pub fn generate() -> Self {
        Self(format!("g_{}", Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_generated(&self) -> bool {
        self.0.starts_with("g_")
    }
}

impl fmt::Display for ActivityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Name of one persisted state record.
///
/// Keys for different partitions never collide because the partition is
/// part of the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateKey(String);

impl StateKey {
    /// Dialog stack of a conversation.
    pub fn dialog(conversation: &ConversationKey) -> Self {
        Self(format!("conversation/{}/dialog", conversation))
    }

    /// Feedback state scoped to a conversation.
    pub fn conversation_feedback(conversation: &ConversationKey) -> Self {
        Self(format!("conversation/{}/feedback", conversation))
    }

    /// Feedback state scoped to a user across conversations.
    pub fn user_feedback(user: &UserKey) -> Self {
        Self(format!("user/{}/feedback", user))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
