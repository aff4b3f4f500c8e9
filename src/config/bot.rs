//! Conversation behaviour configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Settings that shape the dialogs and the escalation flow.
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// Rephrase count that triggers automatic escalation. `0` disables it.
    #[serde(default)]
    pub negative_feedback_threshold: u32,

    /// Attach the chat log to form-submitted escalations
    #[serde(default)]
    pub include_chat_transcript: bool,

    /// Partition used for feedback and transcript state
    #[serde(default)]
    pub state_scope: StateScope,

    /// Reply sent when the QnA backend has nothing above the score threshold
    #[serde(default = "default_answer")]
    pub default_answer: String,

    /// Heading printed on rendered transcripts
    #[serde(default = "default_transcript_title")]
    pub transcript_title: String,

    /// Logo shown on rendered cards
    pub logo_url: Option<String>,

    /// Maximum escalations delivered at the same time
    #[serde(default = "default_escalation_concurrency")]
    pub escalation_concurrency: usize,

    /// Per-channel delivery timeout in seconds
    #[serde(default = "default_dispatch_timeout")]
    pub dispatch_timeout_secs: u64,

    /// How long shutdown waits for in-flight escalations
    #[serde(default = "default_drain_timeout")]
    pub drain_timeout_secs: u64,
}

/// Which key feedback and transcript state is stored under.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StateScope {
    #[default]
    Conversation,
    User,
}

impl BotConfig {
    pub fn dispatch_timeout(&self) -> Duration {
        Duration::from_secs(self.dispatch_timeout_secs)
    }

    pub fn drain_timeout(&self) -> Duration {
        Duration::from_secs(self.drain_timeout_secs)
    }

    /// Check if automatic threshold escalation is active
    pub fn auto_escalation_enabled(&self) -> bool {
        self.negative_feedback_threshold > 0
    }

    /// Validate bot configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.escalation_concurrency == 0 || self.escalation_concurrency > 64 {
            return Err(ValidationError::InvalidConcurrency);
        }
        if self.dispatch_timeout_secs == 0 || self.dispatch_timeout_secs > 300 {
            return Err(ValidationError::InvalidDispatchTimeout);
        }
        if self.default_answer.trim().is_empty() {
            return Err(ValidationError::MissingRequired("BOT__DEFAULT_ANSWER"));
        }
        Ok(())
    }
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            negative_feedback_threshold: 0,
            include_chat_transcript: false,
            state_scope: StateScope::default(),
            default_answer: default_answer(),
            transcript_title: default_transcript_title(),
            logo_url: None,
            escalation_concurrency: default_escalation_concurrency(),
            dispatch_timeout_secs: default_dispatch_timeout(),
            drain_timeout_secs: default_drain_timeout(),
        }
    }
}

fn default_answer() -> String {
    "Sorry, I could not find an answer to your question.".to_string()
}

fn default_transcript_title() -> String {
    "Bot Transcript".to_string()
}

fn default_escalation_concurrency() -> usize {
    4
}

fn default_dispatch_timeout() -> u64 {
    15
}

fn default_drain_timeout() -> u64 {
    30
}
