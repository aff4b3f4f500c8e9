//! FeedbackState - negative-feedback counter and chat log for one scope.
//!
//! All transitions are pure; loading and saving is the pipeline's job.

use serde::{Deserialize, Serialize};

use crate::domain::activity::Activity;
use crate::domain::escalation::EscalationForm;
use crate::domain::foundation::Timestamp;

/// Text of the suggestion card shown when several answers score alike.
pub const DID_YOU_MEAN_TITLE: &str = "Did you mean:";

const SUGGESTION_SEPARATOR: &str = "\n - ";

/// Who wrote a chat line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Sender {
    User,
    Bot,
}

impl Sender {
    /// Replies are bot-side, everything else user-side.
    pub fn of(activity: &Activity) -> Self {
        if activity.is_reply() {
            Sender::Bot
        } else {
            Sender::User
        }
    }
}

/// One line of the chat log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub sender: Sender,
    pub message: String,
}

/// Accumulated feedback for a conversation or a user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedbackState {
    #[serde(default)]
    pub negative_count: u32,

    #[serde(default)]
    pub chats: Vec<Chat>,

    /// Set from an escalation form submission.
    #[serde(default)]
    pub title: Option<String>,

    /// Set from an escalation form submission.
    #[serde(default)]
    pub details: Option<String>,

    /// Display name of the user, taken from their first message.
    #[serde(default)]
    pub name: Option<String>,

    /// When the current escalation was submitted or stamped.
    #[serde(default)]
    pub timestamp: Option<Timestamp>,
}

impl FeedbackState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one more "rephrase".
    pub fn record_negative(&mut self) {
        self.negative_count = self.negative_count.saturating_add(1);
    }

    /// Zeroes the counter without touching the chat log.
    pub fn reset_negative(&mut self) {
        self.negative_count = 0;
    }

    /// True iff automatic escalation is enabled and the count has reached it.
    pub fn threshold_crossed(&self, threshold: u32) -> bool {
        threshold > 0 && self.negative_count >= threshold
    }

    pub fn append_chat(&mut self, sender: Sender, message: impl Into<String>) {
        self.chats.push(Chat {
            sender,
            message: message.into(),
        });
    }

    /// Logs an activity, returning whether anything was appended.
    ///
    /// Activities without text or speak are skipped. A "Did you mean:"
    /// activity is flattened to the title followed by one line per button.
    pub fn append_activity(&mut self, activity: &Activity) -> bool {
        let sender = Sender::of(activity);
        if self.name.as_deref().map_or(true, str::is_empty) && sender == Sender::User {
            self.name = activity.sender_name().map(str::to_string);
        }

        let Some(mut message) = activity.display_text() else {
            return false;
        };

        if message == DID_YOU_MEAN_TITLE {
            if let Some(card) = activity.attachments.first().and_then(|a| a.as_hero_card()) {
                message = format!(
                    "{}{}{}",
                    message,
                    SUGGESTION_SEPARATOR,
                    card.button_titles().join(SUGGESTION_SEPARATOR)
                );
            }
        }

        self.append_chat(sender, message);
        true
    }

    /// Copies the submitted form onto the state.
    pub fn record_submission(&mut self, form: &EscalationForm) {
        self.title = Some(form.title.clone());
        self.details = Some(form.details.clone());
        self.timestamp = Some(form.submitted_at);
    }

    /// Zeroes the counter and empties the chat log. Identity fields stay.
    pub fn reset_after_escalation(&mut self) {
        self.negative_count = 0;
        self.chats.clear();
    }
}
