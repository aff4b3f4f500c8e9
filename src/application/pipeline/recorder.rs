//! In-turn scratch queue of activities destined for the chat log.

use crate::domain::activity::Activity;
use crate::domain::transcript::FeedbackState;

/// Collects message activities in the order they happen during one turn and
/// writes them into the feedback state in a single flush.
#[derive(Debug, Default)]
pub struct TranscriptRecorder {
    queue: Vec<Activity>,
}

impl TranscriptRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a message activity. Anything else is ignored.
    pub fn record(&mut self, activity: &Activity) {
        if activity.is_message() {
            self.queue.push(activity.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Appends the queue to the chat log and empties it. Returns the number
    /// of chats written.
    pub fn flush_into(&mut self, feedback: &mut FeedbackState) -> usize {
        self.queue
            .drain(..)
            .filter(|activity| feedback.append_activity(activity))
            .count()
    }
}
