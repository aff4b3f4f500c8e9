//! Transcript and feedback accumulation.

mod feedback_state;

pub use feedback_state::{Chat, FeedbackState, Sender, DID_YOU_MEAN_TITLE};
