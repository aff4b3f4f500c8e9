//! Keys, activity ids and timestamps shared by the rest of the domain.

mod errors;
mod ids;
mod timestamp;

pub use errors::ValidationError;
pub use ids::{ActivityId, ConversationKey, StateKey, UserKey, MAX_IDENTIFIER_LEN};
pub use timestamp::Timestamp;
