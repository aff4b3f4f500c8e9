//! Activities exchanged between the user and the bot, the cards they
//! carry, and the feedback codes recognised in user text.

mod card;
mod feedback_code;
mod message;

pub use message::{Activity, ActivityKind, ChannelAccount, ConversationAccount};
pub use card::{
    ActionType, Attachment, CardAction, HeroCard, ADAPTIVE_CARD_CONTENT_TYPE,
    HERO_CARD_CONTENT_TYPE,
};
pub use feedback_code::{is_ask_agent, FeedbackCode, ASK_AGENT_SYNONYMS};
