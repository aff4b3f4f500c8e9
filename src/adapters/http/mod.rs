//! HTTP adapters - the transport the bot is reached through.

pub mod turn;

pub use turn::{app_router, turn_routes, TurnAppState};
