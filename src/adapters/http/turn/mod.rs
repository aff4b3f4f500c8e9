//! HTTP adapter for the bot's message endpoint.
//!
//! - `POST /api/messages` - Process one inbound activity, reply with the
//!   turn's outbound activities
//! - `GET /health` - Liveness probe

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::TurnAppState;
pub use routes::{app_router, turn_routes};
