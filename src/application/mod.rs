//! Application layer - orchestrates the domain over the ports.
//!
//! - `dialogs` - the dialog machine and the bot's waterfall dialogs
//! - `pipeline` - per-turn orchestration, persistence and escalation hand-off
//! - `escalation` - dispatch to agent channels and the background worker

pub mod dialogs;
pub mod escalation;
pub mod pipeline;

pub use escalation::{EscalationDispatcher, EscalationWorker};
pub use pipeline::{TurnError, TurnOutcome, TurnPipeline, TurnSettings};
