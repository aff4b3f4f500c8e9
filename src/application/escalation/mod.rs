//! Escalation - dispatch to agent-facing channels and its background worker.

mod dispatcher;
mod worker;

pub use dispatcher::{ChannelOutcome, DeliveryStatus, EscalationDispatcher};
pub use worker::{DrainReport, EscalationJob, EscalationWorker};
