//! Domain layer containing conversation types and pure state transitions.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (keys, ids, timestamps, errors)
//! - `activity` - Messages, cards and feedback codes
//! - `transcript` - Per-scope feedback counter and chat log
//! - `dialog` - Dialog stack and step results
//! - `escalation` - Ask-agent form and escalation reports

pub mod activity;
pub mod dialog;
pub mod escalation;
pub mod foundation;
pub mod transcript;
