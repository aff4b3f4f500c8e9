//! Dialog stack and step transitions.
//!
//! The interpreter that drives these lives in `application::dialogs`.

mod stack;
mod step;

pub use stack::{DialogFrame, DialogStack};
pub use step::{DialogValue, PromptOptions, StepResult};
