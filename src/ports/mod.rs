//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the turn-processing core and the outside world. Adapters implement them.
//!
//! - `StateStorage` - Durable per-key state (dialog stacks, feedback)
//! - `QnaService` - Question-answering backend
//! - `CardRenderer` - Template rendering into card, HTML and channel JSON
//! - `EscalationChannel` - Email, webhook and other agent-facing transports

mod card_renderer;
mod escalation_channel;
mod qna_service;
mod state_storage;

pub use card_renderer::{templates, CardRenderer, RenderError, RenderedPayload};
pub use escalation_channel::{DispatchError, DispatchPayload, EscalationChannel};
pub use qna_service::{AnswerResult, FollowUpPrompt, QnaAnswer, QnaError, QnaService};
pub use state_storage::{load_or_default, to_entry, StateStorage, StateStorageError};
