//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the core to external systems:
//! - `storage` - State storage (in-memory, YAML files)
//! - `qna` - Question answering (Azure Language, mock)
//! - `rendering` - Adaptive Card templates to card, HTML and channel JSON
//! - `escalation` - Agent-facing channels (email, webhook, recording)
//! - `http` - axum transport for inbound activities

pub mod escalation;
pub mod http;
pub mod qna;
pub mod rendering;
pub mod storage;

pub use escalation::{EmailChannel, RecordingChannel, WebhookChannel};
pub use qna::{LanguageQnaService, MockQnaService};
pub use rendering::TemplateCardRenderer;
pub use storage::{FileStateStorage, InMemoryStateStorage};
