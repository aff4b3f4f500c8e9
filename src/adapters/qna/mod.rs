//! QnA Adapters
//!
//! Implementations of the QnaService port.
//!
//! - **LanguageQnaService** - Azure Language question answering over HTTP
//! - **MockQnaService** - In-memory knowledge base (testing/development)

mod language_qna_service;
mod mock_qna_service;

pub use language_qna_service::{LanguageQnaConfig, LanguageQnaService};
pub use mock_qna_service::MockQnaService;
