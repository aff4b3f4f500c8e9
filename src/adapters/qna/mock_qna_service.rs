//! Mock QnA Service for testing.
//!
//! Answers from a small in-memory knowledge base, or from queued responses
//! when a test needs a specific sequence (including errors).
//!
//! # Example
//!
//! ```ignore
//! let qna = MockQnaService::new()
//!     .with_answer("how do i reset my password", QnaAnswer::new("Use the reset link.", 0.9));
//!
//! let result = qna.query("How do I reset my password").await?;
//! ```

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use crate::ports::{AnswerResult, QnaAnswer, QnaError, QnaService};

/// Mock QnA backend.
#[derive(Debug, Clone, Default)]
pub struct MockQnaService {
    knowledge_base: Arc<Mutex<HashMap<String, Vec<QnaAnswer>>>>,
    queued: Arc<Mutex<VecDeque<Result<AnswerResult, QnaError>>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

fn normalize(question: &str) -> String {
    question
        .trim()
        .trim_end_matches('?')
        .to_lowercase()
}

impl MockQnaService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a candidate answer for a question (case and trailing `?` ignored).
    pub fn with_answer(self, question: &str, answer: QnaAnswer) -> Self {
        if let Ok(mut kb) = self.knowledge_base.lock() {
            kb.entry(normalize(question)).or_default().push(answer);
        }
        self
    }

    /// Queues a response returned before the knowledge base is consulted.
    pub fn with_response(self, response: Result<AnswerResult, QnaError>) -> Self {
        if let Ok(mut queued) = self.queued.lock() {
            queued.push_back(response);
        }
        self
    }

    /// Queues an error.
    pub fn with_error(self, error: QnaError) -> Self {
        self.with_response(Err(error))
    }

    /// Questions asked so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }
}

#[async_trait]
impl QnaService for MockQnaService {
    async fn query(&self, question: &str) -> Result<AnswerResult, QnaError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(question.to_string());
        }

        if let Some(queued) = self.queued.lock().ok().and_then(|mut q| q.pop_front()) {
            return queued;
        }

        let answers = self
            .knowledge_base
            .lock()
            .ok()
            .and_then(|kb| kb.get(&normalize(question)).cloned())
            .unwrap_or_default();

        Ok(AnswerResult::new(answers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn answers_from_knowledge_base() {
        let qna = MockQnaService::new().with_answer("What is X?", QnaAnswer::new("X is Y", 0.8));

        let result = qna.query("  what is x ").await.unwrap();

        assert_eq!(result.answers.len(), 1);
        assert_eq!(result.answers[0].answer, "X is Y");
        assert_eq!(qna.calls(), vec!["  what is x "]);
    }

    #[tokio::test]
    async fn unknown_question_has_no_answers() {
        let qna = MockQnaService::new();
        assert!(qna.query("anything").await.unwrap().answers.is_empty());
    }

    #[tokio::test]
    async fn queued_responses_come_first() {
        let qna = MockQnaService::new()
            .with_answer("q", QnaAnswer::new("kb", 0.9))
            .with_error(QnaError::Timeout { timeout_secs: 10 });

        assert!(matches!(
            qna.query("q").await,
            Err(QnaError::Timeout { timeout_secs: 10 })
        ));
        assert_eq!(qna.query("q").await.unwrap().answers[0].answer, "kb");
        assert_eq!(qna.call_count(), 2);
    }
}
