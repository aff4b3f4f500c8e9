//! QnA Service Port - Interface to the question-answering backend.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Follow-up question suggested alongside an answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowUpPrompt {
    pub display_order: i32,
    pub display_text: String,
}

/// One candidate answer. Scores are in `0.0..=1.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QnaAnswer {
    pub id: Option<i64>,
    /// Knowledge-base questions this answer belongs to.
    pub questions: Vec<String>,
    pub answer: String,
    pub score: f64,
    /// Short span extracted from the answer when precise answering is on.
    pub precise_answer: Option<String>,
    pub prompts: Vec<FollowUpPrompt>,
}

impl QnaAnswer {
    pub fn new(answer: impl Into<String>, score: f64) -> Self {
        Self {
            id: None,
            questions: Vec::new(),
            answer: answer.into(),
            score,
            precise_answer: None,
            prompts: Vec::new(),
        }
    }

    pub fn with_question(mut self, question: impl Into<String>) -> Self {
        self.questions.push(question.into());
        self
    }

    pub fn with_prompt(mut self, display_text: impl Into<String>) -> Self {
        let display_order = self.prompts.len() as i32;
        self.prompts.push(FollowUpPrompt {
            display_order,
            display_text: display_text.into(),
        });
        self
    }

    pub fn with_precise_answer(mut self, precise: impl Into<String>) -> Self {
        self.precise_answer = Some(precise.into());
        self
    }

    /// Label used when this answer is offered as a suggestion.
    pub fn suggestion_title(&self) -> &str {
        self.questions
            .first()
            .map(String::as_str)
            .unwrap_or(self.answer.as_str())
    }
}

/// Ranked answers, best first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnswerResult {
    pub answers: Vec<QnaAnswer>,
}

impl AnswerResult {
    pub fn new(mut answers: Vec<QnaAnswer>) -> Self {
        answers.sort_by(|a, b| b.score.total_cmp(&a.score));
        Self { answers }
    }

    /// Answers at or above the threshold, best first.
    pub fn above(&self, threshold: f64) -> Vec<QnaAnswer> {
        self.answers
            .iter()
            .filter(|a| a.score >= threshold)
            .cloned()
            .collect()
    }
}

/// Errors from the QnA backend.
#[derive(Debug, Clone, Error)]
pub enum QnaError {
    #[error("QnA backend authentication failed")]
    AuthenticationFailed,

    #[error("QnA request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("QnA backend unavailable: {0}")]
    Unavailable(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid QnA response: {0}")]
    InvalidResponse(String),
}

/// Port for asking the knowledge base a question.
#[async_trait]
pub trait QnaService: Send + Sync {
    async fn query(&self, question: &str) -> Result<AnswerResult, QnaError>;
}
