//! QnA backend configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// QnA backend configuration (Azure Language question answering)
#[derive(Debug, Clone, Deserialize)]
pub struct QnaConfig {
    /// Which backend answers questions
    #[serde(default)]
    pub backend: QnaBackend,

    /// Language resource host, e.g. `my-resource.cognitiveservices.azure.com`
    pub endpoint_host_name: Option<String>,

    /// Language resource key
    pub endpoint_key: Option<String>,

    /// Question answering project name
    pub project_name: Option<String>,

    /// Project deployment to query
    #[serde(default = "default_deployment")]
    pub deployment_name: String,

    /// Minimum confidence for an answer to be shown
    #[serde(default = "default_score_threshold")]
    pub score_threshold: f64,

    /// Number of candidate answers requested
    #[serde(default = "default_top_answers")]
    pub top_answers: u32,

    /// Ask the backend for short precise answers
    #[serde(default)]
    pub enable_precise_answer: bool,

    /// Show only the precise answer, not the full passage
    #[serde(default)]
    pub display_precise_answer_only: bool,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

/// QnA backend kind
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum QnaBackend {
    #[default]
    Language,
    /// Answers nothing; useful for local runs of the escalation flow
    Mock,
}

impl QnaConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Base URL of the Language endpoint
    pub fn endpoint_url(&self) -> Option<String> {
        self.endpoint_host_name.as_ref().map(|host| {
            if host.starts_with("http://") || host.starts_with("https://") {
                host.trim_end_matches('/').to_string()
            } else {
                format!("https://{}", host.trim_end_matches('/'))
            }
        })
    }

    /// Validate QnA configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(0.0..=1.0).contains(&self.score_threshold) {
            return Err(ValidationError::InvalidScoreThreshold);
        }
        if self.top_answers == 0 || self.top_answers > 10 {
            return Err(ValidationError::InvalidTopAnswers);
        }
        if self.backend == QnaBackend::Mock {
            return Ok(());
        }

        match self.endpoint_host_name.as_deref() {
            None | Some("") => {
                return Err(ValidationError::MissingRequired("QNA__ENDPOINT_HOST_NAME"))
            }
            Some(host) if host.contains(char::is_whitespace) => {
                return Err(ValidationError::InvalidEndpointHost)
            }
            _ => {}
        }
        if self.endpoint_key.as_ref().map_or(true, |k| k.is_empty()) {
            return Err(ValidationError::MissingRequired("QNA__ENDPOINT_KEY"));
        }
        if self.project_name.as_ref().map_or(true, |p| p.is_empty()) {
            return Err(ValidationError::MissingRequired("QNA__PROJECT_NAME"));
        }
        Ok(())
    }
}

impl Default for QnaConfig {
    fn default() -> Self {
        Self {
            backend: QnaBackend::default(),
            endpoint_host_name: None,
            endpoint_key: None,
            project_name: None,
            deployment_name: default_deployment(),
            score_threshold: default_score_threshold(),
            top_answers: default_top_answers(),
            enable_precise_answer: false,
            display_precise_answer_only: false,
            timeout_secs: default_timeout(),
        }
    }
}

fn default_deployment() -> String {
    "production".to_string()
}

fn default_score_threshold() -> f64 {
    0.3
}

fn default_top_answers() -> u32 {
    3
}

fn default_timeout() -> u64 {
    10
}
