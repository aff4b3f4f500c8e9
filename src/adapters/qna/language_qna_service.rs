//! Language QnA Service - QnaService backed by Azure Language question answering.
//!
//! # Configuration
//!
//! ```ignore
//! let config = LanguageQnaConfig::new("https://my-resource.cognitiveservices.azure.com", key, "faq")
//!     .with_deployment("production")
//!     .with_top(3);
//!
//! let service = LanguageQnaService::new(config);
//! ```

use async_trait::async_trait;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::{ConfigError, QnaConfig, ValidationError};
use crate::ports::{AnswerResult, FollowUpPrompt, QnaAnswer, QnaError, QnaService};

const API_VERSION: &str = "2021-10-01";

/// Configuration for the Language QnA client.
#[derive(Debug, Clone)]
pub struct LanguageQnaConfig {
    /// Endpoint base URL, without trailing slash.
    pub endpoint: String,
    endpoint_key: Secret<String>,
    pub project_name: String,
    pub deployment_name: String,
    pub top: u32,
    pub score_threshold: f64,
    pub enable_precise_answer: bool,
    pub timeout: Duration,
}

impl LanguageQnaConfig {
    pub fn new(
        endpoint: impl Into<String>,
        endpoint_key: impl Into<String>,
        project_name: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            endpoint_key: Secret::new(endpoint_key.into()),
            project_name: project_name.into(),
            deployment_name: "production".to_string(),
            top: 3,
            score_threshold: 0.3,
            enable_precise_answer: false,
            timeout: Duration::from_secs(10),
        }
    }

    /// Builds client settings from application config.
    pub fn from_app_config(config: &QnaConfig) -> Result<Self, ConfigError> {
        let endpoint = config.endpoint_url().ok_or(ConfigError::ValidationFailed(
            ValidationError::MissingRequired("QNA__ENDPOINT_HOST_NAME"),
        ))?;
        let key = config.endpoint_key.clone().ok_or(ConfigError::ValidationFailed(
            ValidationError::MissingRequired("QNA__ENDPOINT_KEY"),
        ))?;
        let project = config.project_name.clone().ok_or(ConfigError::ValidationFailed(
            ValidationError::MissingRequired("QNA__PROJECT_NAME"),
        ))?;

        Ok(Self::new(endpoint, key, project)
            .with_deployment(config.deployment_name.clone())
            .with_top(config.top_answers)
            .with_score_threshold(config.score_threshold)
            .with_precise_answer(config.enable_precise_answer)
            .with_timeout(config.timeout()))
    }

    pub fn with_deployment(mut self, deployment: impl Into<String>) -> Self {
        self.deployment_name = deployment.into();
        self
    }

    pub fn with_top(mut self, top: u32) -> Self {
        self.top = top;
        self
    }

    pub fn with_score_threshold(mut self, threshold: f64) -> Self {
        self.score_threshold = threshold;
        self
    }

    pub fn with_precise_answer(mut self, enabled: bool) -> Self {
        self.enable_precise_answer = enabled;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn endpoint_key(&self) -> &str {
        self.endpoint_key.expose_secret()
    }
}

/// Azure Language question answering client.
pub struct LanguageQnaService {
    config: LanguageQnaConfig,
    client: Client,
}

impl LanguageQnaService {
    pub fn new(config: LanguageQnaConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { config, client }
    }

    fn query_url(&self) -> String {
        format!(
            "{}/language/:query-knowledgebases?projectName={}&deploymentName={}&api-version={}",
            self.config.endpoint, self.config.project_name, self.config.deployment_name, API_VERSION
        )
    }

    fn to_request<'a>(&self, question: &'a str) -> QueryRequest<'a> {
        QueryRequest {
            question,
            top: self.config.top,
            confidence_score_threshold: self.config.score_threshold,
            include_unstructured_sources: true,
            answer_span_request: self.config.enable_precise_answer.then(|| AnswerSpanRequest {
                enable: true,
                confidence_score_threshold: self.config.score_threshold,
                top_answers_with_span: 1,
            }),
        }
    }

    async fn handle_response_status(&self, response: Response) -> Result<Response, QnaError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let error_body = response.text().await.unwrap_or_default();

        match status.as_u16() {
            401 | 403 => Err(QnaError::AuthenticationFailed),
            500..=599 => Err(QnaError::Unavailable(format!(
                "Server error {}: {}",
                status, error_body
            ))),
            _ => Err(QnaError::InvalidResponse(format!(
                "Unexpected status {}: {}",
                status, error_body
            ))),
        }
    }
}

#[async_trait]
impl QnaService for LanguageQnaService {
    async fn query(&self, question: &str) -> Result<AnswerResult, QnaError> {
        tracing::debug!(project = %self.config.project_name, "Querying knowledge base");

        let response = self
            .client
            .post(self.query_url())
            .header("Ocp-Apim-Subscription-Key", self.config.endpoint_key())
            .json(&self.to_request(question))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    QnaError::Timeout {
                        timeout_secs: self.config.timeout.as_secs(),
                    }
                } else {
                    QnaError::Network(e.to_string())
                }
            })?;

        let response = self.handle_response_status(response).await?;

        let body: QueryResponse = response
            .json()
            .await
            .map_err(|e| QnaError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        Ok(body.into_answer_result())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Wire types
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    question: &'a str,
    top: u32,
    confidence_score_threshold: f64,
    include_unstructured_sources: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    answer_span_request: Option<AnswerSpanRequest>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AnswerSpanRequest {
    enable: bool,
    confidence_score_threshold: f64,
    top_answers_with_span: u32,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    answers: Vec<WireAnswer>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireAnswer {
    #[serde(default)]
    questions: Vec<String>,
    #[serde(default)]
    answer: String,
    #[serde(default)]
    confidence_score: f64,
    id: Option<i64>,
    dialog: Option<WireDialog>,
    answer_span: Option<WireAnswerSpan>,
}

#[derive(Debug, Deserialize)]
struct WireDialog {
    #[serde(default)]
    prompts: Vec<WirePrompt>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePrompt {
    #[serde(default)]
    display_order: i32,
    #[serde(default)]
    display_text: String,
}

#[derive(Debug, Deserialize)]
struct WireAnswerSpan {
    text: Option<String>,
}

impl QueryResponse {
    fn into_answer_result(self) -> AnswerResult {
        let answers = self
            .answers
            .into_iter()
            .map(|a| {
                let mut prompts: Vec<FollowUpPrompt> = a
                    .dialog
                    .map(|d| {
                        d.prompts
                            .into_iter()
                            .map(|p| FollowUpPrompt {
                                display_order: p.display_order,
                                display_text: p.display_text,
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                prompts.sort_by_key(|p| p.display_order);

                QnaAnswer {
                    id: a.id,
                    questions: a.questions,
                    answer: a.answer,
                    score: a.confidence_score,
                    precise_answer: a
                        .answer_span
                        .and_then(|s| s.text)
                        .filter(|t| !t.trim().is_empty()),
                    prompts,
                }
            })
            .collect();

        AnswerResult::new(answers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(precise: bool) -> LanguageQnaService {
        LanguageQnaService::new(
            LanguageQnaConfig::new("https://res.cognitiveservices.azure.com/", "key", "faq")
                .with_precise_answer(precise),
        )
    }

    #[test]
    fn query_url_includes_project_and_version() {
        let url = service(false).query_url();
        assert_eq!(
            url,
            "https://res.cognitiveservices.azure.com/language/:query-knowledgebases?projectName=faq&deploymentName=production&api-version=2021-10-01"
        );
    }

    #[test]
    fn request_omits_span_unless_precise() {
        let plain = serde_json::to_value(service(false).to_request("hi")).unwrap();
        assert!(plain.get("answerSpanRequest").is_none());
        assert_eq!(plain["confidenceScoreThreshold"], 0.3);

        let precise = serde_json::to_value(service(true).to_request("hi")).unwrap();
        assert_eq!(precise["answerSpanRequest"]["enable"], true);
    }

    #[test]
    fn parses_wire_response() {
        let body = r#"{
            "answers": [
                {
                    "questions": ["How do I reset my password?"],
                    "answer": "Use the reset link.",
                    "confidenceScore": 0.42,
                    "id": 7,
                    "dialog": {"isContextOnly": false, "prompts": [
                        {"displayOrder": 1, "qnaId": 9, "displayText": "Still locked out"},
                        {"displayOrder": 0, "qnaId": 8, "displayText": "Reset by phone"}
                    ]},
                    "answerSpan": {"text": "reset link", "confidenceScore": 0.3}
                },
                {"questions": [], "answer": "Other", "confidenceScore": 0.9}
            ]
        }"#;

        let parsed: QueryResponse = serde_json::from_str(body).unwrap();
        let result = parsed.into_answer_result();

        assert_eq!(result.answers[0].answer, "Other");
        let first = &result.answers[1];
        assert_eq!(first.id, Some(7));
        assert_eq!(first.precise_answer.as_deref(), Some("reset link"));
        assert_eq!(first.prompts[0].display_text, "Reset by phone");
    }

    #[test]
    fn from_app_config_requires_endpoint() {
        let result = LanguageQnaConfig::from_app_config(&QnaConfig::default());
        assert!(result.is_err());
    }

    #[test]
    fn from_app_config_maps_settings() {
        let app = QnaConfig {
            endpoint_host_name: Some("res.cognitiveservices.azure.com".to_string()),
            endpoint_key: Some("k".to_string()),
            project_name: Some("faq".to_string()),
            top_answers: 5,
            ..QnaConfig::default()
        };

        let config = LanguageQnaConfig::from_app_config(&app).unwrap();

        assert_eq!(config.endpoint, "https://res.cognitiveservices.azure.com");
        assert_eq!(config.top, 5);
    }
}
