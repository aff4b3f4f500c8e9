//! Email Channel - Delivers escalations through the Resend HTTP API.
//!
//! # Configuration
//!
//! ```ignore
//! let config = EmailChannelConfig::new(api_key, "QnA Bot <noreply@example.com>")
//!     .with_recipients(vec!["support@example.com".to_string()]);
//!
//! let channel = EmailChannel::new(config);
//! ```

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::Serialize;
use std::time::Duration;

use crate::config::EmailConfig;
use crate::ports::{DispatchError, DispatchPayload, EscalationChannel};

const CHANNEL_NAME: &str = "email";

/// Configuration for the email channel.
#[derive(Debug, Clone)]
pub struct EmailChannelConfig {
    api_key: Option<Secret<String>>,
    /// Formatted sender, e.g. `QnA Bot <noreply@example.com>`.
    pub from: String,
    pub recipients: Vec<String>,
    /// Base URL for the API (default: https://api.resend.com).
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl EmailChannelConfig {
    pub fn new(api_key: impl Into<String>, from: impl Into<String>) -> Self {
        let api_key: String = api_key.into();
        Self {
            api_key: (!api_key.is_empty()).then(|| Secret::new(api_key)),
            from: from.into(),
            recipients: Vec::new(),
            base_url: "https://api.resend.com".to_string(),
            timeout: Duration::from_secs(15),
        }
    }

    /// Builds the channel settings from application config.
    pub fn from_app_config(config: &EmailConfig) -> Self {
        Self::new(
            config.resend_api_key.clone().unwrap_or_default(),
            config.from_header(),
        )
        .with_recipients(config.recipients_list())
        .with_base_url(config.base_url.clone())
    }

    pub fn with_recipients(mut self, recipients: Vec<String>) -> Self {
        self.recipients = recipients;
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn api_key(&self) -> Option<&str> {
        self.api_key.as_ref().map(|k| k.expose_secret().as_str())
    }
}

/// Resend email request body.
#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: &'a [String],
    subject: &'a str,
    html: &'a str,
}

/// Sends the rendered HTML card as an email.
pub struct EmailChannel {
    config: EmailChannelConfig,
    client: Client,
}

impl EmailChannel {
    pub fn new(config: EmailChannelConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { config, client }
    }

    fn emails_url(&self) -> String {
        format!("{}/emails", self.config.base_url)
    }

    fn request_body<'a>(&'a self, payload: &'a DispatchPayload) -> SendEmailRequest<'a> {
        SendEmailRequest {
            from: &self.config.from,
            to: &self.config.recipients,
            subject: &payload.subject,
            html: &payload.html,
        }
    }
}

#[async_trait]
impl EscalationChannel for EmailChannel {
    fn name(&self) -> &str {
        CHANNEL_NAME
    }

    fn is_enabled(&self) -> bool {
        self.config.api_key().is_some() && !self.config.recipients.is_empty()
    }

    async fn deliver(&self, payload: &DispatchPayload) -> Result<(), DispatchError> {
        let api_key = self
            .config
            .api_key()
            .ok_or_else(|| DispatchError::Misconfigured {
                channel: CHANNEL_NAME.to_string(),
                reason: "missing API key".to_string(),
            })?;

        tracing::info!(
            recipients = self.config.recipients.len(),
            subject = %payload.subject,
            "Sending escalation email"
        );

        let response = self
            .client
            .post(self.emails_url())
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&self.request_body(payload))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DispatchError::Timeout {
                        channel: CHANNEL_NAME.to_string(),
                        timeout_secs: self.config.timeout.as_secs(),
                    }
                } else {
                    DispatchError::Network {
                        channel: CHANNEL_NAME.to_string(),
                        reason: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DispatchError::Rejected {
                channel: CHANNEL_NAME.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(status = status.as_u16(), "Escalation email accepted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> DispatchPayload {
        DispatchPayload {
            html: "<p>transcript</p>".to_string(),
            channel_json: "{}".to_string(),
            subject: "Escalation Chat Transcript".to_string(),
        }
    }

    fn enabled_config() -> EmailChannelConfig {
        EmailChannelConfig::new("re_test", "Bot <bot@example.com>")
            .with_recipients(vec!["agent@example.com".to_string()])
    }

    #[test]
    fn enabled_with_key_and_recipients() {
        assert!(EmailChannel::new(enabled_config()).is_enabled());
    }

    #[test]
    fn disabled_without_key() {
        let config = EmailChannelConfig::new("", "Bot <bot@example.com>")
            .with_recipients(vec!["agent@example.com".to_string()]);
        assert!(!EmailChannel::new(config).is_enabled());
    }

    #[test]
    fn disabled_without_recipients() {
        let config = EmailChannelConfig::new("re_test", "Bot <bot@example.com>");
        assert!(!EmailChannel::new(config).is_enabled());
    }

    #[test]
    fn from_app_config_splits_recipients() {
        let app = EmailConfig {
            resend_api_key: Some("re_abc".to_string()),
            recipients: Some("a@example.com, b@example.com".to_string()),
            ..EmailConfig::default()
        };

        let config = EmailChannelConfig::from_app_config(&app);

        assert_eq!(config.recipients, vec!["a@example.com", "b@example.com"]);
        assert_eq!(config.from, app.from_header());
    }

    #[test]
    fn request_body_carries_html_and_subject() {
        let channel = EmailChannel::new(enabled_config().with_base_url("http://localhost:9/"));
        let payload = payload();

        let body = serde_json::to_value(channel.request_body(&payload)).unwrap();

        assert_eq!(body["to"][0], "agent@example.com");
        assert_eq!(body["subject"], "Escalation Chat Transcript");
        assert_eq!(body["html"], "<p>transcript</p>");
        assert_eq!(channel.emails_url(), "http://localhost:9/emails");
    }

    #[tokio::test]
    async fn deliver_without_key_is_misconfigured() {
        let channel = EmailChannel::new(EmailChannelConfig::new("", "Bot <bot@example.com>"));

        let result = channel.deliver(&payload()).await;

        assert!(matches!(result, Err(DispatchError::Misconfigured { .. })));
    }
}
