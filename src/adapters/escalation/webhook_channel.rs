//! Webhook Channel - Posts the card's channel JSON to a chat webhook.
//!
//! When a signing secret is configured each request carries
//! `X-Signature-256: sha256=<hex>`, an HMAC-SHA256 of the raw body.

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use sha2::Sha256;
use std::time::Duration;

use crate::config::WebhookConfig;
use crate::ports::{DispatchError, DispatchPayload, EscalationChannel};

type HmacSha256 = Hmac<Sha256>;

const CHANNEL_NAME: &str = "webhook";
pub const SIGNATURE_HEADER: &str = "X-Signature-256";

/// Configuration for the webhook channel.
#[derive(Debug, Clone)]
pub struct WebhookChannelConfig {
    pub url: Option<String>,
    signing_secret: Option<Secret<String>>,
    pub timeout: Duration,
}

impl WebhookChannelConfig {
    pub fn new(url: Option<String>) -> Self {
        Self {
            url: url.filter(|u| !u.is_empty()),
            signing_secret: None,
            timeout: Duration::from_secs(15),
        }
    }

    pub fn from_app_config(config: &WebhookConfig) -> Self {
        let mut channel = Self::new(config.url.clone());
        if let Some(secret) = config.signing_secret.clone() {
            channel = channel.with_signing_secret(secret);
        }
        channel
    }

    pub fn with_signing_secret(mut self, secret: impl Into<String>) -> Self {
        let secret: String = secret.into();
        self.signing_secret = (!secret.is_empty()).then(|| Secret::new(secret));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Signs a body with the shared secret, hex encoded.
pub fn sign_body(secret: &str, body: &str) -> Result<String, DispatchError> {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|e| DispatchError::Misconfigured {
            channel: CHANNEL_NAME.to_string(),
            reason: e.to_string(),
        })?;
    mac.update(body.as_bytes());
    Ok(format!("sha256={}", hex::encode(mac.finalize().into_bytes())))
}

/// Delivers the channel JSON envelope to a webhook URL.
pub struct WebhookChannel {
    config: WebhookChannelConfig,
    client: Client,
}

impl WebhookChannel {
    pub fn new(config: WebhookChannelConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { config, client }
    }
}

#[async_trait]
impl EscalationChannel for WebhookChannel {
    fn name(&self) -> &str {
        CHANNEL_NAME
    }

    fn is_enabled(&self) -> bool {
        self.config.url.is_some()
    }

    async fn deliver(&self, payload: &DispatchPayload) -> Result<(), DispatchError> {
        let url = self
            .config
            .url
            .as_deref()
            .ok_or_else(|| DispatchError::Misconfigured {
                channel: CHANNEL_NAME.to_string(),
                reason: "missing webhook URL".to_string(),
            })?;

        tracing::info!(subject = %payload.subject, "Posting escalation to webhook");

        let mut request = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .body(payload.channel_json.clone());

        if let Some(secret) = &self.config.signing_secret {
            request = request.header(
                SIGNATURE_HEADER,
                sign_body(secret.expose_secret(), &payload.channel_json)?,
            );
        }

        let response = request.send().await.map_err(|e| {
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

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_without_url() {
        assert!(!WebhookChannel::new(WebhookChannelConfig::new(None)).is_enabled());
        assert!(!WebhookChannel::new(WebhookChannelConfig::new(Some(String::new()))).is_enabled());
    }

    #[test]
    fn enabled_with_url() {
        let config = WebhookChannelConfig::new(Some("https://hooks.example.com/x".to_string()));
        assert!(WebhookChannel::new(config).is_enabled());
    }

    #[test]
    fn signature_matches_known_vector() {
        // RFC 4231 test case 2
        let signature = sign_body("Jefe", "what do ya want for nothing?").unwrap();
        assert_eq!(
            signature,
            "sha256=5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn from_app_config_keeps_secret() {
        let app = WebhookConfig {
            url: Some("https://hooks.example.com/x".to_string()),
            signing_secret: Some("s3cret".to_string()),
        };

        let config = WebhookChannelConfig::from_app_config(&app);

        assert!(config.signing_secret.is_some());
        assert_eq!(config.url.as_deref(), Some("https://hooks.example.com/x"));
    }

    #[tokio::test]
    async fn deliver_without_url_is_misconfigured() {
        let channel = WebhookChannel::new(WebhookChannelConfig::new(None));
        let payload = DispatchPayload {
            html: String::new(),
            channel_json: "{}".to_string(),
            subject: "s".to_string(),
        };

        let result = channel.deliver(&payload).await;

        assert!(matches!(result, Err(DispatchError::Misconfigured { .. })));
    }
}
