//! Webhook escalation configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Chat webhook escalation (e.g. a Teams incoming webhook).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookConfig {
    /// Target URL; the channel is disabled without it
    pub url: Option<String>,

    /// Optional HMAC-SHA256 signing secret
    pub signing_secret: Option<String>,
}

impl WebhookConfig {
    pub fn is_enabled(&self) -> bool {
        self.url.as_ref().is_some_and(|u| !u.is_empty())
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match self.url.as_deref() {
            Some(url) if !url.is_empty() => {
                if url.starts_with("https://") || url.starts_with("http://") {
                    Ok(())
                } else {
                    Err(ValidationError::InvalidWebhookUrl)
                }
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_url_disables_channel() {
        let config = WebhookConfig::default();
        assert!(!config.is_enabled());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_non_http_url() {
        let config = WebhookConfig {
            url: Some("ftp://example.com/hook".to_string()),
            signing_secret: None,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_https_url_enables_channel() {
        let config = WebhookConfig {
            url: Some("https://example.com/hook".to_string()),
            signing_secret: None,
        };
        assert!(config.is_enabled());
        assert!(config.validate().is_ok());
    }
}
