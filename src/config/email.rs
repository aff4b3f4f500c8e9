//! Resend settings for the email escalation channel.

use serde::Deserialize;

use super::error::ValidationError;

/// Email delivery through Resend.
///
/// Leaving `resend_api_key` unset is not an error; the channel just reports
/// itself disabled and the dispatcher skips it.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    pub resend_api_key: Option<String>,
    pub from_email: String,
    pub from_name: String,

    /// Comma separated, blanks ignored
    pub recipients: Option<String>,

    pub base_url: String,
}

fn looks_like_address(value: &str) -> bool {
    matches!(value.split_once('@'), Some((local, domain)) if !local.is_empty() && !domain.is_empty())
}

impl EmailConfig {
    /// `Name <address>` as Resend expects in `from`.
    pub fn from_header(&self) -> String {
        format!("{} <{}>", self.from_name, self.from_email)
    }

    pub fn recipients_list(&self) -> Vec<String> {
        let Some(raw) = self.recipients.as_deref() else {
            return Vec::new();
        };
        raw.split(',')
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(String::from)
            .collect()
    }

    fn api_key(&self) -> Option<&str> {
        self.resend_api_key.as_deref().filter(|k| !k.is_empty())
    }

    pub fn is_enabled(&self) -> bool {
        self.api_key().is_some() && !self.recipients_list().is_empty()
    }

    /// Only checked once a key is present.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let Some(key) = self.api_key() else {
            return Ok(());
        };
        if !key.starts_with("re_") {
            return Err(ValidationError::InvalidResendKey);
        }
        if !looks_like_address(&self.from_email) {
            return Err(ValidationError::InvalidFromEmail);
        }
        match self
            .recipients_list()
            .into_iter()
            .find(|r| !looks_like_address(r))
        {
            Some(bad) => Err(ValidationError::InvalidRecipient(bad)),
            None => Ok(()),
        }
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            resend_api_key: None,
            from_email: "noreply@example.com".into(),
            from_name: "QnA Bot".into(),
            recipients: None,
            base_url: "https://api.resend.com".into(),
        }
    }
}
