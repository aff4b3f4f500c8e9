//! Errors raised while reading or checking `QNA_ESCALATION__*` settings.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not read settings: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Invalid settings: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// A setting that parsed but cannot work. Names are the env var suffix
/// after `QNA_ESCALATION__`.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{0} must be set")]
    MissingRequired(&'static str),

    #[error("SERVER__PORT must be non-zero")]
    InvalidPort,

    #[error("SERVER__HOST and SERVER__PORT do not form a socket address: {0}")]
    InvalidBindAddress(String),

    #[error("SERVER__REQUEST_TIMEOUT_SECS must be between 1 and 300")]
    InvalidTimeout,

    #[error("Escalation concurrency must be between 1 and 64")]
    InvalidConcurrency,

    #[error("Dispatch timeout must be between 1 and 300 seconds")]
    InvalidDispatchTimeout,

    #[error("Score threshold must be between 0.0 and 1.0")]
    InvalidScoreThreshold,

    #[error("Top answers must be between 1 and 10")]
    InvalidTopAnswers,

    #[error("Invalid QnA endpoint host name")]
    InvalidEndpointHost,

    #[error("Invalid Resend API key format")]
    InvalidResendKey,

    #[error("Invalid from email address")]
    InvalidFromEmail,

    #[error("Invalid escalation recipient: {0}")]
    InvalidRecipient(String),

    #[error("Webhook URL must use http or https")]
    InvalidWebhookUrl,

    #[error("Storage path cannot be empty")]
    EmptyStoragePath,
}
