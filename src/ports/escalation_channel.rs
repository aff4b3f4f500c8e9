//! Escalation Channel Port - Outbound transports that reach human agents.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// What every channel receives; each picks the shape it needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchPayload {
    pub html: String,
    pub channel_json: String,
    pub subject: String,
}

#[derive(Debug, Clone, Error)]
pub enum DispatchError {
    #[error("{channel} rejected the escalation with status {status}: {body}")]
    Rejected {
        channel: String,
        status: u16,
        body: String,
    },

    #[error("{channel} timed out after {timeout_secs}s")]
    Timeout { channel: String, timeout_secs: u64 },

    #[error("Network error on {channel}: {reason}")]
    Network { channel: String, reason: String },

    #[error("{channel} is misconfigured: {reason}")]
    Misconfigured { channel: String, reason: String },
}

/// Port for delivering one escalation to one destination.
#[async_trait]
pub trait EscalationChannel: Send + Sync {
    /// Short name used in logs and outcomes.
    fn name(&self) -> &str;

    /// Disabled channels are skipped without error.
    fn is_enabled(&self) -> bool;

    async fn deliver(&self, payload: &DispatchPayload) -> Result<(), DispatchError>;
}
