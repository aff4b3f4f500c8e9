//! Escalation dispatcher - fans one payload out to every enabled channel.
//!
//! Channels run concurrently, each under its own timeout. A failing channel
//! is logged and never stops the others.

use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;

use crate::ports::{DispatchError, DispatchPayload, EscalationChannel};

/// Result of one channel's delivery attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum DeliveryStatus {
    Delivered,
    Skipped,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChannelOutcome {
    pub channel: String,
    pub status: DeliveryStatus,
}

impl ChannelOutcome {
    pub fn is_delivered(&self) -> bool {
        self.status == DeliveryStatus::Delivered
    }
}

pub struct EscalationDispatcher {
    channels: Vec<Arc<dyn EscalationChannel>>,
    timeout: Duration,
}

impl EscalationDispatcher {
    pub fn new(channels: Vec<Arc<dyn EscalationChannel>>, timeout: Duration) -> Self {
        Self { channels, timeout }
    }

    /// Names of channels that will be attempted.
    pub fn enabled_channels(&self) -> Vec<&str> {
        self.channels
            .iter()
            .filter(|c| c.is_enabled())
            .map(|c| c.name())
            .collect()
    }

    /// Delivers to every enabled channel, returning one outcome per channel
    /// in registration order.
    pub async fn dispatch(&self, payload: &DispatchPayload) -> Vec<ChannelOutcome> {
        let attempts = self.channels.iter().map(|channel| async move {
            let name = channel.name().to_string();

            if !channel.is_enabled() {
                tracing::debug!(channel = %name, "Escalation channel disabled, skipping");
                return ChannelOutcome {
                    channel: name,
                    status: DeliveryStatus::Skipped,
                };
            }

            let result = match tokio::time::timeout(self.timeout, channel.deliver(payload)).await {
                Ok(result) => result,
                Err(_) => Err(DispatchError::Timeout {
                    channel: name.clone(),
                    timeout_secs: self.timeout.as_secs(),
                }),
            };

            let status = match result {
                Ok(()) => {
                    tracing::info!(channel = %name, subject = %payload.subject, "Escalation delivered");
                    DeliveryStatus::Delivered
                }
                Err(e) => {
                    tracing::error!(channel = %name, error = %e, "Escalation delivery failed");
                    DeliveryStatus::Failed(e.to_string())
                }
            };

            ChannelOutcome {
                channel: name,
                status,
            }
        });

        join_all(attempts).await
    }
}
