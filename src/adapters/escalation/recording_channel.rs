//! Recording Channel - In-memory EscalationChannel for tests and dry runs.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::ports::{DispatchError, DispatchPayload, EscalationChannel};

/// How a recording channel responds to deliveries.
#[derive(Debug, Clone)]
enum Behavior {
    Accept,
    Reject(u16),
    Hang(Duration),
}

/// Captures every delivered payload.
#[derive(Debug, Clone)]
pub struct RecordingChannel {
    name: String,
    enabled: bool,
    behavior: Behavior,
    delivered: Arc<Mutex<Vec<DispatchPayload>>>,
}

impl RecordingChannel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            behavior: Behavior::Accept,
            delivered: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A channel that reports itself disabled.
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Every delivery fails with the given status.
    pub fn rejecting(mut self, status: u16) -> Self {
        self.behavior = Behavior::Reject(status);
        self
    }

    /// Every delivery sleeps before succeeding.
    pub fn hanging(mut self, delay: Duration) -> Self {
        self.behavior = Behavior::Hang(delay);
        self
    }

    /// Payloads delivered so far.
    pub fn delivered(&self) -> Vec<DispatchPayload> {
        self.delivered
            .lock()
            .map(|d| d.clone())
            .unwrap_or_default()
    }

    pub fn delivery_count(&self) -> usize {
        self.delivered.lock().map(|d| d.len()).unwrap_or(0)
    }

    fn record(&self, payload: &DispatchPayload) {
        if let Ok(mut delivered) = self.delivered.lock() {
            delivered.push(payload.clone());
        }
    }
}

#[async_trait]
impl EscalationChannel for RecordingChannel {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    async fn deliver(&self, payload: &DispatchPayload) -> Result<(), DispatchError> {
        match &self.behavior {
            Behavior::Accept => {
                self.record(payload);
                Ok(())
            }
            Behavior::Reject(status) => Err(DispatchError::Rejected {
                channel: self.name.clone(),
                status: *status,
                body: "rejected by recording channel".to_string(),
            }),
            Behavior::Hang(delay) => {
                tokio::time::sleep(*delay).await;
                self.record(payload);
                Ok(())
            }
        }
    }
}
