//! Settings for the escalation bot, read from `QNA_ESCALATION__*`.
//!
//! Nested keys use `__`, so `QNA_ESCALATION__BOT__STATE_SCOPE=user` sets
//! `bot.state_scope`. A `.env` file in the working directory is honoured.
//!
//! ```no_run
//! use qna_escalation::config::AppConfig;
//!
//! let config = AppConfig::load().expect("settings");
//! config.validate().expect("usable settings");
//! ```

mod bot;
mod email;
mod error;
mod qna;
mod server;
mod storage;
mod webhook;

pub use bot::{BotConfig, StateScope};
pub use email::EmailConfig;
pub use error::{ConfigError, ValidationError};
pub use qna::{QnaBackend, QnaConfig};
pub use server::{Environment, ServerConfig};
pub use storage::{StorageBackend, StorageConfig};
pub use webhook::WebhookConfig;

use serde::Deserialize;

/// Every section defaults, so a bare environment still loads. It does not
/// validate: the Language backend needs its endpoint settings, or
/// `QNA__BACKEND=mock`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub bot: BotConfig,
    pub qna: QnaConfig,
    pub email: EmailConfig,
    pub webhook: WebhookConfig,
    pub storage: StorageConfig,
}

impl AppConfig {
    /// Reads `.env` (if any) then the process environment.
    ///
    /// Only parse failures are reported here; call [`AppConfig::validate`]
    /// before wiring adapters.
    pub fn load() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let source = config::Environment::default()
            .prefix("QNA_ESCALATION")
            .prefix_separator("__")
            .separator("__");

        Ok(config::Config::builder()
            .add_source(source)
            .build()?
            .try_deserialize()?)
    }

    /// First section that cannot work wins.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.bot.validate()?;
        self.qna.validate()?;
        self.email.validate()?;
        self.webhook.validate()?;
        self.storage.validate()
    }

    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
