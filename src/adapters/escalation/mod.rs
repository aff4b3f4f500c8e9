//! Escalation Adapters
//!
//! Implementations of the EscalationChannel port.
//!
//! ## Available Adapters
//!
//! - **EmailChannel** - Sends the HTML card through Resend
//! - **WebhookChannel** - Posts the channel JSON to a chat webhook
//! - **RecordingChannel** - Captures payloads in memory (testing/dry runs)

mod email_channel;
mod recording_channel;
mod webhook_channel;

pub use email_channel::{EmailChannel, EmailChannelConfig};
pub use recording_channel::RecordingChannel;
pub use webhook_channel::{sign_body, WebhookChannel, WebhookChannelConfig, SIGNATURE_HEADER};
