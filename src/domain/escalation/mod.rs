//! Escalation domain: the ask-agent form and the report sent to agents.

mod form;
mod report;

pub use form::{EscalationForm, MalformedSubmission};
pub use report::{EscalationKind, EscalationReport, TRANSCRIPT_SUBJECT};
