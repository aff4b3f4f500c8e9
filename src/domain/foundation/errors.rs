//! Validation errors for inbound identifiers.

use thiserror::Error;

/// An inbound activity is missing something every turn needs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Activity has no {0}")]
    MissingIdentifier(&'static str),

    #[error("Identifier {field} is too long ({len} > {max} bytes)")]
    IdentifierTooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },
}

impl ValidationError {
    /// Name of the activity field that failed.
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::MissingIdentifier(field) => field,
            ValidationError::IdentifierTooLong { field, .. } => field,
        }
    }
}
