//! Wire shapes for the turn endpoint.

use serde::Serialize;

use crate::domain::activity::Activity;
use crate::domain::foundation::ValidationError;

/// Body of a successful `POST /api/messages`.
#[derive(Debug, Clone, Serialize)]
pub struct TurnResponse {
    pub activities: Vec<Activity>,
}

impl From<Vec<Activity>> for TurnResponse {
    fn from(activities: Vec<Activity>) -> Self {
        Self { activities }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Error body. `field` names the activity property that was rejected.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<&'static str>,
}

impl ErrorResponse {
    pub fn invalid_activity(error: &ValidationError) -> Self {
        Self {
            code: "INVALID_ACTIVITY",
            message: error.to_string(),
            field: Some(error.field()),
        }
    }

    pub fn turn_failed() -> Self {
        Self {
            code: "TURN_FAILED",
            message: "Failed to process message".to_string(),
            field: None,
        }
    }
}
