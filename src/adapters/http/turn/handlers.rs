//! Handlers behind the Bot Framework messaging endpoint.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::application::pipeline::{TurnError, TurnPipeline};
use crate::domain::activity::Activity;

use super::dto::{ErrorResponse, HealthResponse, TurnResponse};

#[derive(Clone)]
pub struct TurnAppState {
    pipeline: Arc<TurnPipeline>,
}

impl TurnAppState {
    pub fn new(pipeline: Arc<TurnPipeline>) -> Self {
        Self { pipeline }
    }
}

/// `POST /api/messages`
pub async fn post_message(
    State(state): State<TurnAppState>,
    Json(activity): Json<Activity>,
) -> Response {
    match state.pipeline.process_turn(activity).await {
        Ok(outcome) => Json(TurnResponse::from(outcome.outbound)).into_response(),
        Err(e) => turn_error_response(e),
    }
}

/// `GET /health`
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

fn turn_error_response(error: TurnError) -> Response {
    let (status, body) = match error {
        TurnError::InvalidActivity(e) => {
            tracing::debug!(field = e.field(), "Rejected activity");
            (StatusCode::BAD_REQUEST, ErrorResponse::invalid_activity(&e))
        }
        TurnError::Persistence(e) => {
            tracing::error!(error = %e, "Turn aborted");
            (StatusCode::INTERNAL_SERVER_ERROR, ErrorResponse::turn_failed())
        }
    };
    (status, Json(body)).into_response()
}
