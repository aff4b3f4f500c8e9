//! HTTP routes for the turn endpoint.

use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use super::handlers::{health, post_message, TurnAppState};

/// Turn and health routes, without middleware.
pub fn turn_routes(state: TurnAppState) -> Router {
    Router::new()
        .route("/api/messages", post(post_message))
        .route("/health", get(health))
        .with_state(state)
}

/// Full application router with request tracing and a request timeout.
pub fn app_router(state: TurnAppState, request_timeout: Duration) -> Router {
    turn_routes(state)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
}
