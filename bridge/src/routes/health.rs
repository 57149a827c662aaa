//! Health check endpoint.
//!
//! Not behind the bearer-token gate, so load balancers can poll it. Reports
//! the write dispatcher counters alongside the service identity.

use crate::state::AppState;
use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use shared::dispatch::DispatchStats;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status (always "healthy" if reachable).
    pub status: &'static str,
    /// Service name.
    pub service: &'static str,
    /// Service version.
    pub version: &'static str,
    /// Write dispatcher counters.
    pub dispatch: DispatchStats,
}

/// Creates the health check routes.
pub fn health_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .with_state(state)
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "otelflux",
        version: env!("CARGO_PKG_VERSION"),
        dispatch: state.dispatcher().stats(),
    })
}
