//! Health Routes
//!
//! Health check endpoints for monitoring and Kubernetes probes.
//!
//! - GET /health/live - Liveness probe (process is alive)
//! - GET /health/ready - Readiness probe (queries are accepted)
//! - GET /health - Full health status

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::api::dto::HealthResponse;
use crate::api::state::AppState;
use crate::service::{ReadyState, VERSION};

/// GET /health/live
///
/// Returns 200 if the process is alive, no dependency checks.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// GET /health/ready
///
/// Follows the query readiness gate: 503 until storage has been seeded.
pub async fn readiness(State(state): State<Arc<AppState>>) -> StatusCode {
    if state.service.readiness().is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// GET /health
pub async fn full_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let ready_state = state.service.readiness().state();
    let (status, query_state) = match ready_state {
        ReadyState::Ready => ("healthy", "ready"),
        ReadyState::NotReady => ("starting", "not_ready"),
    };

    Json(HealthResponse {
        status: status.to_string(),
        query_state: query_state.to_string(),
        uptime_seconds: state.uptime_seconds(),
        version: VERSION.to_string(),
        timezone: state.service.timezone_name(),
    })
}
