//! Health and readiness handlers.
//!
//! Liveness always reports `ok` while the process runs. Readiness tracks
//! the broker connection: a gateway that cannot route events reports
//! not-ready so orchestration stops sending it new connections, but
//! existing connections are left open.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Serialize;

use pulse_realtime::metrics::MetricsSnapshot;

use crate::state::AppState;

/// Liveness response body.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Process status.
    pub status: String,
    /// Crate version.
    pub version: String,
}

/// Readiness response body.
#[derive(Debug, Clone, Serialize)]
pub struct ReadinessResponse {
    /// `ready` or `not_ready`.
    pub status: String,
    /// Broker connection state.
    pub broker: String,
}

/// Detailed health response body.
#[derive(Debug, Clone, Serialize)]
pub struct DetailedHealthResponse {
    /// Process status.
    pub status: String,
    /// Broker connection state.
    pub broker: String,
    /// Live connection count.
    pub connections: usize,
    /// Unique connected users.
    pub users: usize,
    /// Live subscription count.
    pub subscriptions: usize,
    /// Counter snapshot.
    pub metrics: MetricsSnapshot,
}

/// GET /api/health — liveness.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /api/health/ready — readiness including broker state.
pub async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<ReadinessResponse>) {
    let ready = state.gateway.is_ready();
    let response = ReadinessResponse {
        status: if ready { "ready" } else { "not_ready" }.to_string(),
        broker: if ready { "connected" } else { "disconnected" }.to_string(),
    };
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(response))
}

/// GET /api/health/detailed — counts and counters.
pub async fn health_detailed(State(state): State<AppState>) -> Json<DetailedHealthResponse> {
    Json(DetailedHealthResponse {
        status: "ok".to_string(),
        broker: if state.gateway.is_ready() {
            "connected"
        } else {
            "disconnected"
        }
        .to_string(),
        connections: state.gateway.connections.connection_count(),
        users: state.gateway.connections.user_count(),
        subscriptions: state.gateway.registry.total_subscriptions(),
        metrics: state.gateway.metrics.snapshot(),
    })
}
