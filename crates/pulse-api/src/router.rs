//! Route definitions for the gateway HTTP surface.

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware::build_cors_layer;
use crate::state::AppState;

/// Builds the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = build_cors_layer(&state.config.server.cors);

    Router::new()
        .route("/ws", get(handlers::ws::ws_upgrade))
        .route("/api/health", get(handlers::health::health))
        .route("/api/health/ready", get(handlers::health::readiness))
        .route("/api/health/detailed", get(handlers::health::health_detailed))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
