//! # pulse-api
//!
//! HTTP surface for the Pulse gateway built on Axum.
//!
//! Provides the WebSocket upgrade endpoint, health/readiness probes,
//! CORS middleware, and error mapping.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use router::build_router;
pub use state::AppState;
