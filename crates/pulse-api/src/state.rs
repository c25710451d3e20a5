//! Application state shared across all handlers.

use std::sync::Arc;

use pulse_core::config::GatewayConfig;
use pulse_realtime::connection::authenticator::ConnectionAuthenticator;
use pulse_realtime::server::RealtimeGateway;

/// Application state passed to every Axum handler via `State<AppState>`.
///
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Gateway configuration.
    pub config: Arc<GatewayConfig>,
    /// Real-time gateway engine.
    pub gateway: Arc<RealtimeGateway>,
    /// Connection authenticator.
    pub authenticator: Arc<ConnectionAuthenticator>,
}
