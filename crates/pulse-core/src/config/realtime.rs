//! Connection and fan-out configuration.

use serde::{Deserialize, Serialize};

/// Real-time connection and delivery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Bounded per-connection outbound queue length. When full, the newest
    /// message is dropped and a warning logged.
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer_size: usize,
    /// Maximum channel subscriptions per connection.
    #[serde(default = "default_max_subscriptions")]
    pub max_subscriptions_per_connection: usize,
    /// Maximum concurrent connections per user.
    #[serde(default = "default_max_connections_per_user")]
    pub max_connections_per_user: usize,
    /// WebSocket ping interval in seconds.
    #[serde(default = "default_ping_interval")]
    pub ping_interval_seconds: u64,
    /// Missed-pong timeout in seconds before a connection is torn down.
    #[serde(default = "default_ping_timeout")]
    pub ping_timeout_seconds: u64,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            outbound_buffer_size: default_outbound_buffer(),
            max_subscriptions_per_connection: default_max_subscriptions(),
            max_connections_per_user: default_max_connections_per_user(),
            ping_interval_seconds: default_ping_interval(),
            ping_timeout_seconds: default_ping_timeout(),
        }
    }
}

fn default_outbound_buffer() -> usize {
    256
}

fn default_max_subscriptions() -> usize {
    50
}

fn default_max_connections_per_user() -> usize {
    5
}

fn default_ping_interval() -> u64 {
    30
}

fn default_ping_timeout() -> u64 {
    60
}
