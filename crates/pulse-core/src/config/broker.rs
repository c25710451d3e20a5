//! Event broker configuration.

use serde::{Deserialize, Serialize};

/// Which event bus implementation to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrokerProvider {
    /// Shared Redis broker — required for multi-instance deployments.
    Redis,
    /// In-process broker — single instance and tests only.
    Memory,
}

/// Event broker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    /// Bus implementation.
    #[serde(default = "default_provider")]
    pub provider: BrokerProvider,
    /// Redis connection URL (`redis://[:password@]host:port/db`).
    #[serde(default = "default_url")]
    pub url: String,
    /// Prefix applied to every broker channel, isolating gateway traffic
    /// from other users of the same Redis instance.
    #[serde(default = "default_channel_prefix")]
    pub channel_prefix: String,
    /// Reconnect behavior for the inbound subscription loop.
    #[serde(default)]
    pub retry: BrokerRetryConfig,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            url: default_url(),
            channel_prefix: default_channel_prefix(),
            retry: BrokerRetryConfig::default(),
        }
    }
}

/// Exponential backoff settings for broker re-subscription.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerRetryConfig {
    /// First retry delay in seconds.
    #[serde(default = "default_initial_interval")]
    pub initial_interval_seconds: u64,
    /// Upper bound on the retry delay in seconds.
    #[serde(default = "default_max_interval")]
    pub max_interval_seconds: u64,
    /// Multiplier applied after each failed attempt.
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
}

impl Default for BrokerRetryConfig {
    fn default() -> Self {
        Self {
            initial_interval_seconds: default_initial_interval(),
            max_interval_seconds: default_max_interval(),
            multiplier: default_multiplier(),
        }
    }
}

fn default_provider() -> BrokerProvider {
    BrokerProvider::Redis
}

fn default_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

fn default_channel_prefix() -> String {
    "pulse".to_string()
}

fn default_initial_interval() -> u64 {
    1
}

fn default_max_interval() -> u64 {
    30
}

fn default_multiplier() -> f64 {
    2.0
}
