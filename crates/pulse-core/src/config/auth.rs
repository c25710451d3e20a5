//! Credential validation configuration.

use serde::{Deserialize, Serialize};

/// Runtime mode controlling how unauthenticated connections are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeMode {
    /// Missing credentials yield a synthetic anonymous principal.
    Development,
    /// Missing credentials reject the handshake.
    Production,
}

/// Authentication configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret used to verify access tokens.
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    /// Development or production credential handling.
    #[serde(default = "default_mode")]
    pub mode: RuntimeMode,
    /// Clock-skew leeway for token expiry checks, in seconds.
    #[serde(default = "default_leeway")]
    pub leeway_seconds: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            mode: default_mode(),
            leeway_seconds: default_leeway(),
        }
    }
}

fn default_jwt_secret() -> String {
    "change-me-in-production".to_string()
}

fn default_mode() -> RuntimeMode {
    RuntimeMode::Development
}

fn default_leeway() -> u64 {
    5
}
