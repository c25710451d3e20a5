//! A published domain fact routed by the gateway.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::UserId;

/// One event published to the bus by a domain service.
///
/// Immutable once published. The gateway never persists events; an event
/// that reaches no matching live subscription is simply lost.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Exact topic string the publisher used, e.g. `presence.u1`.
    pub channel: String,
    /// Opaque structured payload.
    pub payload: serde_json::Value,
    /// User whose action produced the event, when known. Used by the
    /// "exclude self as originator" filter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<UserId>,
    /// When the publisher created the event.
    pub published_at: DateTime<Utc>,
}

impl Event {
    /// Create a new event on the given channel.
    pub fn new(channel: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            channel: channel.into(),
            payload,
            origin: None,
            published_at: Utc::now(),
        }
    }

    /// Attach the originating user.
    pub fn with_origin(mut self, origin: UserId) -> Self {
        self.origin = Some(origin);
        self
    }
}
