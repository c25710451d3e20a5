//! Inbound and outbound WebSocket message type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pulse_core::types::SubscriptionId;

/// Messages sent by the client to the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundMessage {
    /// Subscribe to a channel or wildcard pattern.
    Subscribe {
        /// Channel pattern, e.g. `messageReceived.conv-42` or `presence.*`.
        channel: String,
    },
    /// Cancel a previously issued subscription.
    Unsubscribe {
        /// Subscription ID returned in the subscribe acknowledgment.
        subscription_id: SubscriptionId,
    },
    /// Pong response to server ping.
    Pong {
        /// Echoed server timestamp.
        timestamp: i64,
    },
}

/// Messages sent by the server to the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    /// Subscription confirmed.
    Subscribed {
        /// Issued subscription ID.
        subscription_id: SubscriptionId,
        /// Echoed channel pattern.
        channel: String,
    },
    /// Unsubscribe acknowledged.
    Unsubscribed {
        /// Subscription ID that was removed.
        subscription_id: SubscriptionId,
    },
    /// A routed event payload.
    Event {
        /// Subscription that matched.
        subscription_id: SubscriptionId,
        /// Exact channel the event was published on.
        channel: String,
        /// Projected payload.
        payload: serde_json::Value,
    },
    /// Ping (server keepalive).
    Ping {
        /// Server timestamp.
        timestamp: i64,
    },
    /// Error message.
    Error {
        /// Error code.
        code: String,
        /// Error description.
        message: String,
    },
}

impl OutboundMessage {
    /// Builds a keepalive ping stamped with the current time.
    pub fn ping_now() -> Self {
        Self::Ping {
            timestamp: now_millis(),
        }
    }
}

fn now_millis() -> i64 {
    let now: DateTime<Utc> = Utc::now();
    now.timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inbound_subscribe_wire_format() {
        let raw = r#"{"type":"subscribe","channel":"presence.*"}"#;
        let msg: InboundMessage = serde_json::from_str(raw).unwrap();
        match msg {
            InboundMessage::Subscribe { channel } => assert_eq!(channel, "presence.*"),
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn test_outbound_event_wire_format() {
        let msg = OutboundMessage::Event {
            subscription_id: SubscriptionId::new(),
            channel: "messageReceived.conv-1".to_string(),
            payload: serde_json::json!({"id": "m1"}),
        };
        let raw = serde_json::to_string(&msg).unwrap();
        assert!(raw.contains(r#""type":"event""#));
        assert!(raw.contains(r#""channel":"messageReceived.conv-1""#));
    }
}
