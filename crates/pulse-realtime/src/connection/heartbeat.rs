//! Ping/pong keepalive for long-lived connections.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time;
use tracing::{debug, warn};

use crate::message::types::OutboundMessage;

use super::handle::{ConnectionHandle, SendOutcome};

/// Heartbeat configuration.
#[derive(Debug, Clone)]
pub struct HeartbeatConfig {
    /// Interval between pings.
    pub ping_interval: Duration,
    /// Timeout before considering the connection dead.
    pub ping_timeout: Duration,
}

/// Runs the heartbeat loop for one connection.
///
/// Sends periodic pings and checks pong responses. Marks the connection
/// closed if a pong is not received within the timeout; the owning
/// transport task observes the cancellation and tears the connection down.
pub async fn run_heartbeat(handle: Arc<ConnectionHandle>, config: HeartbeatConfig) {
    let mut interval = time::interval(config.ping_interval);
    interval.tick().await; // first tick fires immediately

    let cancel = handle.cancellation();
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {}
        }

        if !handle.is_alive() {
            break;
        }

        let last_pong = handle.last_pong().await;
        let elapsed = Utc::now() - last_pong;
        if let Ok(elapsed_std) = elapsed.to_std() {
            if elapsed_std > config.ping_timeout {
                warn!(
                    conn_id = %handle.id,
                    elapsed_seconds = elapsed_std.as_secs(),
                    "Heartbeat timeout, closing connection"
                );
                handle.mark_closed();
                break;
            }
        }

        if handle.send(OutboundMessage::ping_now()) == SendOutcome::Closed {
            break;
        }
    }

    debug!(conn_id = %handle.id, "Heartbeat loop ended");
}
