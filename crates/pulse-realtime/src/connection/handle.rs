//! Individual connection handle.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use pulse_core::principal::Principal;
use pulse_core::types::ConnectionId;

use crate::message::types::OutboundMessage;

/// Result of enqueueing a message on a connection's outbound queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Queued for the outbound worker.
    Enqueued,
    /// Queue full — the newest message (this one) was dropped.
    Dropped,
    /// The outbound side is gone; the connection should be torn down.
    Closed,
}

/// A handle to a single live connection.
///
/// Holds the bounded sender for pushing messages toward the client, plus
/// the principal resolved at connect time. Enqueueing never blocks the
/// caller: when the queue is full the message is dropped so one slow
/// client cannot stall delivery to others.
#[derive(Debug)]
pub struct ConnectionHandle {
    /// Unique connection ID (process-local).
    pub id: ConnectionId,
    /// Identity resolved at connect time.
    pub principal: Principal,
    /// When the connection was established.
    pub established_at: DateTime<Utc>,
    /// Sender for outbound messages.
    sender: mpsc::Sender<OutboundMessage>,
    /// Cancels the connection's read loop and heartbeat on teardown.
    cancel: CancellationToken,
    /// Last pong received.
    last_pong: tokio::sync::RwLock<DateTime<Utc>>,
    /// Whether the connection is still alive.
    alive: AtomicBool,
}

impl ConnectionHandle {
    /// Creates a new handle around an outbound sender.
    pub fn new(principal: Principal, sender: mpsc::Sender<OutboundMessage>) -> Self {
        Self {
            id: ConnectionId::new(),
            principal,
            established_at: Utc::now(),
            sender,
            cancel: CancellationToken::new(),
            last_pong: tokio::sync::RwLock::new(Utc::now()),
            alive: AtomicBool::new(true),
        }
    }

    /// Enqueues an outbound message without blocking.
    pub fn send(&self, msg: OutboundMessage) -> SendOutcome {
        if !self.is_alive() {
            return SendOutcome::Closed;
        }
        match self.sender.try_send(msg) {
            Ok(()) => SendOutcome::Enqueued,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(
                    conn_id = %self.id,
                    "Outbound queue full, dropping newest message"
                );
                SendOutcome::Dropped
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.mark_closed();
                SendOutcome::Closed
            }
        }
    }

    /// Check if the connection is alive.
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Marks the connection closed and cancels its tasks. Idempotent.
    pub fn mark_closed(&self) {
        self.alive.store(false, Ordering::SeqCst);
        self.cancel.cancel();
    }

    /// Token cancelled when the connection is torn down.
    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Records a pong response.
    pub async fn record_pong(&self) {
        let mut lp = self.last_pong.write().await;
        *lp = Utc::now();
    }

    /// Timestamp of the last pong received.
    pub async fn last_pong(&self) -> DateTime<Utc> {
        *self.last_pong.read().await
    }

    /// Whether the outbound queue is fully drained.
    pub fn outbound_drained(&self) -> bool {
        self.sender.capacity() == self.sender.max_capacity()
    }
}
