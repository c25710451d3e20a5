//! In-process event bus for single-node deployments and tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc};
use tracing::debug;

use pulse_core::error::AppError;
use pulse_core::event::Event;

use super::{EventBus, glob_matches};

/// In-memory pub/sub implementation.
///
/// Events only reach subscribers within the same process; deployments with
/// more than one gateway instance must use the Redis bus. Tests use
/// [`MemoryEventBus::set_healthy`] to simulate broker outages.
#[derive(Debug)]
pub struct MemoryEventBus {
    sender: broadcast::Sender<Event>,
    healthy: Arc<AtomicBool>,
}

impl MemoryEventBus {
    /// Creates a bus buffering up to `buffer_size` undelivered events.
    pub fn new(buffer_size: usize) -> Self {
        let (sender, _) = broadcast::channel(buffer_size);
        Self {
            sender,
            healthy: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Simulates broker availability. While unhealthy, publishes fail
    /// with `BrokerUnavailable` exactly like the Redis bus.
    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }
}

impl Default for MemoryEventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl EventBus for MemoryEventBus {
    async fn publish(&self, event: Event) -> Result<(), AppError> {
        if !self.is_healthy() {
            return Err(AppError::broker_unavailable(
                "In-memory broker marked unavailable",
            ));
        }
        // No receivers is not an error: fire-and-forget semantics.
        let _ = self.sender.send(event);
        Ok(())
    }

    async fn subscribe(&self, pattern: &str) -> Result<mpsc::Receiver<Event>, AppError> {
        let mut inbound = self.sender.subscribe();
        let (tx, rx) = mpsc::channel(256);
        let pattern = pattern.to_string();

        tokio::spawn(async move {
            loop {
                match inbound.recv().await {
                    Ok(event) => {
                        if !glob_matches(&pattern, &event.channel) {
                            continue;
                        }
                        if tx.send(event).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        debug!(missed, "In-memory bus subscriber lagged, events lost");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        Ok(rx)
    }

    fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::SeqCst)
    }
}
