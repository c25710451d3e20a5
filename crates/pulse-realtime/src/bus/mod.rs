//! Publish/subscribe abstraction over the shared event broker.

pub mod memory;
pub mod redis;

use async_trait::async_trait;
use tokio::sync::mpsc;

use pulse_core::error::AppError;
use pulse_core::event::Event;

pub use memory::MemoryEventBus;
pub use redis::RedisEventBus;

/// A publish/subscribe bus shared by every gateway instance.
///
/// Delivery is best-effort/at-most-once: `publish` returns as soon as the
/// broker accepted the message, with no acknowledgment from any
/// subscriber — the publisher cannot distinguish "no subscribers" from
/// "all subscribers missed it".
#[async_trait]
pub trait EventBus: Send + Sync + std::fmt::Debug {
    /// Publishes an event to its channel. Fails loudly with
    /// `BrokerUnavailable` when the broker connection is down.
    async fn publish(&self, event: Event) -> Result<(), AppError>;

    /// Opens an inbound subscription for every channel matching the
    /// pattern (`*` subscribes to all gateway channels).
    ///
    /// The receiver yields events until dropped; dropping it cancels the
    /// underlying broker subscription. The bus keeps the subscription
    /// alive across broker outages by reconnecting with backoff.
    async fn subscribe(&self, pattern: &str) -> Result<mpsc::Receiver<Event>, AppError>;

    /// Whether the broker connection is currently believed healthy.
    /// Readiness probes report not-ready while this is false.
    fn is_healthy(&self) -> bool;
}

/// Broker-side glob matching used by the in-process bus to mirror the
/// Redis `PSUBSCRIBE` semantics the gateway relies on: a literal channel,
/// or a `prefix.*` pattern, or the catch-all `*`.
pub(crate) fn glob_matches(pattern: &str, channel: &str) -> bool {
    if pattern == "*" {
        return true;
    }
    if let Some(prefix) = pattern.strip_suffix('*') {
        return channel.starts_with(prefix) && channel.len() > prefix.len();
    }
    pattern == channel
}
