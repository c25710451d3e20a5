//! Connection lifecycle manager — registration, teardown, and inbound
//! request handling.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use pulse_core::config::auth::RuntimeMode;
use pulse_core::config::realtime::RealtimeConfig;
use pulse_core::principal::Principal;
use pulse_core::types::{ConnectionId, SubscriptionId};

use crate::catalog::SubscriptionCatalog;
use crate::channel::ChannelPattern;
use crate::message::types::{InboundMessage, OutboundMessage};
use crate::metrics::GatewayMetrics;
use crate::subscription::registry::SubscriptionRegistry;

use super::handle::{ConnectionHandle, SendOutcome};
use super::pool::ConnectionPool;

/// Result of routing a message toward a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Queued on the connection's outbound queue.
    Delivered,
    /// Dropped due to backpressure; the connection stays up.
    Dropped,
    /// The connection's outbound side is gone; tear it down.
    Gone,
    /// No such connection in the pool.
    UnknownConnection,
}

/// Manages all live connections on this gateway instance.
///
/// Owns the pool exclusively; the subscription registry references
/// connections by id and is kept consistent on every teardown.
#[derive(Debug)]
pub struct ConnectionManager {
    /// Connection pool.
    pool: ConnectionPool,
    /// Subscription registry (cascaded on teardown).
    registry: Arc<SubscriptionRegistry>,
    /// Channel family registration table.
    catalog: SubscriptionCatalog,
    /// Metrics collector.
    metrics: Arc<GatewayMetrics>,
    /// Connection and delivery settings.
    config: RealtimeConfig,
    /// Development or production credential handling.
    mode: RuntimeMode,
}

impl ConnectionManager {
    /// Creates a new connection manager.
    pub fn new(
        config: RealtimeConfig,
        mode: RuntimeMode,
        registry: Arc<SubscriptionRegistry>,
        catalog: SubscriptionCatalog,
        metrics: Arc<GatewayMetrics>,
    ) -> Self {
        Self {
            pool: ConnectionPool::new(),
            registry,
            catalog,
            metrics,
            config,
            mode,
        }
    }

    /// Registers a new authenticated connection.
    ///
    /// Returns the connection handle and the receiver side of its bounded
    /// outbound queue. When the user is at their connection limit, the
    /// oldest connection is evicted first.
    pub fn register(
        &self,
        principal: Principal,
    ) -> (Arc<ConnectionHandle>, mpsc::Receiver<OutboundMessage>) {
        let existing = self.pool.user_connections(principal.user_id);
        if existing.len() >= self.config.max_connections_per_user {
            warn!(
                user_id = %principal.user_id,
                count = existing.len(),
                max = self.config.max_connections_per_user,
                "User at max connections, evicting oldest"
            );
            if let Some(oldest) = existing.first() {
                self.unregister(oldest.id);
            }
        }

        let (tx, rx) = mpsc::channel(self.config.outbound_buffer_size);
        let handle = Arc::new(ConnectionHandle::new(principal, tx));

        self.pool.add(handle.clone());
        self.registry.register_connection(handle.id);
        self.metrics.connection_opened();

        info!(
            conn_id = %handle.id,
            user_id = %handle.principal.user_id,
            anonymous = handle.principal.anonymous,
            "Connection registered"
        );

        (handle, rx)
    }

    /// Tears down a connection and cascades registry cleanup. Idempotent.
    pub fn unregister(&self, conn_id: ConnectionId) {
        if let Some(handle) = self.pool.remove(conn_id) {
            handle.mark_closed();
            let removed = self.registry.remove_connection(conn_id);
            self.metrics.connection_closed();

            info!(
                conn_id = %conn_id,
                user_id = %handle.principal.user_id,
                subscriptions_removed = removed,
                "Connection unregistered"
            );
        }
    }

    /// Processes one inbound frame from a client.
    pub async fn handle_inbound(&self, conn_id: ConnectionId, raw: &str) {
        let Some(handle) = self.pool.get(conn_id) else {
            warn!(conn_id = %conn_id, "Frame from unknown connection");
            return;
        };

        let msg: InboundMessage = match serde_json::from_str(raw) {
            Ok(m) => m,
            Err(e) => {
                self.send_error(&handle, "INVALID_MESSAGE", format!("Failed to parse: {e}"));
                return;
            }
        };

        match msg {
            InboundMessage::Subscribe { channel } => {
                self.handle_subscribe(&handle, &channel);
            }
            InboundMessage::Unsubscribe { subscription_id } => {
                self.handle_unsubscribe(&handle, subscription_id);
            }
            InboundMessage::Pong { .. } => {
                handle.record_pong().await;
            }
        }
    }

    /// Handles a subscribe request: authentication gate, limits, catalog
    /// resolution, registry insert, acknowledgment.
    fn handle_subscribe(&self, handle: &Arc<ConnectionHandle>, channel: &str) {
        if self.mode == RuntimeMode::Production && !handle.principal.is_authenticated() {
            self.send_error(
                handle,
                "UNAUTHENTICATED",
                "Subscriptions require an authenticated connection",
            );
            return;
        }

        let current = self.registry.subscription_count(handle.id);
        if current >= self.config.max_subscriptions_per_connection {
            self.send_error(
                handle,
                "MAX_SUBSCRIPTIONS",
                format!(
                    "Maximum subscriptions ({}) reached",
                    self.config.max_subscriptions_per_connection
                ),
            );
            return;
        }

        let pattern = match ChannelPattern::parse(channel) {
            Ok(p) => p,
            Err(e) => {
                self.send_error(handle, "INVALID_CHANNEL", e.message);
                return;
            }
        };

        let Some(entry) = self.catalog.resolve(&pattern) else {
            self.send_error(
                handle,
                "UNKNOWN_CHANNEL",
                format!("Channel family not served: {channel}"),
            );
            return;
        };

        match self.registry.subscribe(
            handle.id,
            pattern,
            entry.filters.clone(),
            entry.mapper,
            handle.principal.clone(),
        ) {
            Ok(subscription_id) => {
                let _ = handle.send(OutboundMessage::Subscribed {
                    subscription_id,
                    channel: channel.to_string(),
                });
                debug!(
                    conn_id = %handle.id,
                    subscription_id = %subscription_id,
                    channel = %channel,
                    "Subscribed"
                );
            }
            Err(e) => {
                // Registry raced with teardown; the connection is gone.
                warn!(conn_id = %handle.id, error = %e, "Subscribe failed");
            }
        }
    }

    fn handle_unsubscribe(&self, handle: &Arc<ConnectionHandle>, subscription_id: SubscriptionId) {
        self.registry.unsubscribe(subscription_id);
        let _ = handle.send(OutboundMessage::Unsubscribed { subscription_id });
        debug!(conn_id = %handle.id, subscription_id = %subscription_id, "Unsubscribed");
    }

    fn send_error(
        &self,
        handle: &Arc<ConnectionHandle>,
        code: &str,
        message: impl Into<String>,
    ) {
        let _ = handle.send(OutboundMessage::Error {
            code: code.to_string(),
            message: message.into(),
        });
    }

    /// Routes one outbound message toward a connection.
    pub fn deliver(&self, conn_id: ConnectionId, msg: OutboundMessage) -> DeliveryOutcome {
        let Some(handle) = self.pool.get(conn_id) else {
            return DeliveryOutcome::UnknownConnection;
        };
        match handle.send(msg) {
            SendOutcome::Enqueued => DeliveryOutcome::Delivered,
            SendOutcome::Dropped => DeliveryOutcome::Dropped,
            SendOutcome::Closed => DeliveryOutcome::Gone,
        }
    }

    /// Returns a connection handle by id.
    pub fn get(&self, conn_id: ConnectionId) -> Option<Arc<ConnectionHandle>> {
        self.pool.get(conn_id)
    }

    /// Closes every connection on this instance.
    pub fn close_all(&self) {
        let all = self.pool.all_connections();
        for conn in &all {
            self.unregister(conn.id);
        }
        if !all.is_empty() {
            info!(count = all.len(), "All connections closed");
        }
    }

    /// Whether every outbound queue has been drained.
    pub fn outbound_drained(&self) -> bool {
        self.pool
            .all_connections()
            .iter()
            .all(|c| c.outbound_drained())
    }

    /// Returns the total connection count.
    pub fn connection_count(&self) -> usize {
        self.pool.connection_count()
    }

    /// Returns the number of unique connected users.
    pub fn user_count(&self) -> usize {
        self.pool.user_count()
    }

    /// Heartbeat settings for spawned keepalive loops.
    pub fn heartbeat_config(&self) -> super::heartbeat::HeartbeatConfig {
        super::heartbeat::HeartbeatConfig {
            ping_interval: std::time::Duration::from_secs(self.config.ping_interval_seconds),
            ping_timeout: std::time::Duration::from_secs(self.config.ping_timeout_seconds),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_core::types::{SessionId, UserId};

    fn make_manager(mode: RuntimeMode) -> ConnectionManager {
        ConnectionManager::new(
            RealtimeConfig::default(),
            mode,
            Arc::new(SubscriptionRegistry::new()),
            SubscriptionCatalog::standard(),
            Arc::new(GatewayMetrics::new()),
        )
    }

    fn authenticated_principal() -> Principal {
        Principal::authenticated(UserId::new(), SessionId::new(), vec![])
    }

    #[tokio::test]
    async fn test_subscribe_and_ack() {
        let manager = make_manager(RuntimeMode::Production);
        let (handle, mut rx) = manager.register(authenticated_principal());

        manager
            .handle_inbound(
                handle.id,
                r#"{"type":"subscribe","channel":"messageReceived.conv-42"}"#,
            )
            .await;

        match rx.recv().await.unwrap() {
            OutboundMessage::Subscribed { channel, .. } => {
                assert_eq!(channel, "messageReceived.conv-42");
            }
            other => panic!("expected subscribe ack, got {other:?}"),
        }
        assert_eq!(manager.connection_count(), 1);
    }

    #[tokio::test]
    async fn test_anonymous_subscribe_rejected_in_production() {
        let manager = make_manager(RuntimeMode::Production);
        let (handle, mut rx) = manager.register(Principal::anonymous());

        manager
            .handle_inbound(handle.id, r#"{"type":"subscribe","channel":"presence.*"}"#)
            .await;

        match rx.recv().await.unwrap() {
            OutboundMessage::Error { code, .. } => assert_eq!(code, "UNAUTHENTICATED"),
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_anonymous_subscribe_allowed_in_development() {
        let manager = make_manager(RuntimeMode::Development);
        let (handle, mut rx) = manager.register(Principal::anonymous());

        manager
            .handle_inbound(handle.id, r#"{"type":"subscribe","channel":"presence.*"}"#)
            .await;

        assert!(matches!(
            rx.recv().await.unwrap(),
            OutboundMessage::Subscribed { .. }
        ));
    }

    #[tokio::test]
    async fn test_unknown_channel_family_rejected() {
        let manager = make_manager(RuntimeMode::Development);
        let (handle, mut rx) = manager.register(Principal::anonymous());

        manager
            .handle_inbound(handle.id, r#"{"type":"subscribe","channel":"uploads.f1"}"#)
            .await;

        match rx.recv().await.unwrap() {
            OutboundMessage::Error { code, .. } => assert_eq!(code, "UNKNOWN_CHANNEL"),
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unregister_is_idempotent_and_cascades() {
        let manager = make_manager(RuntimeMode::Development);
        let registry = manager.registry.clone();
        let (handle, _rx) = manager.register(Principal::anonymous());

        manager
            .handle_inbound(handle.id, r#"{"type":"subscribe","channel":"presence.*"}"#)
            .await;
        assert_eq!(registry.total_subscriptions(), 1);

        manager.unregister(handle.id);
        assert_eq!(registry.total_subscriptions(), 0);
        assert_eq!(manager.connection_count(), 0);

        manager.unregister(handle.id);
        assert_eq!(manager.connection_count(), 0);
    }

    #[tokio::test]
    async fn test_max_connections_evicts_oldest() {
        let mut config = RealtimeConfig::default();
        config.max_connections_per_user = 2;
        let manager = ConnectionManager::new(
            config,
            RuntimeMode::Development,
            Arc::new(SubscriptionRegistry::new()),
            SubscriptionCatalog::standard(),
            Arc::new(GatewayMetrics::new()),
        );

        let principal = authenticated_principal();
        let (first, _rx1) = manager.register(principal.clone());
        let (_second, _rx2) = manager.register(principal.clone());
        let (_third, _rx3) = manager.register(principal.clone());

        assert_eq!(manager.connection_count(), 2);
        assert!(manager.get(first.id).is_none());
        assert!(!first.is_alive());
    }
}
