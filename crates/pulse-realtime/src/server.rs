//! Top-level real-time gateway that ties together all subsystems.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use pulse_core::config::GatewayConfig;
use pulse_core::error::AppError;

use crate::bus::EventBus;
use crate::catalog::SubscriptionCatalog;
use crate::connection::manager::ConnectionManager;
use crate::filter::FilterEngine;
use crate::filter::predicates::ParticipantPolicy;
use crate::metrics::GatewayMetrics;
use crate::publisher::EventPublisher;
use crate::router::SubscriptionRouter;
use crate::subscription::registry::SubscriptionRegistry;

/// Central real-time gateway coordinating connection lifecycle,
/// subscription routing, and the event bus.
#[derive(Clone)]
pub struct RealtimeGateway {
    /// Connection lifecycle manager.
    pub connections: Arc<ConnectionManager>,
    /// Subscription registry.
    pub registry: Arc<SubscriptionRegistry>,
    /// Domain-facing publisher.
    pub publisher: EventPublisher,
    /// Metrics collector.
    pub metrics: Arc<GatewayMetrics>,
    /// Event bus shared with all instances.
    bus: Arc<dyn EventBus>,
    /// Router driving the delivery loop.
    router: Arc<SubscriptionRouter>,
    /// Cancels the delivery loop and all per-connection tasks.
    cancel: CancellationToken,
    /// Delivery loop task, once started.
    router_task: Arc<Mutex<Option<JoinHandle<()>>>>,
    /// Grace window for flushing outbound queues at shutdown.
    shutdown_grace: Duration,
}

impl std::fmt::Debug for RealtimeGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeGateway").finish()
    }
}

impl RealtimeGateway {
    /// Creates a new gateway with all subsystems wired.
    pub fn new(
        config: &GatewayConfig,
        bus: Arc<dyn EventBus>,
        policy: Arc<dyn ParticipantPolicy>,
    ) -> Self {
        let cancel = CancellationToken::new();
        let metrics = Arc::new(GatewayMetrics::new());
        let registry = Arc::new(SubscriptionRegistry::new());
        let catalog = SubscriptionCatalog::standard();

        let connections = Arc::new(ConnectionManager::new(
            config.realtime.clone(),
            config.auth.mode,
            registry.clone(),
            catalog,
            metrics.clone(),
        ));

        let router = Arc::new(SubscriptionRouter::new(
            registry.clone(),
            FilterEngine::new(policy),
            connections.clone(),
            bus.clone(),
            metrics.clone(),
            cancel.clone(),
        ));

        let publisher = EventPublisher::new(bus.clone());

        info!("Real-time gateway initialized");

        Self {
            connections,
            registry,
            publisher,
            metrics,
            bus,
            router,
            cancel,
            router_task: Arc::new(Mutex::new(None)),
            shutdown_grace: Duration::from_secs(config.server.shutdown_grace_seconds),
        }
    }

    /// Starts the delivery loop.
    pub async fn start(&self) -> Result<(), AppError> {
        let router = self.router.clone();
        let task = tokio::spawn(async move {
            if let Err(e) = router.run().await {
                warn!(error = %e, "Subscription router exited with error");
            }
        });
        *self.router_task.lock().await = Some(task);
        Ok(())
    }

    /// Whether this instance can currently route events.
    pub fn is_ready(&self) -> bool {
        self.bus.is_healthy()
    }

    /// The shared event bus.
    pub fn bus(&self) -> &Arc<dyn EventBus> {
        &self.bus
    }

    /// Initiates a graceful shutdown: stop routing, flush outbound queues
    /// within the grace window, then close every connection.
    pub async fn shutdown(&self) {
        info!("Shutting down real-time gateway");

        self.cancel.cancel();
        if let Some(task) = self.router_task.lock().await.take() {
            let _ = task.await;
        }

        let deadline = tokio::time::Instant::now() + self.shutdown_grace;
        while !self.connections.outbound_drained() {
            if tokio::time::Instant::now() >= deadline {
                warn!("Shutdown grace elapsed with undelivered outbound messages");
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        self.connections.close_all();
        info!("Real-time gateway shut down");
    }
}
