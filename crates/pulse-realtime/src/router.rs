//! Subscription router — the shared delivery loop.
//!
//! Consumes raw events from the bus, resolves interested subscriptions,
//! applies filters, projects payloads, and enqueues them on each owning
//! connection's bounded outbound queue. Failures are isolated per
//! subscription: one bad event or gone connection never prevents delivery
//! to the others, and never stops the loop.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use pulse_core::error::AppError;
use pulse_core::event::Event;

use crate::bus::EventBus;
use crate::connection::manager::{ConnectionManager, DeliveryOutcome};
use crate::filter::FilterEngine;
use crate::message::types::OutboundMessage;
use crate::metrics::GatewayMetrics;
use crate::subscription::registry::SubscriptionRegistry;

/// Routes published events to matching live subscriptions.
#[derive(Debug)]
pub struct SubscriptionRouter {
    registry: Arc<SubscriptionRegistry>,
    filter_engine: FilterEngine,
    connections: Arc<ConnectionManager>,
    bus: Arc<dyn EventBus>,
    metrics: Arc<GatewayMetrics>,
    cancel: CancellationToken,
}

impl SubscriptionRouter {
    /// Creates a router over the given collaborators.
    pub fn new(
        registry: Arc<SubscriptionRegistry>,
        filter_engine: FilterEngine,
        connections: Arc<ConnectionManager>,
        bus: Arc<dyn EventBus>,
        metrics: Arc<GatewayMetrics>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            registry,
            filter_engine,
            connections,
            bus,
            metrics,
            cancel,
        }
    }

    /// Runs the delivery loop until cancelled.
    ///
    /// One global loop demultiplexes all gateway channels; the bus keeps
    /// the inbound subscription alive across broker outages.
    pub async fn run(&self) -> Result<(), AppError> {
        let mut inbound = self.bus.subscribe("*").await?;
        info!("Subscription router listening");

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    info!("Subscription router stopped");
                    break;
                }
                maybe = inbound.recv() => match maybe {
                    Some(event) => self.route(&event),
                    None => {
                        warn!("Broker inbound channel closed, router stopping");
                        break;
                    }
                }
            }
        }
        Ok(())
    }

    /// Fans one event out to every matching, passing subscription.
    pub fn route(&self, event: &Event) {
        self.metrics.event_received();

        let matches = self.registry.matching_subscriptions(&event.channel);
        if matches.is_empty() {
            return;
        }
        debug!(
            channel = %event.channel,
            candidates = matches.len(),
            "Routing event"
        );

        for subscription in matches {
            if !self.filter_engine.matches(&subscription, event) {
                self.metrics.event_filtered();
                continue;
            }

            let frame = OutboundMessage::Event {
                subscription_id: subscription.id,
                channel: event.channel.clone(),
                payload: subscription.mapper.project(event),
            };

            match self.connections.deliver(subscription.connection_id, frame) {
                DeliveryOutcome::Delivered => self.metrics.event_delivered(),
                DeliveryOutcome::Dropped => {
                    // Warning with the connection id is logged at the queue.
                    self.metrics.event_dropped();
                }
                DeliveryOutcome::Gone => {
                    // Peer is gone: treat as an implicit disconnect rather
                    // than retrying the write.
                    warn!(
                        conn_id = %subscription.connection_id,
                        "Outbound closed during delivery, tearing down connection"
                    );
                    self.connections.unregister(subscription.connection_id);
                }
                DeliveryOutcome::UnknownConnection => {
                    // Registry entry outlived the pool entry; purge it.
                    self.registry.remove_connection(subscription.connection_id);
                }
            }
        }
    }
}
