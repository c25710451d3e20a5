//! Lightweight atomic counters for gateway observability.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Counters updated on the hot path and surfaced on detailed health.
#[derive(Debug, Default)]
pub struct GatewayMetrics {
    connections_opened: AtomicU64,
    connections_closed: AtomicU64,
    events_received: AtomicU64,
    events_delivered: AtomicU64,
    events_dropped: AtomicU64,
    events_filtered: AtomicU64,
}

impl GatewayMetrics {
    /// Creates zeroed metrics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a connection opening.
    pub fn connection_opened(&self) {
        self.connections_opened.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a connection closing.
    pub fn connection_closed(&self) {
        self.connections_closed.fetch_add(1, Ordering::Relaxed);
    }

    /// Records an event consumed from the bus.
    pub fn event_received(&self) {
        self.events_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Records one payload enqueued toward a connection.
    pub fn event_delivered(&self) {
        self.events_delivered.fetch_add(1, Ordering::Relaxed);
    }

    /// Records one payload dropped due to backpressure.
    pub fn event_dropped(&self) {
        self.events_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Records one payload suppressed by a filter predicate.
    pub fn event_filtered(&self) {
        self.events_filtered.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time snapshot for health reporting.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            connections_opened: self.connections_opened.load(Ordering::Relaxed),
            connections_closed: self.connections_closed.load(Ordering::Relaxed),
            events_received: self.events_received.load(Ordering::Relaxed),
            events_delivered: self.events_delivered.load(Ordering::Relaxed),
            events_dropped: self.events_dropped.load(Ordering::Relaxed),
            events_filtered: self.events_filtered.load(Ordering::Relaxed),
        }
    }
}

/// Serializable metrics snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    /// Total connections opened since start.
    pub connections_opened: u64,
    /// Total connections closed since start.
    pub connections_closed: u64,
    /// Events consumed from the bus.
    pub events_received: u64,
    /// Payloads enqueued toward connections.
    pub events_delivered: u64,
    /// Payloads dropped due to backpressure.
    pub events_dropped: u64,
    /// Payloads suppressed by filters.
    pub events_filtered: u64,
}
