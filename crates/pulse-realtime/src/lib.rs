//! # pulse-realtime
//!
//! Real-time subscription fan-out engine for the Pulse gateway. Provides:
//!
//! - WebSocket connection lifecycle with bearer-token authentication
//! - Per-connection channel subscriptions with wildcard pattern matching
//! - Filtered event routing (authenticated-only, exclude-self,
//!   participant-scoped) with fail-closed predicate evaluation
//! - Redis-backed pub/sub bus for multi-instance fan-out, plus an
//!   in-process bus for single-node use and tests
//! - Bounded per-connection outbound queues so one slow client cannot
//!   stall delivery to others

pub mod bus;
pub mod catalog;
pub mod channel;
pub mod connection;
pub mod filter;
pub mod message;
pub mod metrics;
pub mod publisher;
pub mod router;
pub mod server;
pub mod subscription;

pub use bus::{EventBus, MemoryEventBus, RedisEventBus};
pub use catalog::SubscriptionCatalog;
pub use connection::manager::ConnectionManager;
pub use filter::FilterEngine;
pub use publisher::EventPublisher;
pub use router::SubscriptionRouter;
pub use server::RealtimeGateway;
pub use subscription::registry::SubscriptionRegistry;
