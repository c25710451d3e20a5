//! Subscription registry — tracks which live connections subscribed to
//! which channel patterns.
//!
//! All methods are safe to call concurrently: client request tasks mutate
//! the registry while the delivery loop reads it. Three maps are kept
//! mutually consistent on every mutation: subscription id → record,
//! connection → owned subscription ids (presence of the entry marks the
//! connection live), and pattern → subscribing ids.

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use pulse_core::error::AppError;
use pulse_core::principal::Principal;
use pulse_core::types::{ConnectionId, SubscriptionId};

use crate::channel::ChannelPattern;
use crate::filter::predicates::FilterSpec;

use super::{ResultMapper, Subscription};

/// One pattern's entry in the forward index.
#[derive(Debug)]
struct PatternEntry {
    pattern: ChannelPattern,
    ids: HashSet<SubscriptionId>,
}

/// Registry of all live subscriptions on this gateway instance.
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    /// Subscription ID → record.
    subscriptions: DashMap<SubscriptionId, Arc<Subscription>>,
    /// Connection ID → owned subscription IDs. An entry exists for every
    /// live connection, empty or not.
    by_connection: DashMap<ConnectionId, HashSet<SubscriptionId>>,
    /// Pattern string → subscribing IDs.
    by_pattern: DashMap<String, PatternEntry>,
}

impl SubscriptionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a connection as live so it may own subscriptions.
    pub fn register_connection(&self, connection_id: ConnectionId) {
        self.by_connection.entry(connection_id).or_default();
    }

    /// Whether the connection is currently registered as live.
    pub fn is_connection_live(&self, connection_id: ConnectionId) -> bool {
        self.by_connection.contains_key(&connection_id)
    }

    /// Records a subscription for a live connection.
    ///
    /// Fails with `ConnectionNotFound` if the connection has not been
    /// registered or has already been torn down.
    pub fn subscribe(
        &self,
        connection_id: ConnectionId,
        pattern: ChannelPattern,
        filters: Vec<FilterSpec>,
        mapper: ResultMapper,
        principal: Principal,
    ) -> Result<SubscriptionId, AppError> {
        let id = SubscriptionId::new();

        // Membership is recorded under the liveness entry's guard so a
        // concurrent remove_connection either sees this id or runs first.
        match self.by_connection.get_mut(&connection_id) {
            Some(mut owned) => {
                owned.insert(id);
            }
            None => {
                return Err(AppError::connection_not_found(format!(
                    "Connection {connection_id} is not live"
                )));
            }
        }

        let subscription = Arc::new(Subscription {
            id,
            connection_id,
            pattern: pattern.clone(),
            filters,
            mapper,
            principal,
        });
        self.subscriptions.insert(id, subscription);
        self.by_pattern
            .entry(pattern.as_str().to_string())
            .or_insert_with(|| PatternEntry {
                pattern,
                ids: HashSet::new(),
            })
            .ids
            .insert(id);

        // The connection may have been torn down between the liveness
        // check and the secondary inserts; undo if so.
        if !self.by_connection.contains_key(&connection_id) {
            self.unsubscribe(id);
            return Err(AppError::connection_not_found(format!(
                "Connection {connection_id} was torn down during subscribe"
            )));
        }

        debug!(
            subscription_id = %id,
            connection_id = %connection_id,
            "Subscription recorded"
        );
        Ok(id)
    }

    /// Removes a subscription. Unsubscribing an unknown id is a no-op.
    pub fn unsubscribe(&self, subscription_id: SubscriptionId) {
        let Some((_, subscription)) = self.subscriptions.remove(&subscription_id) else {
            return;
        };

        if let Some(mut owned) = self.by_connection.get_mut(&subscription.connection_id) {
            owned.remove(&subscription_id);
        }
        self.remove_from_pattern_index(subscription.pattern.as_str(), subscription_id);

        debug!(subscription_id = %subscription_id, "Subscription removed");
    }

    /// Removes a connection and every subscription it owns.
    ///
    /// Idempotent: the second call for the same connection is a no-op.
    /// Returns the number of subscriptions removed.
    pub fn remove_connection(&self, connection_id: ConnectionId) -> usize {
        let Some((_, owned)) = self.by_connection.remove(&connection_id) else {
            return 0;
        };

        let mut removed = 0;
        for id in owned {
            if let Some((_, subscription)) = self.subscriptions.remove(&id) {
                self.remove_from_pattern_index(subscription.pattern.as_str(), id);
                removed += 1;
            }
        }

        debug!(
            connection_id = %connection_id,
            count = removed,
            "Connection subscriptions purged"
        );
        removed
    }

    /// Returns every live subscription whose pattern matches the channel,
    /// in unspecified order.
    pub fn matching_subscriptions(&self, channel: &str) -> Vec<Arc<Subscription>> {
        let mut ids: Vec<SubscriptionId> = Vec::new();
        for entry in self.by_pattern.iter() {
            if entry.pattern.matches(channel) {
                ids.extend(entry.ids.iter().copied());
            }
        }

        ids.into_iter()
            .filter_map(|id| self.subscriptions.get(&id).map(|s| s.value().clone()))
            .collect()
    }

    /// Returns the subscription count for a connection.
    pub fn subscription_count(&self, connection_id: ConnectionId) -> usize {
        self.by_connection
            .get(&connection_id)
            .map(|owned| owned.len())
            .unwrap_or(0)
    }

    /// Returns the total number of live subscriptions.
    pub fn total_subscriptions(&self) -> usize {
        self.subscriptions.len()
    }

    /// Returns the number of distinct patterns with subscribers.
    pub fn pattern_count(&self) -> usize {
        self.by_pattern.len()
    }

    fn remove_from_pattern_index(&self, pattern: &str, subscription_id: SubscriptionId) {
        if let Some(mut entry) = self.by_pattern.get_mut(pattern) {
            entry.ids.remove(&subscription_id);
            if entry.ids.is_empty() {
                drop(entry);
                self.by_pattern
                    .remove_if(pattern, |_, entry| entry.ids.is_empty());
            }
        }
    }
}
