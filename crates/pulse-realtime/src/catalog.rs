//! Subscription catalog — the explicit registration table mapping each
//! channel family to its standard filter set and result mapper.
//!
//! Built once at startup; subscribe requests resolve their channel family
//! here instead of relying on per-route annotations.

use std::collections::HashMap;

use crate::channel::{ChannelFamily, ChannelPattern};
use crate::filter::predicates::FilterSpec;
use crate::subscription::ResultMapper;

/// Delivery rules for one channel family.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    /// Predicates applied to every event before delivery.
    pub filters: Vec<FilterSpec>,
    /// Projection applied to matching events.
    pub mapper: ResultMapper,
}

/// Registration table for all channel families the gateway serves.
#[derive(Debug, Clone)]
pub struct SubscriptionCatalog {
    entries: HashMap<ChannelFamily, CatalogEntry>,
}

impl SubscriptionCatalog {
    /// Builds the standard chat-domain catalog.
    pub fn standard() -> Self {
        use ChannelFamily::*;
        use FilterSpec::*;

        let mut entries = HashMap::new();
        entries.insert(
            MessageReceived,
            CatalogEntry {
                filters: vec![Authenticated, ParticipantOf],
                mapper: ResultMapper::Payload,
            },
        );
        entries.insert(
            TypingStatus,
            CatalogEntry {
                filters: vec![Authenticated, ParticipantOf, ExcludeSelf],
                mapper: ResultMapper::Payload,
            },
        );
        entries.insert(
            MessageStatus,
            CatalogEntry {
                filters: vec![Authenticated, ParticipantOf],
                mapper: ResultMapper::Payload,
            },
        );
        entries.insert(
            ParticipantChanged,
            CatalogEntry {
                filters: vec![Authenticated, ParticipantOf],
                mapper: ResultMapper::Payload,
            },
        );
        entries.insert(
            Presence,
            CatalogEntry {
                filters: vec![Authenticated, ExcludeSelf],
                mapper: ResultMapper::WithOrigin,
            },
        );
        entries.insert(
            Activity,
            CatalogEntry {
                filters: vec![Authenticated, ExcludeSelf],
                mapper: ResultMapper::WithOrigin,
            },
        );
        entries.insert(
            FriendStatus,
            CatalogEntry {
                filters: vec![Authenticated, ParticipantOf],
                mapper: ResultMapper::WithOrigin,
            },
        );
        entries.insert(
            ContactsPresence,
            CatalogEntry {
                filters: vec![Authenticated, ExcludeSelf],
                mapper: ResultMapper::WithOrigin,
            },
        );

        Self { entries }
    }

    /// Resolves the delivery rules for a subscription pattern.
    ///
    /// Returns `None` for channel families the gateway does not serve.
    pub fn resolve(&self, pattern: &ChannelPattern) -> Option<&CatalogEntry> {
        self.entries.get(&pattern.family()?)
    }

    /// The number of registered families.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for SubscriptionCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
