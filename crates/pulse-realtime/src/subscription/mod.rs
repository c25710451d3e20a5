//! Subscription records and the registry tracking them.

pub mod registry;

use serde_json::Value;

use pulse_core::event::Event;
use pulse_core::principal::Principal;
use pulse_core::types::{ConnectionId, SubscriptionId};

use crate::channel::ChannelPattern;
use crate::filter::predicates::FilterSpec;

/// One client's registered interest in a channel family.
///
/// The `connection_id` must reference a live connection; the registry
/// purges subscriptions in the same step as connection teardown so the
/// router never emits to a stale owner.
#[derive(Debug, Clone)]
pub struct Subscription {
    /// Unique subscription identifier.
    pub id: SubscriptionId,
    /// Owning connection.
    pub connection_id: ConnectionId,
    /// Matching rule over published channels.
    pub pattern: ChannelPattern,
    /// Filter predicates applied before delivery.
    pub filters: Vec<FilterSpec>,
    /// Projection applied to matching events.
    pub mapper: ResultMapper,
    /// Principal snapshot taken at subscribe time.
    pub principal: Principal,
}

/// Projects a raw event into the payload actually sent to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultMapper {
    /// The published payload, verbatim.
    Payload,
    /// The published payload with the originating user id merged in
    /// (status-style families where clients need to know whose state
    /// changed). Non-object payloads pass through verbatim.
    WithOrigin,
}

impl ResultMapper {
    /// Applies the projection.
    pub fn project(&self, event: &Event) -> Value {
        match self {
            Self::Payload => event.payload.clone(),
            Self::WithOrigin => {
                let mut payload = event.payload.clone();
                if let (Some(origin), Some(object)) = (event.origin, payload.as_object_mut()) {
                    object
                        .entry("userId")
                        .or_insert_with(|| Value::String(origin.to_string()));
                }
                payload
            }
        }
    }
}
