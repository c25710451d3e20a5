//! Per-subscription filter evaluation.

pub mod predicates;

use std::sync::Arc;

use tracing::warn;

use pulse_core::error::AppError;
use pulse_core::event::Event;
use pulse_core::types::UserId;

use crate::subscription::Subscription;

use self::predicates::{FilterSpec, ParticipantPolicy};

/// Evaluates a subscription's filter predicates against incoming events.
///
/// Evaluation is side-effect-free and fails closed: an event that cannot
/// be evaluated (malformed payload) is treated as non-matching and logged,
/// never delivered and never fatal to the delivery loop.
#[derive(Debug, Clone)]
pub struct FilterEngine {
    policy: Arc<dyn ParticipantPolicy>,
}

impl FilterEngine {
    /// Creates an engine delegating participant checks to the given policy.
    pub fn new(policy: Arc<dyn ParticipantPolicy>) -> Self {
        Self { policy }
    }

    /// Whether the event should be delivered to this subscription.
    pub fn matches(&self, subscription: &Subscription, event: &Event) -> bool {
        for spec in &subscription.filters {
            match self.eval(spec, subscription, event) {
                Ok(true) => {}
                Ok(false) => return false,
                Err(e) => {
                    warn!(
                        subscription_id = %subscription.id,
                        channel = %event.channel,
                        error = %e,
                        "Filter evaluation failed, dropping event for subscription"
                    );
                    return false;
                }
            }
        }
        true
    }

    fn eval(
        &self,
        spec: &FilterSpec,
        subscription: &Subscription,
        event: &Event,
    ) -> Result<bool, AppError> {
        match spec {
            FilterSpec::Authenticated => Ok(subscription.principal.is_authenticated()),
            FilterSpec::ExcludeSelf => {
                let origin = event_origin(event)?;
                Ok(origin != Some(subscription.principal.user_id))
            }
            FilterSpec::ParticipantOf => Ok(self
                .policy
                .is_participant(&subscription.principal, &event.channel)),
        }
    }
}

/// Resolves the originating user of an event.
///
/// Prefers the envelope's `origin` field; falls back to a `userId` key in
/// the payload. A `userId` that is present but not a UUID string is a
/// malformed event.
fn event_origin(event: &Event) -> Result<Option<UserId>, AppError> {
    if let Some(origin) = event.origin {
        return Ok(Some(origin));
    }

    match event.payload.get("userId") {
        None => Ok(None),
        Some(value) => {
            let raw = value.as_str().ok_or_else(|| {
                AppError::malformed_event(format!(
                    "Event on '{}' has a non-string userId",
                    event.channel
                ))
            })?;
            raw.parse::<UserId>().map(Some).map_err(|_| {
                AppError::malformed_event(format!(
                    "Event on '{}' has an unparseable userId",
                    event.channel
                ))
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::predicates::AllowAllPolicy;
    use super::*;
    use crate::channel::ChannelPattern;
    use crate::subscription::ResultMapper;
    use pulse_core::principal::Principal;
    use pulse_core::types::{ConnectionId, SessionId, SubscriptionId, UserId};

    fn make_subscription(filters: Vec<FilterSpec>, principal: Principal) -> Subscription {
        Subscription {
            id: SubscriptionId::new(),
            connection_id: ConnectionId::new(),
            pattern: ChannelPattern::parse("presence.*").unwrap(),
            filters,
            mapper: ResultMapper::Payload,
            principal,
        }
    }

    fn engine() -> FilterEngine {
        FilterEngine::new(Arc::new(AllowAllPolicy))
    }

    fn authenticated_principal() -> Principal {
        Principal::authenticated(UserId::new(), SessionId::new(), vec![])
    }

    #[test]
    fn test_authenticated_predicate_blocks_anonymous() {
        let sub = make_subscription(vec![FilterSpec::Authenticated], Principal::anonymous());
        let event = Event::new("presence.u1", serde_json::json!({}));
        assert!(!engine().matches(&sub, &event));
    }

    #[test]
    fn test_exclude_self_suppresses_own_events() {
        let principal = authenticated_principal();
        let user_id = principal.user_id;
        let sub = make_subscription(vec![FilterSpec::ExcludeSelf], principal);

        let own = Event::new("presence.u1", serde_json::json!({})).with_origin(user_id);
        assert!(!engine().matches(&sub, &own));

        let other = Event::new("presence.u1", serde_json::json!({})).with_origin(UserId::new());
        assert!(engine().matches(&sub, &other));
    }

    #[test]
    fn test_exclude_self_reads_payload_user_id() {
        let principal = authenticated_principal();
        let user_id = principal.user_id;
        let sub = make_subscription(vec![FilterSpec::ExcludeSelf], principal);

        let own = Event::new(
            "presence.u1",
            serde_json::json!({"userId": user_id.to_string()}),
        );
        assert!(!engine().matches(&sub, &own));
    }

    #[test]
    fn test_malformed_payload_fails_closed() {
        let sub = make_subscription(vec![FilterSpec::ExcludeSelf], authenticated_principal());

        let malformed = Event::new("presence.u1", serde_json::json!({"userId": 42}));
        assert!(!engine().matches(&sub, &malformed));

        let unparseable = Event::new("presence.u1", serde_json::json!({"userId": "not-a-uuid"}));
        assert!(!engine().matches(&sub, &unparseable));

        // A well-formed event evaluated afterwards still matches.
        let ok = Event::new("presence.u1", serde_json::json!({})).with_origin(UserId::new());
        assert!(engine().matches(&sub, &ok));
    }
}
