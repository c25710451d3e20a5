//! Standard filter predicates and the participant authorization seam.

use pulse_core::principal::Principal;

/// A pure predicate applied to `(event, requesting principal)` before
/// delivery. Predicates are data, not closures, so the subscription
/// catalog stays an explicit, inspectable table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterSpec {
    /// The subscribing principal must be authenticated.
    Authenticated,
    /// Do not deliver events the subscribing principal originated.
    ExcludeSelf,
    /// The subscribing principal must be a participant of the referenced
    /// conversation/topic, per the configured [`ParticipantPolicy`].
    ParticipantOf,
}

/// Decides whether a principal may receive events on a channel.
///
/// The real policy lives in an external authorization service that is not
/// wired in yet; deployments configure [`AllowAllPolicy`] until it is.
pub trait ParticipantPolicy: Send + Sync + std::fmt::Debug {
    /// Whether the principal participates in the channel's topic.
    fn is_participant(&self, principal: &Principal, channel: &str) -> bool;
}

/// Default always-allow participant policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAllPolicy;

impl ParticipantPolicy for AllowAllPolicy {
    fn is_participant(&self, _principal: &Principal, _channel: &str) -> bool {
        true
    }
}
