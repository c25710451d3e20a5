//! Subscription pattern matching over channel strings.
//!
//! A pattern is either an exact channel (`presence.u1`) or a wildcard
//! pattern whose final segment is `*` (`presence.*`). Wildcard matching is
//! plain prefix comparison so per-event matching cost stays bounded; no
//! regular expressions.

use std::fmt;

use serde::{Deserialize, Serialize};

use pulse_core::error::AppError;

use super::name::ChannelFamily;

/// A validated subscription matching rule over channels.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChannelPattern {
    raw: String,
    kind: PatternKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
enum PatternKind {
    /// Matches one channel string exactly.
    Exact,
    /// Matches every channel starting with the stored prefix
    /// (including the trailing `.`).
    Wildcard(String),
}

impl ChannelPattern {
    /// Parses and validates a pattern string.
    ///
    /// `*` may only appear as the entire final segment. Empty segments
    /// are rejected.
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        if raw.is_empty() {
            return Err(AppError::validation("Channel pattern must not be empty"));
        }

        let segments: Vec<&str> = raw.split('.').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(AppError::validation(format!(
                "Channel pattern '{raw}' contains an empty segment"
            )));
        }

        let wildcards = segments.iter().filter(|s| s.contains('*')).count();
        match wildcards {
            0 => Ok(Self {
                raw: raw.to_string(),
                kind: PatternKind::Exact,
            }),
            1 if *segments.last().unwrap() == "*" && segments.len() > 1 => {
                let prefix = raw[..raw.len() - 1].to_string();
                Ok(Self {
                    raw: raw.to_string(),
                    kind: PatternKind::Wildcard(prefix),
                })
            }
            _ => Err(AppError::validation(format!(
                "Channel pattern '{raw}': '*' is only allowed as the final segment"
            ))),
        }
    }

    /// Whether this pattern matches the given published channel.
    pub fn matches(&self, channel: &str) -> bool {
        match &self.kind {
            PatternKind::Exact => self.raw == channel,
            PatternKind::Wildcard(prefix) => {
                channel.len() > prefix.len() && channel.starts_with(prefix.as_str())
            }
        }
    }

    /// The channel family this pattern subscribes to, if recognized.
    pub fn family(&self) -> Option<ChannelFamily> {
        ChannelFamily::of(&self.raw)
    }

    /// The original pattern string.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether this is a wildcard pattern.
    pub fn is_wildcard(&self) -> bool {
        matches!(self.kind, PatternKind::Wildcard(_))
    }
}

impl fmt::Display for ChannelPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl TryFrom<String> for ChannelPattern {
    type Error = AppError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(&raw)
    }
}

impl From<ChannelPattern> for String {
    fn from(pattern: ChannelPattern) -> String {
        pattern.raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_pattern_matches_only_itself() {
        let pattern = ChannelPattern::parse("presence.userABC").unwrap();
        assert!(pattern.matches("presence.userABC"));
        assert!(!pattern.matches("presence.user123"));
        assert!(!pattern.matches("presence.userABCD"));
    }

    #[test]
    fn test_wildcard_pattern_matches_family_members() {
        let pattern = ChannelPattern::parse("presence.*").unwrap();
        assert!(pattern.is_wildcard());
        assert!(pattern.matches("presence.user123"));
        assert!(pattern.matches("presence.u1"));
        assert!(!pattern.matches("presence."));
        assert!(!pattern.matches("presence"));
        assert!(!pattern.matches("contacts.u1.presence"));
    }

    #[test]
    fn test_wildcard_only_in_final_segment() {
        assert!(ChannelPattern::parse("*.u1").is_err());
        assert!(ChannelPattern::parse("presence.*.status").is_err());
        assert!(ChannelPattern::parse("presence.u*").is_err());
        assert!(ChannelPattern::parse("*").is_err());
    }

    #[test]
    fn test_empty_segments_rejected() {
        assert!(ChannelPattern::parse("").is_err());
        assert!(ChannelPattern::parse("presence.").is_err());
        assert!(ChannelPattern::parse(".presence").is_err());
        assert!(ChannelPattern::parse("contacts..presence").is_err());
    }

    #[test]
    fn test_family_resolution() {
        let pattern = ChannelPattern::parse("friendStatus.u1").unwrap();
        assert_eq!(pattern.family(), Some(ChannelFamily::FriendStatus));
        let unknown = ChannelPattern::parse("custom.topic").unwrap();
        assert_eq!(unknown.family(), None);
    }
}
