//! Channel name definitions and parsing.
//!
//! The bus distinguishes these exact channel strings:
//!
//! - `messageReceived.<conversationId>`
//! - `typingStatus.<conversationId>`
//! - `messageStatus.<conversationId>`
//! - `participantChanged.<conversationId>`
//! - `presence.<userId>`
//! - `activity.<userId>`
//! - `friendStatus.<userId>`
//! - `contacts.<userId>.presence`

use serde::{Deserialize, Serialize};

use pulse_core::types::{ConversationId, UserId};

/// The channel family a subscription pattern or published channel
/// belongs to. Families drive the subscription catalog lookup (which
/// filters and result mapper apply).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChannelFamily {
    /// New message in a conversation.
    MessageReceived,
    /// Typing indicator changes in a conversation.
    TypingStatus,
    /// Delivery/read receipt changes in a conversation.
    MessageStatus,
    /// Membership changes in a conversation.
    ParticipantChanged,
    /// A user's presence changed.
    Presence,
    /// A user's activity changed.
    Activity,
    /// A friendship status changed for a user.
    FriendStatus,
    /// Contact-list-facing presence digest for a user.
    ContactsPresence,
}

impl ChannelFamily {
    /// Identifies the family of a channel or subscription pattern string.
    ///
    /// Only the structural segments are inspected; the id segment may be
    /// any non-empty string (or a `*` wildcard).
    pub fn of(channel: &str) -> Option<Self> {
        let segments: Vec<&str> = channel.split('.').collect();
        match segments.as_slice() {
            ["messageReceived", id] if !id.is_empty() => Some(Self::MessageReceived),
            ["typingStatus", id] if !id.is_empty() => Some(Self::TypingStatus),
            ["messageStatus", id] if !id.is_empty() => Some(Self::MessageStatus),
            ["participantChanged", id] if !id.is_empty() => Some(Self::ParticipantChanged),
            ["presence", id] if !id.is_empty() => Some(Self::Presence),
            ["activity", id] if !id.is_empty() => Some(Self::Activity),
            ["friendStatus", id] if !id.is_empty() => Some(Self::FriendStatus),
            ["contacts", id, "presence"] if !id.is_empty() => Some(Self::ContactsPresence),
            _ => None,
        }
    }
}

/// Typed channel identifiers, used by publishers to build exact
/// channel strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelName {
    /// New message in a conversation.
    MessageReceived(ConversationId),
    /// Typing indicator changes in a conversation.
    TypingStatus(ConversationId),
    /// Delivery/read receipt changes in a conversation.
    MessageStatus(ConversationId),
    /// Membership changes in a conversation.
    ParticipantChanged(ConversationId),
    /// A user's presence changed.
    Presence(UserId),
    /// A user's activity changed.
    Activity(UserId),
    /// Friendship status changed for a user.
    FriendStatus(UserId),
    /// Contact-list-facing presence digest for a user.
    ContactsPresence(UserId),
}

impl ChannelName {
    /// Converts to the exact channel string the bus distinguishes.
    pub fn to_channel_string(&self) -> String {
        match self {
            Self::MessageReceived(id) => format!("messageReceived.{id}"),
            Self::TypingStatus(id) => format!("typingStatus.{id}"),
            Self::MessageStatus(id) => format!("messageStatus.{id}"),
            Self::ParticipantChanged(id) => format!("participantChanged.{id}"),
            Self::Presence(id) => format!("presence.{id}"),
            Self::Activity(id) => format!("activity.{id}"),
            Self::FriendStatus(id) => format!("friendStatus.{id}"),
            Self::ContactsPresence(id) => format!("contacts.{id}.presence"),
        }
    }

    /// The family this channel belongs to.
    pub fn family(&self) -> ChannelFamily {
        match self {
            Self::MessageReceived(_) => ChannelFamily::MessageReceived,
            Self::TypingStatus(_) => ChannelFamily::TypingStatus,
            Self::MessageStatus(_) => ChannelFamily::MessageStatus,
            Self::ParticipantChanged(_) => ChannelFamily::ParticipantChanged,
            Self::Presence(_) => ChannelFamily::Presence,
            Self::Activity(_) => ChannelFamily::Activity,
            Self::FriendStatus(_) => ChannelFamily::FriendStatus,
            Self::ContactsPresence(_) => ChannelFamily::ContactsPresence,
        }
    }
}
