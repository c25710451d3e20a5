//! Domain-facing event publisher.
//!
//! The API other chat services call to put facts on the bus. Channel
//! strings are always built through [`ChannelName`] so publishers and the
//! subscription catalog agree on naming.

use std::sync::Arc;

use serde_json::Value;

use pulse_core::error::AppError;
use pulse_core::event::Event;
use pulse_core::types::{ConversationId, UserId};

use crate::bus::EventBus;
use crate::channel::ChannelName;

/// Publishes domain events onto the shared bus.
#[derive(Debug, Clone)]
pub struct EventPublisher {
    bus: Arc<dyn EventBus>,
}

impl EventPublisher {
    /// Creates a publisher over the given bus.
    pub fn new(bus: Arc<dyn EventBus>) -> Self {
        Self { bus }
    }

    /// A new message arrived in a conversation.
    pub async fn message_received(
        &self,
        conversation_id: ConversationId,
        sender: UserId,
        payload: Value,
    ) -> Result<(), AppError> {
        self.publish(
            ChannelName::MessageReceived(conversation_id),
            payload,
            Some(sender),
        )
        .await
    }

    /// A participant's typing indicator changed.
    pub async fn typing_status(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
        payload: Value,
    ) -> Result<(), AppError> {
        self.publish(
            ChannelName::TypingStatus(conversation_id),
            payload,
            Some(user_id),
        )
        .await
    }

    /// A message's delivery/read status changed.
    pub async fn message_status(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
        payload: Value,
    ) -> Result<(), AppError> {
        self.publish(
            ChannelName::MessageStatus(conversation_id),
            payload,
            Some(user_id),
        )
        .await
    }

    /// Conversation membership changed.
    pub async fn participant_changed(
        &self,
        conversation_id: ConversationId,
        actor: UserId,
        payload: Value,
    ) -> Result<(), AppError> {
        self.publish(
            ChannelName::ParticipantChanged(conversation_id),
            payload,
            Some(actor),
        )
        .await
    }

    /// A user's presence changed. Published both to the user's own
    /// presence channel and to the contact-facing digest channel — a
    /// fixed two-channel fan-out derived from the event.
    pub async fn presence_changed(&self, user_id: UserId, payload: Value) -> Result<(), AppError> {
        self.publish(
            ChannelName::Presence(user_id),
            payload.clone(),
            Some(user_id),
        )
        .await?;
        self.publish(
            ChannelName::ContactsPresence(user_id),
            payload,
            Some(user_id),
        )
        .await
    }

    /// A user's activity changed.
    pub async fn activity_changed(&self, user_id: UserId, payload: Value) -> Result<(), AppError> {
        self.publish(ChannelName::Activity(user_id), payload, Some(user_id))
            .await
    }

    /// A friendship status changed between two users. Published once per
    /// participant channel so each side's subscribers receive exactly one
    /// copy — an explicit, bounded fan-out list, not a generic graph.
    pub async fn friend_status_changed(
        &self,
        actor: UserId,
        other: UserId,
        payload: Value,
    ) -> Result<(), AppError> {
        self.publish(
            ChannelName::FriendStatus(actor),
            payload.clone(),
            Some(actor),
        )
        .await?;
        self.publish(ChannelName::FriendStatus(other), payload, Some(actor))
            .await
    }

    async fn publish(
        &self,
        channel: ChannelName,
        payload: Value,
        origin: Option<UserId>,
    ) -> Result<(), AppError> {
        let mut event = Event::new(channel.to_channel_string(), payload);
        if let Some(origin) = origin {
            event = event.with_origin(origin);
        }
        self.bus.publish(event).await
    }
}
