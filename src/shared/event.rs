/**
 * Real-time Event System
 *
 * This module defines the events pushed to live connections. Each event has a
 * name (the `EventType`, serialized exactly as clients subscribe to it), a
 * JSON payload and the time it was produced.
 *
 * # Wire Format
 *
 * ```json
 * { "event": "ReceiveMessage", "payload": { "id": 1, "roomId": 7, ... }, "timestamp": "..." }
 * ```
 *
 * Payload keys are camelCase to match the REST responses.
 */
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::shared::message::{Message, MessageId, PrivateMessage, PrivateMessageId, RoomId};
use crate::shared::notification::Notification;
use crate::shared::reaction::Reaction;

/// Name of a real-time event
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum EventType {
    /// New room message
    ReceiveMessage,
    /// New private message
    ReceivePrivateMessage,
    MessageEdited,
    MessageDeleted,
    MessagesDelivered,
    /// Batch seen-receipt for a room
    MessagesSeen,
    PrivateMessagesSeen,
    ReactionAdded,
    ReactionRemoved,
    UserJoined,
    UserLeft,
    UserTyping,
    /// Presence transition to online
    UserConnected,
    /// Presence transition to offline
    UserDisconnected,
    ReceiveNotification,
    /// A client command failed; sent only to the issuing connection
    CommandRejected,
}

impl EventType {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ReceiveMessage => "ReceiveMessage",
            Self::ReceivePrivateMessage => "ReceivePrivateMessage",
            Self::MessageEdited => "MessageEdited",
            Self::MessageDeleted => "MessageDeleted",
            Self::MessagesDelivered => "MessagesDelivered",
            Self::MessagesSeen => "MessagesSeen",
            Self::PrivateMessagesSeen => "PrivateMessagesSeen",
            Self::ReactionAdded => "ReactionAdded",
            Self::ReactionRemoved => "ReactionRemoved",
            Self::UserJoined => "UserJoined",
            Self::UserLeft => "UserLeft",
            Self::UserTyping => "UserTyping",
            Self::UserConnected => "UserConnected",
            Self::UserDisconnected => "UserDisconnected",
            Self::ReceiveNotification => "ReceiveNotification",
            Self::CommandRejected => "CommandRejected",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Real-time event delivered to one or more connections
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RealtimeEvent {
    /// Type of event
    #[serde(rename = "event")]
    pub event_type: EventType,
    /// Event payload (JSON-serializable data)
    pub payload: serde_json::Value,
    /// Timestamp when event occurred (RFC3339)
    pub timestamp: String,
}

impl RealtimeEvent {
    /// Create a new real-time event
    pub fn new(event_type: EventType, payload: serde_json::Value) -> Self {
        Self {
            event_type,
            payload,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// A room message was persisted
    pub fn receive_message(message: &Message) -> Self {
        Self::new(
            EventType::ReceiveMessage,
            json!({
                "id": message.id,
                "roomId": message.room_id,
                "username": message.sender_username,
                "text": message.text,
                "timestamp": message.timestamp,
                "status": message.status,
            }),
        )
    }

    pub fn receive_private_message(message: &PrivateMessage) -> Self {
        Self::new(
            EventType::ReceivePrivateMessage,
            json!({
                "id": message.id,
                "sender": message.sender_username,
                "receiver": message.receiver_username,
                "text": message.text,
                "timestamp": message.timestamp,
                "status": message.status,
            }),
        )
    }

    pub fn message_edited(message: &Message, edited_by: &str) -> Self {
        Self::new(
            EventType::MessageEdited,
            json!({
                "id": message.id,
                "roomId": message.room_id,
                "text": message.text,
                "editedAt": message.edited_at,
                "editedBy": edited_by,
                "status": message.status,
            }),
        )
    }

    pub fn message_deleted(id: MessageId, room_id: RoomId, reason: &str) -> Self {
        Self::new(
            EventType::MessageDeleted,
            json!({ "id": id, "roomId": room_id, "reason": reason }),
        )
    }

    pub fn messages_delivered(room_id: RoomId, message_ids: &[MessageId]) -> Self {
        Self::new(
            EventType::MessagesDelivered,
            json!({ "roomId": room_id, "messageIds": message_ids }),
        )
    }

    /// Batch seen-receipt: one event for every message moved to `Seen`
    pub fn messages_seen(room_id: RoomId, username: &str, message_ids: &[MessageId]) -> Self {
        Self::new(
            EventType::MessagesSeen,
            json!({ "roomId": room_id, "username": username, "messageIds": message_ids }),
        )
    }

    pub fn private_messages_seen(
        viewer: &str,
        other: &str,
        message_ids: &[PrivateMessageId],
    ) -> Self {
        Self::new(
            EventType::PrivateMessagesSeen,
            json!({ "username": viewer, "otherUser": other, "messageIds": message_ids }),
        )
    }

    pub fn reaction_added(reaction: &Reaction) -> Self {
        Self::new(EventType::ReactionAdded, reaction_payload(reaction))
    }

    pub fn reaction_removed(reaction: &Reaction) -> Self {
        Self::new(EventType::ReactionRemoved, reaction_payload(reaction))
    }

    pub fn user_joined(room_id: RoomId, username: &str) -> Self {
        Self::new(
            EventType::UserJoined,
            json!({ "roomId": room_id, "username": username }),
        )
    }

    pub fn user_left(room_id: RoomId, username: &str) -> Self {
        Self::new(
            EventType::UserLeft,
            json!({ "roomId": room_id, "username": username }),
        )
    }

    /// Create a typing event
    pub fn typing(room_id: RoomId, username: &str, is_typing: bool) -> Self {
        Self::new(
            EventType::UserTyping,
            json!({ "roomId": room_id, "username": username, "isTyping": is_typing }),
        )
    }

    pub fn user_connected(username: &str, last_seen: chrono::DateTime<chrono::Utc>) -> Self {
        Self::new(
            EventType::UserConnected,
            json!({ "username": username, "isOnline": true, "lastSeen": last_seen }),
        )
    }

    pub fn user_disconnected(username: &str, last_seen: chrono::DateTime<chrono::Utc>) -> Self {
        Self::new(
            EventType::UserDisconnected,
            json!({ "username": username, "isOnline": false, "lastSeen": last_seen }),
        )
    }

    /// Create a notification event
    pub fn notification(notification: &Notification) -> Self {
        Self::new(
            EventType::ReceiveNotification,
            json!({
                "id": notification.id,
                "content": notification.content,
                "relatedId": notification.related_id,
                "createdAt": notification.created_at,
            }),
        )
    }

    pub fn command_rejected(command: &str, error: &str, status: u16) -> Self {
        Self::new(
            EventType::CommandRejected,
            json!({ "command": command, "error": error, "status": status }),
        )
    }
}

fn reaction_payload(reaction: &Reaction) -> serde_json::Value {
    let (message_id, private_message_id) = reaction.target.into_parts();
    json!({
        "id": reaction.id,
        "reaction": reaction.reaction,
        "reactedBy": reaction.reacted_by,
        "reactedAt": reaction.reacted_at,
        "messageId": message_id,
        "privateMessageId": private_message_id,
    })
}
