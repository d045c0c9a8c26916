//! Chat Message Data Structures
//!
//! Room-scoped messages, user-pair-scoped private messages, their delivery
//! status and the append-only edit log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::shared::error::SharedError;

pub type RoomId = i64;
pub type MessageId = i64;
pub type PrivateMessageId = i64;

/// Longest message body accepted, in characters
pub const MAX_TEXT_LENGTH: usize = 4_000;

/// Reason recorded when an edit or delete does not supply one
pub const DEFAULT_REASON: &str = "No reason provided";

/// Delivery status of a persisted message.
///
/// Variants are declared in lifecycle order so the derived `Ord` is the
/// lifecycle order: `Sent < Delivered < Seen`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MessageStatus {
    Sent,
    Delivered,
    Seen,
}

impl MessageStatus {
    /// Transition to `next` if it moves the status forward.
    ///
    /// Returns `None` for a backward or no-op transition; status never regresses.
    pub fn advance(self, next: MessageStatus) -> Option<MessageStatus> {
        (next > self).then_some(next)
    }

    /// Numeric rank used for storage; comparisons on the rank match `Ord`.
    pub fn rank(self) -> i16 {
        match self {
            Self::Sent => 0,
            Self::Delivered => 1,
            Self::Seen => 2,
        }
    }

    pub fn from_rank(rank: i16) -> Option<Self> {
        match rank {
            0 => Some(Self::Sent),
            1 => Some(Self::Delivered),
            2 => Some(Self::Seen),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sent => "Sent",
            Self::Delivered => "Delivered",
            Self::Seen => "Seen",
        }
    }
}

impl fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageStatus {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sent" => Ok(Self::Sent),
            "delivered" => Ok(Self::Delivered),
            "seen" => Ok(Self::Seen),
            other => Err(SharedError::validation(
                "status",
                format!("unknown message status '{other}'"),
            )),
        }
    }
}

/// A message posted to a room
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub room_id: RoomId,
    pub sender_username: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub edited_at: Option<DateTime<Utc>>,
    pub is_deleted: bool,
    pub delete_reason: Option<String>,
    pub status: MessageStatus,
}

/// A message between exactly two users
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PrivateMessage {
    pub id: PrivateMessageId,
    pub sender_username: String,
    pub receiver_username: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub edited_at: Option<DateTime<Utc>>,
    pub is_deleted: bool,
    pub status: MessageStatus,
}

impl PrivateMessage {
    /// Both participants, sender first
    pub fn participants(&self) -> [&str; 2] {
        [&self.sender_username, &self.receiver_username]
    }
}

/// Input for creating a room message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub room_id: RoomId,
    pub sender_username: String,
    pub text: String,
}

impl NewMessage {
    pub fn new(
        room_id: RoomId,
        sender_username: impl Into<String>,
        text: impl Into<String>,
    ) -> Result<Self, SharedError> {
        let text = text.into();
        validate_text(&text)?;
        Ok(Self {
            room_id,
            sender_username: sender_username.into(),
            text,
        })
    }
}

/// Input for creating a private message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPrivateMessage {
    pub sender_username: String,
    pub receiver_username: String,
    pub text: String,
}

impl NewPrivateMessage {
    pub fn new(
        sender_username: impl Into<String>,
        receiver_username: impl Into<String>,
        text: impl Into<String>,
    ) -> Result<Self, SharedError> {
        let sender_username = sender_username.into();
        let receiver_username = receiver_username.into();
        let text = text.into();

        if receiver_username.trim().is_empty() {
            return Err(SharedError::validation("receiverUsername", "Receiver is required"));
        }
        if receiver_username == sender_username {
            return Err(SharedError::validation(
                "receiverUsername",
                "Cannot send a private message to yourself",
            ));
        }
        validate_text(&text)?;

        Ok(Self {
            sender_username,
            receiver_username,
            text,
        })
    }
}

/// One immutable record of a message edit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EditLogEntry {
    pub id: i64,
    pub message_id: MessageId,
    pub old_content: String,
    pub new_content: String,
    pub edited_by: String,
    pub edit_reason: String,
    pub edited_at: DateTime<Utc>,
}

/// An edit about to be applied; becomes an `EditLogEntry` once persisted.
///
/// The replaced text is read by the store inside the same write that applies
/// the edit, so it is not part of the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageEdit {
    pub message_id: MessageId,
    pub new_content: String,
    pub edited_by: String,
    pub edit_reason: String,
    pub edited_at: DateTime<Utc>,
}

impl MessageEdit {
    /// Build an edit of `message_id` by `editor`. Ownership is checked by the caller.
    pub fn new(
        message_id: MessageId,
        editor: impl Into<String>,
        new_content: impl Into<String>,
        reason: Option<String>,
    ) -> Result<Self, SharedError> {
        let new_content = new_content.into();
        validate_text(&new_content)?;
        Ok(Self {
            message_id,
            new_content,
            edited_by: editor.into(),
            edit_reason: normalize_reason(reason),
            edited_at: Utc::now(),
        })
    }
}

/// Blank or missing reasons become [`DEFAULT_REASON`]
pub fn normalize_reason(reason: Option<String>) -> String {
    reason
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
        .unwrap_or_else(|| DEFAULT_REASON.to_string())
}

fn validate_text(text: &str) -> Result<(), SharedError> {
    if text.trim().is_empty() {
        return Err(SharedError::validation("text", "Message text cannot be empty"));
    }
    if text.chars().count() > MAX_TEXT_LENGTH {
        return Err(SharedError::validation(
            "text",
            format!("Message text exceeds {MAX_TEXT_LENGTH} characters"),
        ));
    }
    Ok(())
}
