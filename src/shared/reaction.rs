//! Reactions on room messages and private messages.
//!
//! A reaction belongs to exactly one parent. The parent is a tagged union,
//! [`ReactionTarget`], so "both" and "neither" cannot be represented once a
//! request has been accepted. The wire format still carries two optional ids
//! and is converted with [`ReactionTarget::from_parts`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::SharedError;
use crate::shared::message::{MessageId, PrivateMessageId};

/// Maximum reaction length in characters (one emoji sequence or short code)
pub const MAX_REACTION_LENGTH: usize = 64;

/// The single parent a reaction is attached to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "kind", content = "id", rename_all = "camelCase")]
pub enum ReactionTarget {
    RoomMessage(MessageId),
    PrivateMessage(PrivateMessageId),
}

impl ReactionTarget {
    /// Build a target from the two optional parent ids of a request.
    ///
    /// Exactly one of them must be set.
    pub fn from_parts(
        message_id: Option<MessageId>,
        private_message_id: Option<PrivateMessageId>,
    ) -> Result<Self, SharedError> {
        match (message_id, private_message_id) {
            (Some(id), None) => Ok(Self::RoomMessage(id)),
            (None, Some(id)) => Ok(Self::PrivateMessage(id)),
            (Some(_), Some(_)) => Err(SharedError::invalid_target(
                "a reaction cannot target a message and a private message at once",
            )),
            (None, None) => Err(SharedError::invalid_target(
                "a reaction must target a message or a private message",
            )),
        }
    }

    /// Split back into the `(messageId, privateMessageId)` pair used on the wire
    pub fn into_parts(self) -> (Option<MessageId>, Option<PrivateMessageId>) {
        match self {
            Self::RoomMessage(id) => (Some(id), None),
            Self::PrivateMessage(id) => (None, Some(id)),
        }
    }
}

/// A persisted reaction
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Reaction {
    pub id: i64,
    pub reaction: String,
    pub reacted_by: String,
    pub reacted_at: DateTime<Utc>,
    pub target: ReactionTarget,
}

/// A validated reaction about to be persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReaction {
    pub reaction: String,
    pub reacted_by: String,
    pub target: ReactionTarget,
}

/// Inbound reaction request as sent by clients
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReactionRequest {
    pub reaction: String,
    #[serde(default)]
    pub message_id: Option<MessageId>,
    #[serde(default)]
    pub private_message_id: Option<PrivateMessageId>,
}

impl ReactionRequest {
    /// Validate the request on behalf of `actor`.
    ///
    /// The target is checked first so an ambiguous parent is reported as
    /// `InvalidTarget` even when the emoji is also malformed.
    pub fn into_new_reaction(self, actor: impl Into<String>) -> Result<NewReaction, SharedError> {
        let target = ReactionTarget::from_parts(self.message_id, self.private_message_id)?;

        let reaction = self.reaction.trim().to_string();
        let length = reaction.chars().count();
        if length == 0 || length > MAX_REACTION_LENGTH {
            return Err(SharedError::validation(
                "reaction",
                format!("Reaction must be 1-{MAX_REACTION_LENGTH} characters"),
            ));
        }

        Ok(NewReaction {
            reaction,
            reacted_by: actor.into(),
            target,
        })
    }
}
