//! Durable Store
//!
//! `ChatStore` is the system of record for messages, private messages,
//! presence, reactions and notifications. The real-time core depends only on
//! this trait and never on a concrete database.
//!
//! # Implementations
//!
//! - **`memory`** - `InMemoryStore`, used when no `DATABASE_URL` is configured and in tests
//! - **`postgres`** - `PgStore`, backed by `sqlx::PgPool`
//!
//! # Contract
//!
//! Every method is one atomic persist: a batch status transition or an edit
//! plus its log entry either lands entirely or not at all. Lookups of a
//! missing id return `BackendError::NotFound`; ownership violations return
//! `BackendError::PermissionDenied`; anything else is `BackendError::StorageError`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::backend::error::BackendError;
use crate::shared::message::{
    EditLogEntry, Message, MessageEdit, MessageId, MessageStatus, NewMessage, NewPrivateMessage,
    PrivateMessage, PrivateMessageId, RoomId,
};
use crate::shared::notification::{NewNotification, Notification};
use crate::shared::presence::UserPresence;
use crate::shared::reaction::{NewReaction, Reaction, ReactionTarget};

/// In-memory store
pub mod memory;

/// PostgreSQL store
pub mod postgres;

pub use memory::InMemoryStore;
pub use postgres::PgStore;

pub type StoreResult<T> = Result<T, BackendError>;

#[async_trait]
pub trait ChatStore: Send + Sync {
    // Room messages

    /// Persist a new message with status `Sent`
    async fn create_message(&self, message: NewMessage) -> StoreResult<Message>;

    /// Fetch one message; soft-deleted messages are still returned
    async fn get_message(&self, id: MessageId) -> StoreResult<Message>;

    /// Newest `limit` non-deleted messages of a room, oldest first
    async fn list_room_messages(&self, room: RoomId, limit: u32) -> StoreResult<Vec<Message>>;

    /// Move the given non-deleted messages forward to `status`.
    ///
    /// Messages already at or beyond `status` are left untouched. Returns the
    /// messages that actually moved.
    async fn update_message_status(
        &self,
        ids: &[MessageId],
        status: MessageStatus,
    ) -> StoreResult<Vec<Message>>;

    /// Mark every non-deleted message in `room` not sent by `viewer` and not
    /// yet `Seen` as `Seen`. Returns the affected ids.
    async fn mark_room_seen(&self, room: RoomId, viewer: &str) -> StoreResult<Vec<MessageId>>;

    /// Apply an edit: new text, `edited_at`, status back to `Sent`, plus an
    /// appended edit-log entry.
    async fn apply_edit(&self, edit: MessageEdit) -> StoreResult<Message>;

    /// Flag a message deleted, keeping its content
    async fn soft_delete(&self, id: MessageId, reason: &str) -> StoreResult<Message>;

    /// Edit log of a message, newest first
    async fn edit_history(&self, id: MessageId) -> StoreResult<Vec<EditLogEntry>>;

    // Private messages

    async fn create_private_message(&self, message: NewPrivateMessage) -> StoreResult<PrivateMessage>;

    async fn get_private_message(&self, id: PrivateMessageId) -> StoreResult<PrivateMessage>;

    /// Newest `limit` messages exchanged between `a` and `b`, oldest first
    async fn list_private_messages(
        &self,
        a: &str,
        b: &str,
        limit: u32,
    ) -> StoreResult<Vec<PrivateMessage>>;

    /// Mark messages from `other` to `viewer` as `Seen`. Returns the affected ids.
    async fn mark_private_seen(&self, viewer: &str, other: &str) -> StoreResult<Vec<PrivateMessageId>>;

    // Presence

    async fn set_user_presence(
        &self,
        username: &str,
        is_online: bool,
        last_seen: DateTime<Utc>,
    ) -> StoreResult<()>;

    async fn get_user_presence(&self, username: &str) -> StoreResult<UserPresence>;

    /// Reset every user to offline. Returns how many rows changed.
    async fn mark_all_offline(&self) -> StoreResult<u64>;

    // Reactions

    async fn create_reaction(&self, reaction: NewReaction) -> StoreResult<Reaction>;

    async fn get_reaction(&self, id: i64) -> StoreResult<Reaction>;

    /// Delete a reaction owned by `owner`
    async fn delete_reaction(&self, id: i64, owner: &str) -> StoreResult<Reaction>;

    async fn list_reactions(&self, target: ReactionTarget) -> StoreResult<Vec<Reaction>>;

    // Notifications

    async fn create_notification(&self, notification: NewNotification) -> StoreResult<Notification>;

    /// Notifications for `username`, newest first
    async fn list_notifications(&self, username: &str) -> StoreResult<Vec<Notification>>;

    async fn mark_notification_read(&self, id: i64, username: &str) -> StoreResult<Notification>;

    async fn mark_all_notifications_read(&self, username: &str) -> StoreResult<u64>;
}

#[cfg(test)]
impl std::fmt::Debug for dyn ChatStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn ChatStore")
    }
}
