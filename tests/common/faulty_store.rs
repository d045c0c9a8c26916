//! `ChatStore` wrapper with injectable faults
//!
//! Delegates to an `InMemoryStore`. Reads of a message can be slowed down to
//! widen race windows, and notification writes can be made to fail.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chatbox::backend::error::BackendError;
use chatbox::backend::store::{ChatStore, InMemoryStore, StoreResult};
use chatbox::shared::message::{
    EditLogEntry, Message, MessageEdit, MessageId, MessageStatus, NewMessage, NewPrivateMessage,
    PrivateMessage, PrivateMessageId, RoomId,
};
use chatbox::shared::notification::{NewNotification, Notification};
use chatbox::shared::presence::UserPresence;
use chatbox::shared::reaction::{NewReaction, Reaction, ReactionTarget};
use chrono::{DateTime, Utc};

pub struct FaultyStore {
    inner: Arc<InMemoryStore>,
    read_delay_ms: AtomicU64,
    fail_notifications: AtomicBool,
}

impl FaultyStore {
    pub fn new(inner: Arc<InMemoryStore>) -> Self {
        Self {
            inner,
            read_delay_ms: AtomicU64::new(0),
            fail_notifications: AtomicBool::new(false),
        }
    }

    /// Delay every `get_message` by `delay`
    pub fn slow_reads(&self, delay: Duration) {
        self.read_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn fail_notifications(&self, fail: bool) {
        self.fail_notifications.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ChatStore for FaultyStore {
    async fn create_message(&self, message: NewMessage) -> StoreResult<Message> {
        self.inner.create_message(message).await
    }

    async fn get_message(&self, id: MessageId) -> StoreResult<Message> {
        let delay = self.read_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        self.inner.get_message(id).await
    }

    async fn list_room_messages(&self, room: RoomId, limit: u32) -> StoreResult<Vec<Message>> {
        self.inner.list_room_messages(room, limit).await
    }

    async fn update_message_status(
        &self,
        ids: &[MessageId],
        status: MessageStatus,
    ) -> StoreResult<Vec<Message>> {
        self.inner.update_message_status(ids, status).await
    }

    async fn mark_room_seen(&self, room: RoomId, viewer: &str) -> StoreResult<Vec<MessageId>> {
        self.inner.mark_room_seen(room, viewer).await
    }

    async fn apply_edit(&self, edit: MessageEdit) -> StoreResult<Message> {
        self.inner.apply_edit(edit).await
    }

    async fn soft_delete(&self, id: MessageId, reason: &str) -> StoreResult<Message> {
        self.inner.soft_delete(id, reason).await
    }

    async fn edit_history(&self, id: MessageId) -> StoreResult<Vec<EditLogEntry>> {
        self.inner.edit_history(id).await
    }

    async fn create_private_message(&self, message: NewPrivateMessage) -> StoreResult<PrivateMessage> {
        self.inner.create_private_message(message).await
    }

    async fn get_private_message(&self, id: PrivateMessageId) -> StoreResult<PrivateMessage> {
        self.inner.get_private_message(id).await
    }

    async fn list_private_messages(
        &self,
        a: &str,
        b: &str,
        limit: u32,
    ) -> StoreResult<Vec<PrivateMessage>> {
        self.inner.list_private_messages(a, b, limit).await
    }

    async fn mark_private_seen(&self, viewer: &str, other: &str) -> StoreResult<Vec<PrivateMessageId>> {
        self.inner.mark_private_seen(viewer, other).await
    }

    async fn set_user_presence(
        &self,
        username: &str,
        is_online: bool,
        last_seen: DateTime<Utc>,
    ) -> StoreResult<()> {
        self.inner.set_user_presence(username, is_online, last_seen).await
    }

    async fn get_user_presence(&self, username: &str) -> StoreResult<UserPresence> {
        self.inner.get_user_presence(username).await
    }

    async fn mark_all_offline(&self) -> StoreResult<u64> {
        self.inner.mark_all_offline().await
    }

    async fn create_reaction(&self, reaction: NewReaction) -> StoreResult<Reaction> {
        self.inner.create_reaction(reaction).await
    }

    async fn get_reaction(&self, id: i64) -> StoreResult<Reaction> {
        self.inner.get_reaction(id).await
    }

    async fn delete_reaction(&self, id: i64, owner: &str) -> StoreResult<Reaction> {
        self.inner.delete_reaction(id, owner).await
    }

    async fn list_reactions(&self, target: ReactionTarget) -> StoreResult<Vec<Reaction>> {
        self.inner.list_reactions(target).await
    }

    async fn create_notification(&self, notification: NewNotification) -> StoreResult<Notification> {
        if self.fail_notifications.load(Ordering::SeqCst) {
            return Err(BackendError::storage("notification table unavailable"));
        }
        self.inner.create_notification(notification).await
    }

    async fn list_notifications(&self, username: &str) -> StoreResult<Vec<Notification>> {
        self.inner.list_notifications(username).await
    }

    async fn mark_notification_read(&self, id: i64, username: &str) -> StoreResult<Notification> {
        self.inner.mark_notification_read(id, username).await
    }

    async fn mark_all_notifications_read(&self, username: &str) -> StoreResult<u64> {
        self.inner.mark_all_notifications_read(username).await
    }
}
