/**
 * In-Memory Store
 *
 * `ChatStore` over plain collections behind one `tokio::sync::RwLock`. Every
 * operation takes the lock once, so each call is a single atomic persist.
 *
 * Used when no `DATABASE_URL` is configured and throughout the test suite.
 * `set_unavailable(true)` makes every call fail with `StorageError`, which
 * lets tests check that failed writes are never broadcast.
 */
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

use crate::backend::error::BackendError;
use crate::backend::store::{ChatStore, StoreResult};
use crate::shared::message::{
    EditLogEntry, Message, MessageEdit, MessageId, MessageStatus, NewMessage, NewPrivateMessage,
    PrivateMessage, PrivateMessageId, RoomId,
};
use crate::shared::notification::{NewNotification, Notification};
use crate::shared::presence::UserPresence;
use crate::shared::reaction::{NewReaction, Reaction, ReactionTarget};

#[derive(Debug, Default)]
struct Tables {
    next_id: i64,
    last_timestamp: Option<DateTime<Utc>>,
    messages: BTreeMap<MessageId, Message>,
    private_messages: BTreeMap<PrivateMessageId, PrivateMessage>,
    edit_log: Vec<EditLogEntry>,
    presence: HashMap<String, UserPresence>,
    reactions: BTreeMap<i64, Reaction>,
    notifications: BTreeMap<i64, Notification>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    /// Wall-clock time, never earlier than the previous timestamp handed out
    fn now(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let ts = match self.last_timestamp {
            Some(last) if last > now => last,
            _ => now,
        };
        self.last_timestamp = Some(ts);
        ts
    }

    fn message_mut(&mut self, id: MessageId) -> StoreResult<&mut Message> {
        self.messages
            .get_mut(&id)
            .ok_or_else(|| BackendError::not_found("message", id))
    }
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
    unavailable: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an outage: every call fails with `StorageError` while set
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check(&self) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(BackendError::storage("in-memory store marked unavailable"));
        }
        Ok(())
    }
}

/// The last `limit` rows, keeping their order
fn last_page<T>(rows: Vec<T>, limit: u32) -> Vec<T> {
    let skip = rows.len().saturating_sub(limit as usize);
    rows.into_iter().skip(skip).collect()
}

fn is_pair(message: &PrivateMessage, a: &str, b: &str) -> bool {
    (message.sender_username == a && message.receiver_username == b)
        || (message.sender_username == b && message.receiver_username == a)
}

#[async_trait]
impl ChatStore for InMemoryStore {
    async fn create_message(&self, message: NewMessage) -> StoreResult<Message> {
        self.check()?;
        let mut tables = self.tables.write().await;
        let id = tables.next_id();
        let timestamp = tables.now();
        let message = Message {
            id,
            room_id: message.room_id,
            sender_username: message.sender_username,
            text: message.text,
            timestamp,
            edited_at: None,
            is_deleted: false,
            delete_reason: None,
            status: MessageStatus::Sent,
        };
        tables.messages.insert(id, message.clone());
        Ok(message)
    }

    async fn get_message(&self, id: MessageId) -> StoreResult<Message> {
        self.check()?;
        self.tables
            .read()
            .await
            .messages
            .get(&id)
            .cloned()
            .ok_or_else(|| BackendError::not_found("message", id))
    }

    async fn list_room_messages(&self, room: RoomId, limit: u32) -> StoreResult<Vec<Message>> {
        self.check()?;
        let tables = self.tables.read().await;
        let rows = tables
            .messages
            .values()
            .filter(|m| m.room_id == room && !m.is_deleted)
            .cloned()
            .collect();
        Ok(last_page(rows, limit))
    }

    async fn update_message_status(
        &self,
        ids: &[MessageId],
        status: MessageStatus,
    ) -> StoreResult<Vec<Message>> {
        self.check()?;
        let mut tables = self.tables.write().await;
        let mut moved = Vec::new();
        for id in ids {
            if let Some(message) = tables.messages.get_mut(id) {
                if message.is_deleted {
                    continue;
                }
                if let Some(next) = message.status.advance(status) {
                    message.status = next;
                    moved.push(message.clone());
                }
            }
        }
        Ok(moved)
    }

    async fn mark_room_seen(&self, room: RoomId, viewer: &str) -> StoreResult<Vec<MessageId>> {
        self.check()?;
        let mut tables = self.tables.write().await;
        let mut seen = Vec::new();
        for message in tables.messages.values_mut() {
            if message.room_id != room || message.is_deleted || message.sender_username == viewer {
                continue;
            }
            if let Some(next) = message.status.advance(MessageStatus::Seen) {
                message.status = next;
                seen.push(message.id);
            }
        }
        Ok(seen)
    }

    async fn apply_edit(&self, edit: MessageEdit) -> StoreResult<Message> {
        self.check()?;
        let mut tables = self.tables.write().await;
        let log_id = tables.next_id();

        let message = tables.message_mut(edit.message_id)?;
        if message.is_deleted {
            return Err(BackendError::not_found("message", edit.message_id));
        }
        let old_content = std::mem::replace(&mut message.text, edit.new_content.clone());
        message.edited_at = Some(edit.edited_at);
        message.status = MessageStatus::Sent;
        let updated = message.clone();

        tables.edit_log.push(EditLogEntry {
            id: log_id,
            message_id: edit.message_id,
            old_content,
            new_content: edit.new_content,
            edited_by: edit.edited_by,
            edit_reason: edit.edit_reason,
            edited_at: edit.edited_at,
        });
        Ok(updated)
    }

    async fn soft_delete(&self, id: MessageId, reason: &str) -> StoreResult<Message> {
        self.check()?;
        let mut tables = self.tables.write().await;
        let message = tables.message_mut(id)?;
        message.is_deleted = true;
        message.delete_reason = Some(reason.to_string());
        Ok(message.clone())
    }

    async fn edit_history(&self, id: MessageId) -> StoreResult<Vec<EditLogEntry>> {
        self.check()?;
        let tables = self.tables.read().await;
        if !tables.messages.contains_key(&id) {
            return Err(BackendError::not_found("message", id));
        }
        Ok(tables
            .edit_log
            .iter()
            .rev()
            .filter(|entry| entry.message_id == id)
            .cloned()
            .collect())
    }

    async fn create_private_message(&self, message: NewPrivateMessage) -> StoreResult<PrivateMessage> {
        self.check()?;
        let mut tables = self.tables.write().await;
        let id = tables.next_id();
        let timestamp = tables.now();
        let message = PrivateMessage {
            id,
            sender_username: message.sender_username,
            receiver_username: message.receiver_username,
            text: message.text,
            timestamp,
            edited_at: None,
            is_deleted: false,
            status: MessageStatus::Sent,
        };
        tables.private_messages.insert(id, message.clone());
        Ok(message)
    }

    async fn get_private_message(&self, id: PrivateMessageId) -> StoreResult<PrivateMessage> {
        self.check()?;
        self.tables
            .read()
            .await
            .private_messages
            .get(&id)
            .cloned()
            .ok_or_else(|| BackendError::not_found("private message", id))
    }

    async fn list_private_messages(
        &self,
        a: &str,
        b: &str,
        limit: u32,
    ) -> StoreResult<Vec<PrivateMessage>> {
        self.check()?;
        let tables = self.tables.read().await;
        let rows: Vec<PrivateMessage> = tables
            .private_messages
            .values()
            .filter(|m| !m.is_deleted && is_pair(m, a, b))
            .cloned()
            .collect();
        Ok(last_page(rows, limit))
    }

    async fn mark_private_seen(&self, viewer: &str, other: &str) -> StoreResult<Vec<PrivateMessageId>> {
        self.check()?;
        let mut tables = self.tables.write().await;
        let mut seen = Vec::new();
        for message in tables.private_messages.values_mut() {
            if message.sender_username != other || message.receiver_username != viewer {
                continue;
            }
            if let Some(next) = message.status.advance(MessageStatus::Seen) {
                message.status = next;
                seen.push(message.id);
            }
        }
        Ok(seen)
    }

    async fn set_user_presence(
        &self,
        username: &str,
        is_online: bool,
        last_seen: DateTime<Utc>,
    ) -> StoreResult<()> {
        self.check()?;
        self.tables.write().await.presence.insert(
            username.to_string(),
            UserPresence {
                username: username.to_string(),
                is_online,
                last_seen,
            },
        );
        Ok(())
    }

    async fn get_user_presence(&self, username: &str) -> StoreResult<UserPresence> {
        self.check()?;
        self.tables
            .read()
            .await
            .presence
            .get(username)
            .cloned()
            .ok_or_else(|| BackendError::not_found("user", username))
    }

    async fn mark_all_offline(&self) -> StoreResult<u64> {
        self.check()?;
        let mut tables = self.tables.write().await;
        let mut changed = 0;
        for presence in tables.presence.values_mut().filter(|p| p.is_online) {
            presence.is_online = false;
            changed += 1;
        }
        Ok(changed)
    }

    async fn create_reaction(&self, reaction: NewReaction) -> StoreResult<Reaction> {
        self.check()?;
        let mut tables = self.tables.write().await;
        let id = tables.next_id();
        let reacted_at = tables.now();
        let reaction = Reaction {
            id,
            reaction: reaction.reaction,
            reacted_by: reaction.reacted_by,
            reacted_at,
            target: reaction.target,
        };
        tables.reactions.insert(id, reaction.clone());
        Ok(reaction)
    }

    async fn get_reaction(&self, id: i64) -> StoreResult<Reaction> {
        self.check()?;
        self.tables
            .read()
            .await
            .reactions
            .get(&id)
            .cloned()
            .ok_or_else(|| BackendError::not_found("reaction", id))
    }

    async fn delete_reaction(&self, id: i64, owner: &str) -> StoreResult<Reaction> {
        self.check()?;
        let mut tables = self.tables.write().await;
        match tables.reactions.get(&id) {
            None => return Err(BackendError::not_found("reaction", id)),
            Some(existing) if existing.reacted_by != owner => {
                return Err(BackendError::permission_denied(
                    "only the reacting user may remove a reaction",
                ))
            }
            Some(_) => {}
        }
        tables
            .reactions
            .remove(&id)
            .ok_or_else(|| BackendError::not_found("reaction", id))
    }

    async fn list_reactions(&self, target: ReactionTarget) -> StoreResult<Vec<Reaction>> {
        self.check()?;
        Ok(self
            .tables
            .read()
            .await
            .reactions
            .values()
            .filter(|r| r.target == target)
            .cloned()
            .collect())
    }

    async fn create_notification(&self, notification: NewNotification) -> StoreResult<Notification> {
        self.check()?;
        let mut tables = self.tables.write().await;
        let id = tables.next_id();
        let created_at = tables.now();
        let notification = Notification {
            id,
            recipient_username: notification.recipient_username,
            content: notification.content,
            related_id: notification.related_id,
            is_read: false,
            created_at,
        };
        tables.notifications.insert(id, notification.clone());
        Ok(notification)
    }

    async fn list_notifications(&self, username: &str) -> StoreResult<Vec<Notification>> {
        self.check()?;
        Ok(self
            .tables
            .read()
            .await
            .notifications
            .values()
            .rev()
            .filter(|n| n.recipient_username == username)
            .cloned()
            .collect())
    }

    async fn mark_notification_read(&self, id: i64, username: &str) -> StoreResult<Notification> {
        self.check()?;
        let mut tables = self.tables.write().await;
        let notification = tables
            .notifications
            .get_mut(&id)
            .filter(|n| n.recipient_username == username)
            .ok_or_else(|| BackendError::not_found("notification", id))?;
        notification.is_read = true;
        Ok(notification.clone())
    }

    async fn mark_all_notifications_read(&self, username: &str) -> StoreResult<u64> {
        self.check()?;
        let mut tables = self.tables.write().await;
        let mut changed = 0;
        for notification in tables
            .notifications
            .values_mut()
            .filter(|n| n.recipient_username == username && !n.is_read)
        {
            notification.is_read = true;
            changed += 1;
        }
        Ok(changed)
    }
}
