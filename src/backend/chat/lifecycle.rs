/**
 * Message Lifecycle Coordinator
 *
 * Owns the status transitions of persisted messages and the events that
 * announce them. Every operation runs in the same order:
 *
 * 1. look up and authorize (only the sender may edit or delete)
 * 2. validate input
 * 3. persist (one atomic store call)
 * 4. broadcast through the router
 *
 * A failure in steps 1-3 returns before anything is broadcast. Once step 3
 * has succeeded the call succeeds; follow-up work such as the offline
 * notification for a private message is logged on failure, not returned.
 *
 * # Status
 *
 * `Sent -> Delivered -> Seen`, never backwards. An edit resets the message
 * to `Sent` and appends an immutable edit-log record. Seen-receipts are
 * batched: one store write and one event per call, carrying every affected id.
 */
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::backend::chat::notifications::NotificationService;
use crate::backend::error::BackendError;
use crate::backend::realtime::broadcast::DeliveryRouter;
use crate::backend::store::ChatStore;
use crate::shared::config::AppConfig;
use crate::shared::message::{
    normalize_reason, EditLogEntry, Message, MessageEdit, MessageId, MessageStatus, NewMessage,
    NewPrivateMessage, PrivateMessage, PrivateMessageId, RoomId,
};
use crate::shared::RealtimeEvent;

pub struct MessageLifecycleCoordinator {
    store: Arc<dyn ChatStore>,
    router: DeliveryRouter,
    notifications: Arc<NotificationService>,
    config: Arc<AppConfig>,
}

impl MessageLifecycleCoordinator {
    pub fn new(
        store: Arc<dyn ChatStore>,
        router: DeliveryRouter,
        notifications: Arc<NotificationService>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            store,
            router,
            notifications,
            config,
        }
    }

    /// Persist a room message and deliver it to every member of the room,
    /// including the sender's other connections.
    pub async fn send_room_message(
        &self,
        room: RoomId,
        sender: &str,
        text: &str,
    ) -> Result<Message, BackendError> {
        let new_message = NewMessage::new(room, sender, text)?;
        let message = self.store.create_message(new_message).await?;

        let report = self
            .router
            .deliver_to_room(room, &RealtimeEvent::receive_message(&message))
            .await;
        tracing::info!(
            room_id = room,
            user = %sender,
            message_id = message.id,
            delivered = report.delivered,
            "[Lifecycle] Message sent"
        );
        Ok(message)
    }

    /// Replace the text of `id`. Only the original sender may edit.
    pub async fn edit_message(
        &self,
        id: MessageId,
        editor: &str,
        new_text: &str,
        reason: Option<String>,
    ) -> Result<Message, BackendError> {
        let message = self.live_message(id).await?;
        if message.sender_username != editor {
            tracing::warn!(message_id = id, user = %editor, "[Lifecycle] Edit by non-owner rejected");
            return Err(BackendError::permission_denied(
                "only the sender may edit this message",
            ));
        }

        let edit = MessageEdit::new(message.id, editor, new_text, reason)?;
        let updated = self.store.apply_edit(edit).await?;

        self.router
            .deliver_to_room(updated.room_id, &RealtimeEvent::message_edited(&updated, editor))
            .await;
        tracing::info!(message_id = id, user = %editor, "[Lifecycle] Message edited");
        Ok(updated)
    }

    /// Soft-delete `id`. Only the original sender may delete.
    pub async fn delete_message(
        &self,
        id: MessageId,
        actor: &str,
        reason: Option<String>,
    ) -> Result<Message, BackendError> {
        let message = self.live_message(id).await?;
        if message.sender_username != actor {
            tracing::warn!(message_id = id, user = %actor, "[Lifecycle] Delete by non-owner rejected");
            return Err(BackendError::permission_denied(
                "only the sender may delete this message",
            ));
        }

        let reason = normalize_reason(reason);
        let deleted = self.store.soft_delete(id, &reason).await?;

        self.router
            .deliver_to_room(
                deleted.room_id,
                &RealtimeEvent::message_deleted(deleted.id, deleted.room_id, &reason),
            )
            .await;
        tracing::info!(message_id = id, user = %actor, "[Lifecycle] Message deleted");
        Ok(deleted)
    }

    /// Mark every message in `room` not sent by `viewer` as seen.
    ///
    /// Broadcasts one `MessagesSeen` with all affected ids, or nothing when
    /// no message changed.
    pub async fn mark_room_seen(
        &self,
        room: RoomId,
        viewer: &str,
    ) -> Result<Vec<MessageId>, BackendError> {
        let ids = self.store.mark_room_seen(room, viewer).await?;
        if ids.is_empty() {
            return Ok(ids);
        }

        self.router
            .deliver_to_room(room, &RealtimeEvent::messages_seen(room, viewer, &ids))
            .await;
        tracing::debug!(room_id = room, user = %viewer, count = ids.len(), "[Lifecycle] Messages seen");
        Ok(ids)
    }

    /// Acknowledge transport delivery of `ids`.
    ///
    /// Only messages still at `Sent` move; one `MessagesDelivered` goes to each
    /// room that had at least one message move.
    pub async fn mark_delivered(&self, ids: &[MessageId]) -> Result<Vec<MessageId>, BackendError> {
        let moved = self
            .store
            .update_message_status(ids, MessageStatus::Delivered)
            .await?;

        let mut by_room: BTreeMap<RoomId, Vec<MessageId>> = BTreeMap::new();
        for message in &moved {
            by_room.entry(message.room_id).or_default().push(message.id);
        }
        for (room, room_ids) in &by_room {
            self.router
                .deliver_to_room(*room, &RealtimeEvent::messages_delivered(*room, room_ids))
                .await;
        }

        Ok(moved.into_iter().map(|m| m.id).collect())
    }

    /// Edit log for `id`, newest first
    pub async fn edit_history(&self, id: MessageId) -> Result<Vec<EditLogEntry>, BackendError> {
        self.store.edit_history(id).await
    }

    pub async fn list_room_messages(
        &self,
        room: RoomId,
        limit: Option<u32>,
    ) -> Result<Vec<Message>, BackendError> {
        self.store
            .list_room_messages(room, self.config.page_size(limit))
            .await
    }

    /// Persist a private message and deliver it to every connection of both
    /// participants. A receiver with no live connection gets a notification.
    pub async fn send_private_message(
        &self,
        sender: &str,
        receiver: &str,
        text: &str,
    ) -> Result<PrivateMessage, BackendError> {
        let new_message = NewPrivateMessage::new(sender, receiver, text)?;
        let message = self.store.create_private_message(new_message).await?;

        let report = self
            .router
            .deliver_to_users(
                &message.participants(),
                &RealtimeEvent::receive_private_message(&message),
            )
            .await;

        // Already stored and delivered, so a notification failure is only logged
        if !self.router.is_reachable(receiver) {
            if let Err(e) = self
                .notifications
                .send(
                    receiver,
                    format!("New private message from {sender}"),
                    Some(message.id),
                )
                .await
            {
                tracing::error!(
                    receiver = %receiver,
                    message_id = message.id,
                    error = %e,
                    "[Lifecycle] Failed to notify offline receiver"
                );
            }
        }

        tracing::info!(
            user = %sender,
            receiver = %receiver,
            message_id = message.id,
            delivered = report.delivered,
            "[Lifecycle] Private message sent"
        );
        Ok(message)
    }

    pub async fn list_private_messages(
        &self,
        viewer: &str,
        other: &str,
        limit: Option<u32>,
    ) -> Result<Vec<PrivateMessage>, BackendError> {
        self.store
            .list_private_messages(viewer, other, self.config.page_size(limit))
            .await
    }

    /// Batch seen-receipt for the messages `other` sent to `viewer`
    pub async fn mark_private_seen(
        &self,
        viewer: &str,
        other: &str,
    ) -> Result<Vec<PrivateMessageId>, BackendError> {
        let ids = self.store.mark_private_seen(viewer, other).await?;
        if ids.is_empty() {
            return Ok(ids);
        }

        self.router
            .deliver_to_users(
                &[viewer, other],
                &RealtimeEvent::private_messages_seen(viewer, other, &ids),
            )
            .await;
        Ok(ids)
    }

    /// A message that exists and is not soft-deleted
    async fn live_message(&self, id: MessageId) -> Result<Message, BackendError> {
        let message = self.store.get_message(id).await?;
        if message.is_deleted {
            return Err(BackendError::not_found("message", id));
        }
        Ok(message)
    }
}
