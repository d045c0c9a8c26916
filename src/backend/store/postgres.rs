/**
 * PostgreSQL Store
 *
 * `ChatStore` backed by `sqlx::PgPool`. The schema lives in `migrations/`.
 *
 * Message status is stored as a SMALLINT rank (`Sent = 0`, `Delivered = 1`,
 * `Seen = 2`), so "only move forward" is the SQL predicate `status < $rank`.
 * Batch transitions are a single `UPDATE ... RETURNING`; edits update the
 * message and append the log row inside one transaction.
 */
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::backend::error::BackendError;
use crate::backend::store::{ChatStore, StoreResult};
use crate::shared::message::{
    EditLogEntry, Message, MessageEdit, MessageId, MessageStatus, NewMessage, NewPrivateMessage,
    PrivateMessage, PrivateMessageId, RoomId,
};
use crate::shared::notification::{NewNotification, Notification};
use crate::shared::presence::UserPresence;
use crate::shared::reaction::{NewReaction, Reaction, ReactionTarget};

const MESSAGE_COLUMNS: &str =
    "id, room_id, sender_username, text, timestamp, edited_at, is_deleted, delete_reason, status";
const PRIVATE_COLUMNS: &str =
    "id, sender_username, receiver_username, text, timestamp, edited_at, is_deleted, status";
const REACTION_COLUMNS: &str = "id, reaction, reacted_by, reacted_at, message_id, private_message_id";
const NOTIFICATION_COLUMNS: &str = "id, recipient_username, content, related_id, is_read, created_at";

#[derive(Debug, sqlx::FromRow)]
struct MessageRow {
    id: i64,
    room_id: i64,
    sender_username: String,
    text: String,
    timestamp: DateTime<Utc>,
    edited_at: Option<DateTime<Utc>>,
    is_deleted: bool,
    delete_reason: Option<String>,
    status: i16,
}

impl TryFrom<MessageRow> for Message {
    type Error = BackendError;

    fn try_from(row: MessageRow) -> Result<Self, Self::Error> {
        Ok(Message {
            id: row.id,
            room_id: row.room_id,
            sender_username: row.sender_username,
            text: row.text,
            timestamp: row.timestamp,
            edited_at: row.edited_at,
            is_deleted: row.is_deleted,
            delete_reason: row.delete_reason,
            status: decode_status(row.status)?,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PrivateMessageRow {
    id: i64,
    sender_username: String,
    receiver_username: String,
    text: String,
    timestamp: DateTime<Utc>,
    edited_at: Option<DateTime<Utc>>,
    is_deleted: bool,
    status: i16,
}

impl TryFrom<PrivateMessageRow> for PrivateMessage {
    type Error = BackendError;

    fn try_from(row: PrivateMessageRow) -> Result<Self, Self::Error> {
        Ok(PrivateMessage {
            id: row.id,
            sender_username: row.sender_username,
            receiver_username: row.receiver_username,
            text: row.text,
            timestamp: row.timestamp,
            edited_at: row.edited_at,
            is_deleted: row.is_deleted,
            status: decode_status(row.status)?,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct EditLogRow {
    id: i64,
    message_id: i64,
    old_content: String,
    new_content: String,
    edited_by: String,
    edit_reason: String,
    edited_at: DateTime<Utc>,
}

impl From<EditLogRow> for EditLogEntry {
    fn from(row: EditLogRow) -> Self {
        EditLogEntry {
            id: row.id,
            message_id: row.message_id,
            old_content: row.old_content,
            new_content: row.new_content,
            edited_by: row.edited_by,
            edit_reason: row.edit_reason,
            edited_at: row.edited_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ReactionRow {
    id: i64,
    reaction: String,
    reacted_by: String,
    reacted_at: DateTime<Utc>,
    message_id: Option<i64>,
    private_message_id: Option<i64>,
}

impl TryFrom<ReactionRow> for Reaction {
    type Error = BackendError;

    fn try_from(row: ReactionRow) -> Result<Self, Self::Error> {
        let target = ReactionTarget::from_parts(row.message_id, row.private_message_id)
            .map_err(|e| BackendError::storage(format!("reaction {}: {}", row.id, e)))?;
        Ok(Reaction {
            id: row.id,
            reaction: row.reaction,
            reacted_by: row.reacted_by,
            reacted_at: row.reacted_at,
            target,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct NotificationRow {
    id: i64,
    recipient_username: String,
    content: String,
    related_id: Option<i64>,
    is_read: bool,
    created_at: DateTime<Utc>,
}

impl From<NotificationRow> for Notification {
    fn from(row: NotificationRow) -> Self {
        Notification {
            id: row.id,
            recipient_username: row.recipient_username,
            content: row.content,
            related_id: row.related_id,
            is_read: row.is_read,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PresenceRow {
    username: String,
    is_online: bool,
    last_seen: DateTime<Utc>,
}

fn decode_status(rank: i16) -> Result<MessageStatus, BackendError> {
    MessageStatus::from_rank(rank)
        .ok_or_else(|| BackendError::storage(format!("unknown message status rank {rank}")))
}

/// Turn `RowNotFound` into a `NotFound` naming the entity that was looked up
fn or_not_found(entity: &'static str, id: impl ToString) -> impl FnOnce(sqlx::Error) -> BackendError {
    move |err| match err {
        sqlx::Error::RowNotFound => BackendError::not_found(entity, id),
        other => other.into(),
    }
}

fn convert_all<R, T>(rows: Vec<R>) -> StoreResult<Vec<T>>
where
    T: TryFrom<R, Error = BackendError>,
{
    rows.into_iter().map(T::try_from).collect()
}

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn fetch_message(&self, id: MessageId) -> StoreResult<Message> {
        let row = sqlx::query_as::<_, MessageRow>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = $1"
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(or_not_found("message", id))?;
        row.try_into()
    }
}

#[async_trait]
impl ChatStore for PgStore {
    async fn create_message(&self, message: NewMessage) -> StoreResult<Message> {
        let row = sqlx::query_as::<_, MessageRow>(&format!(
            r#"
            INSERT INTO messages (room_id, sender_username, text, timestamp, status)
            VALUES ($1, $2, $3, clock_timestamp(), $4)
            RETURNING {MESSAGE_COLUMNS}
            "#
        ))
        .bind(message.room_id)
        .bind(&message.sender_username)
        .bind(&message.text)
        .bind(MessageStatus::Sent.rank())
        .fetch_one(&self.pool)
        .await?;
        row.try_into()
    }

    async fn get_message(&self, id: MessageId) -> StoreResult<Message> {
        self.fetch_message(id).await
    }

    async fn list_room_messages(&self, room: RoomId, limit: u32) -> StoreResult<Vec<Message>> {
        let rows = sqlx::query_as::<_, MessageRow>(&format!(
            r#"
            SELECT * FROM (
                SELECT {MESSAGE_COLUMNS} FROM messages
                WHERE room_id = $1 AND NOT is_deleted
                ORDER BY timestamp DESC, id DESC
                LIMIT $2
            ) page
            ORDER BY timestamp ASC, id ASC
            "#
        ))
        .bind(room)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn update_message_status(
        &self,
        ids: &[MessageId],
        status: MessageStatus,
    ) -> StoreResult<Vec<Message>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, MessageRow>(&format!(
            r#"
            UPDATE messages SET status = $2
            WHERE id = ANY($1) AND status < $2 AND NOT is_deleted
            RETURNING {MESSAGE_COLUMNS}
            "#
        ))
        .bind(ids)
        .bind(status.rank())
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn mark_room_seen(&self, room: RoomId, viewer: &str) -> StoreResult<Vec<MessageId>> {
        let mut ids: Vec<MessageId> = sqlx::query_scalar(
            r#"
            UPDATE messages SET status = $3
            WHERE room_id = $1 AND sender_username <> $2 AND status < $3 AND NOT is_deleted
            RETURNING id
            "#,
        )
        .bind(room)
        .bind(viewer)
        .bind(MessageStatus::Seen.rank())
        .fetch_all(&self.pool)
        .await?;
        ids.sort_unstable();
        Ok(ids)
    }

    async fn apply_edit(&self, edit: MessageEdit) -> StoreResult<Message> {
        let mut tx = self.pool.begin().await?;

        // Row lock held until commit
        let old_content: String = sqlx::query_scalar(
            "SELECT text FROM messages WHERE id = $1 AND NOT is_deleted FOR UPDATE",
        )
        .bind(edit.message_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(or_not_found("message", edit.message_id))?;

        let row = sqlx::query_as::<_, MessageRow>(&format!(
            r#"
            UPDATE messages SET text = $2, edited_at = $3, status = $4
            WHERE id = $1
            RETURNING {MESSAGE_COLUMNS}
            "#
        ))
        .bind(edit.message_id)
        .bind(&edit.new_content)
        .bind(edit.edited_at)
        .bind(MessageStatus::Sent.rank())
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO message_edit_logs
                (message_id, old_content, new_content, edited_by, edit_reason, edited_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(edit.message_id)
        .bind(&old_content)
        .bind(&edit.new_content)
        .bind(&edit.edited_by)
        .bind(&edit.edit_reason)
        .bind(edit.edited_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        row.try_into()
    }

    async fn soft_delete(&self, id: MessageId, reason: &str) -> StoreResult<Message> {
        let row = sqlx::query_as::<_, MessageRow>(&format!(
            r#"
            UPDATE messages SET is_deleted = TRUE, delete_reason = $2
            WHERE id = $1
            RETURNING {MESSAGE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(reason)
        .fetch_one(&self.pool)
        .await
        .map_err(or_not_found("message", id))?;
        row.try_into()
    }

    async fn edit_history(&self, id: MessageId) -> StoreResult<Vec<EditLogEntry>> {
        self.fetch_message(id).await?;
        let rows = sqlx::query_as::<_, EditLogRow>(
            r#"
            SELECT id, message_id, old_content, new_content, edited_by, edit_reason, edited_at
            FROM message_edit_logs
            WHERE message_id = $1
            ORDER BY edited_at DESC, id DESC
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(EditLogEntry::from).collect())
    }

    async fn create_private_message(&self, message: NewPrivateMessage) -> StoreResult<PrivateMessage> {
        let row = sqlx::query_as::<_, PrivateMessageRow>(&format!(
            r#"
            INSERT INTO private_messages (sender_username, receiver_username, text, timestamp, status)
            VALUES ($1, $2, $3, clock_timestamp(), $4)
            RETURNING {PRIVATE_COLUMNS}
            "#
        ))
        .bind(&message.sender_username)
        .bind(&message.receiver_username)
        .bind(&message.text)
        .bind(MessageStatus::Sent.rank())
        .fetch_one(&self.pool)
        .await?;
        row.try_into()
    }

    async fn get_private_message(&self, id: PrivateMessageId) -> StoreResult<PrivateMessage> {
        let row = sqlx::query_as::<_, PrivateMessageRow>(&format!(
            "SELECT {PRIVATE_COLUMNS} FROM private_messages WHERE id = $1"
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(or_not_found("private message", id))?;
        row.try_into()
    }

    async fn list_private_messages(
        &self,
        a: &str,
        b: &str,
        limit: u32,
    ) -> StoreResult<Vec<PrivateMessage>> {
        let rows = sqlx::query_as::<_, PrivateMessageRow>(&format!(
            r#"
            SELECT * FROM (
                SELECT {PRIVATE_COLUMNS} FROM private_messages
                WHERE NOT is_deleted
                  AND ((sender_username = $1 AND receiver_username = $2)
                    OR (sender_username = $2 AND receiver_username = $1))
                ORDER BY timestamp DESC, id DESC
                LIMIT $3
            ) page
            ORDER BY timestamp ASC, id ASC
            "#
        ))
        .bind(a)
        .bind(b)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn mark_private_seen(&self, viewer: &str, other: &str) -> StoreResult<Vec<PrivateMessageId>> {
        let mut ids: Vec<PrivateMessageId> = sqlx::query_scalar(
            r#"
            UPDATE private_messages SET status = $3
            WHERE receiver_username = $1 AND sender_username = $2 AND status < $3
            RETURNING id
            "#,
        )
        .bind(viewer)
        .bind(other)
        .bind(MessageStatus::Seen.rank())
        .fetch_all(&self.pool)
        .await?;
        ids.sort_unstable();
        Ok(ids)
    }

    async fn set_user_presence(
        &self,
        username: &str,
        is_online: bool,
        last_seen: DateTime<Utc>,
    ) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO user_presence (username, is_online, last_seen)
            VALUES ($1, $2, $3)
            ON CONFLICT (username) DO UPDATE SET
                is_online = EXCLUDED.is_online,
                last_seen = EXCLUDED.last_seen
            "#,
        )
        .bind(username)
        .bind(is_online)
        .bind(last_seen)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_user_presence(&self, username: &str) -> StoreResult<UserPresence> {
        let row = sqlx::query_as::<_, PresenceRow>(
            "SELECT username, is_online, last_seen FROM user_presence WHERE username = $1",
        )
        .bind(username)
        .fetch_one(&self.pool)
        .await
        .map_err(or_not_found("user", username))?;
        Ok(UserPresence {
            username: row.username,
            is_online: row.is_online,
            last_seen: row.last_seen,
        })
    }

    async fn mark_all_offline(&self) -> StoreResult<u64> {
        let result = sqlx::query("UPDATE user_presence SET is_online = FALSE WHERE is_online")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn create_reaction(&self, reaction: NewReaction) -> StoreResult<Reaction> {
        let (message_id, private_message_id) = reaction.target.into_parts();
        let row = sqlx::query_as::<_, ReactionRow>(&format!(
            r#"
            INSERT INTO reactions (reaction, reacted_by, reacted_at, message_id, private_message_id)
            VALUES ($1, $2, clock_timestamp(), $3, $4)
            RETURNING {REACTION_COLUMNS}
            "#
        ))
        .bind(&reaction.reaction)
        .bind(&reaction.reacted_by)
        .bind(message_id)
        .bind(private_message_id)
        .fetch_one(&self.pool)
        .await?;
        row.try_into()
    }

    async fn get_reaction(&self, id: i64) -> StoreResult<Reaction> {
        let row = sqlx::query_as::<_, ReactionRow>(&format!(
            "SELECT {REACTION_COLUMNS} FROM reactions WHERE id = $1"
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(or_not_found("reaction", id))?;
        row.try_into()
    }

    async fn delete_reaction(&self, id: i64, owner: &str) -> StoreResult<Reaction> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, ReactionRow>(&format!(
            "SELECT {REACTION_COLUMNS} FROM reactions WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .map_err(or_not_found("reaction", id))?;

        if row.reacted_by != owner {
            return Err(BackendError::permission_denied(
                "only the reacting user may remove a reaction",
            ));
        }

        sqlx::query("DELETE FROM reactions WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        row.try_into()
    }

    async fn list_reactions(&self, target: ReactionTarget) -> StoreResult<Vec<Reaction>> {
        let (column, id) = match target {
            ReactionTarget::RoomMessage(id) => ("message_id", id),
            ReactionTarget::PrivateMessage(id) => ("private_message_id", id),
        };
        let rows = sqlx::query_as::<_, ReactionRow>(&format!(
            "SELECT {REACTION_COLUMNS} FROM reactions WHERE {column} = $1 ORDER BY reacted_at, id"
        ))
        .bind(id)
        .fetch_all(&self.pool)
        .await?;
        convert_all(rows)
    }

    async fn create_notification(&self, notification: NewNotification) -> StoreResult<Notification> {
        let row = sqlx::query_as::<_, NotificationRow>(&format!(
            r#"
            INSERT INTO notifications (recipient_username, content, related_id, is_read, created_at)
            VALUES ($1, $2, $3, FALSE, clock_timestamp())
            RETURNING {NOTIFICATION_COLUMNS}
            "#
        ))
        .bind(&notification.recipient_username)
        .bind(&notification.content)
        .bind(notification.related_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn list_notifications(&self, username: &str) -> StoreResult<Vec<Notification>> {
        let rows = sqlx::query_as::<_, NotificationRow>(&format!(
            r#"
            SELECT {NOTIFICATION_COLUMNS} FROM notifications
            WHERE recipient_username = $1
            ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(username)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Notification::from).collect())
    }

    async fn mark_notification_read(&self, id: i64, username: &str) -> StoreResult<Notification> {
        let row = sqlx::query_as::<_, NotificationRow>(&format!(
            r#"
            UPDATE notifications SET is_read = TRUE
            WHERE id = $1 AND recipient_username = $2
            RETURNING {NOTIFICATION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(username)
        .fetch_one(&self.pool)
        .await
        .map_err(or_not_found("notification", id))?;
        Ok(row.into())
    }

    async fn mark_all_notifications_read(&self, username: &str) -> StoreResult<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE WHERE recipient_username = $1 AND NOT is_read",
        )
        .bind(username)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
