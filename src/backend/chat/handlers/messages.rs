//! Room message handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::backend::chat::MessageLifecycleCoordinator;
use crate::backend::error::BackendError;
use crate::backend::middleware::AuthUser;
use crate::shared::message::{EditLogEntry, Message, MessageId, RoomId};

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageBody {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct EditMessageBody {
    pub text: String,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteQuery {
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveredBody {
    pub message_ids: Vec<MessageId>,
}

/// Ids that changed status
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageIdsResponse {
    pub message_ids: Vec<i64>,
}

pub async fn list_room_messages(
    State(lifecycle): State<Arc<MessageLifecycleCoordinator>>,
    AuthUser(_username): AuthUser,
    Path(room_id): Path<RoomId>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Vec<Message>>, BackendError> {
    let messages = lifecycle.list_room_messages(room_id, page.limit).await?;
    Ok(Json(messages))
}

pub async fn send_room_message(
    State(lifecycle): State<Arc<MessageLifecycleCoordinator>>,
    AuthUser(username): AuthUser,
    Path(room_id): Path<RoomId>,
    Json(body): Json<SendMessageBody>,
) -> Result<(StatusCode, Json<Message>), BackendError> {
    let message = lifecycle
        .send_room_message(room_id, &username, &body.text)
        .await?;
    Ok((StatusCode::CREATED, Json(message)))
}

pub async fn mark_room_seen(
    State(lifecycle): State<Arc<MessageLifecycleCoordinator>>,
    AuthUser(username): AuthUser,
    Path(room_id): Path<RoomId>,
) -> Result<Json<MessageIdsResponse>, BackendError> {
    let message_ids = lifecycle.mark_room_seen(room_id, &username).await?;
    Ok(Json(MessageIdsResponse { message_ids }))
}

pub async fn mark_delivered(
    State(lifecycle): State<Arc<MessageLifecycleCoordinator>>,
    AuthUser(_username): AuthUser,
    Json(body): Json<DeliveredBody>,
) -> Result<Json<MessageIdsResponse>, BackendError> {
    let message_ids = lifecycle.mark_delivered(&body.message_ids).await?;
    Ok(Json(MessageIdsResponse { message_ids }))
}

pub async fn edit_message(
    State(lifecycle): State<Arc<MessageLifecycleCoordinator>>,
    AuthUser(username): AuthUser,
    Path(message_id): Path<MessageId>,
    Json(body): Json<EditMessageBody>,
) -> Result<Json<Message>, BackendError> {
    let message = lifecycle
        .edit_message(message_id, &username, &body.text, body.reason)
        .await?;
    Ok(Json(message))
}

pub async fn delete_message(
    State(lifecycle): State<Arc<MessageLifecycleCoordinator>>,
    AuthUser(username): AuthUser,
    Path(message_id): Path<MessageId>,
    Query(query): Query<DeleteQuery>,
) -> Result<Json<Message>, BackendError> {
    let message = lifecycle
        .delete_message(message_id, &username, query.reason)
        .await?;
    Ok(Json(message))
}

pub async fn edit_history(
    State(lifecycle): State<Arc<MessageLifecycleCoordinator>>,
    AuthUser(_username): AuthUser,
    Path(message_id): Path<MessageId>,
) -> Result<Json<Vec<EditLogEntry>>, BackendError> {
    let history = lifecycle.edit_history(message_id).await?;
    Ok(Json(history))
}
