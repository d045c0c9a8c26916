//! Private message handlers
//!
//! `{username}` in every path is the other participant; the caller is the
//! authenticated user.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use super::messages::{MessageIdsResponse, PageQuery, SendMessageBody};
use crate::backend::chat::MessageLifecycleCoordinator;
use crate::backend::error::BackendError;
use crate::backend::middleware::AuthUser;
use crate::shared::message::PrivateMessage;

pub async fn list_private_messages(
    State(lifecycle): State<Arc<MessageLifecycleCoordinator>>,
    AuthUser(username): AuthUser,
    Path(other): Path<String>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Vec<PrivateMessage>>, BackendError> {
    let messages = lifecycle
        .list_private_messages(&username, &other, page.limit)
        .await?;
    Ok(Json(messages))
}

pub async fn send_private_message(
    State(lifecycle): State<Arc<MessageLifecycleCoordinator>>,
    AuthUser(username): AuthUser,
    Path(receiver): Path<String>,
    Json(body): Json<SendMessageBody>,
) -> Result<(StatusCode, Json<PrivateMessage>), BackendError> {
    let message = lifecycle
        .send_private_message(&username, &receiver, &body.text)
        .await?;
    Ok((StatusCode::CREATED, Json(message)))
}

pub async fn mark_private_seen(
    State(lifecycle): State<Arc<MessageLifecycleCoordinator>>,
    AuthUser(username): AuthUser,
    Path(other): Path<String>,
) -> Result<Json<MessageIdsResponse>, BackendError> {
    let message_ids = lifecycle.mark_private_seen(&username, &other).await?;
    Ok(Json(MessageIdsResponse { message_ids }))
}
