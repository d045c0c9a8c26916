//! Notification and presence lookup handlers

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::backend::chat::NotificationService;
use crate::backend::error::BackendError;
use crate::backend::middleware::AuthUser;
use crate::backend::presence::PresenceManager;
use crate::shared::notification::Notification;
use crate::shared::presence::UserPresence;

#[derive(Debug, Serialize, Deserialize)]
pub struct MarkAllReadResponse {
    pub updated: u64,
}

pub async fn list_notifications(
    State(notifications): State<Arc<NotificationService>>,
    AuthUser(username): AuthUser,
) -> Result<Json<Vec<Notification>>, BackendError> {
    let list = notifications.list(&username).await?;
    Ok(Json(list))
}

pub async fn mark_notification_read(
    State(notifications): State<Arc<NotificationService>>,
    AuthUser(username): AuthUser,
    Path(notification_id): Path<i64>,
) -> Result<Json<Notification>, BackendError> {
    let notification = notifications.mark_read(notification_id, &username).await?;
    Ok(Json(notification))
}

pub async fn mark_all_notifications_read(
    State(notifications): State<Arc<NotificationService>>,
    AuthUser(username): AuthUser,
) -> Result<Json<MarkAllReadResponse>, BackendError> {
    let updated = notifications.mark_all_read(&username).await?;
    Ok(Json(MarkAllReadResponse { updated }))
}

pub async fn get_user_presence(
    State(presence): State<Arc<PresenceManager>>,
    AuthUser(_username): AuthUser,
    Path(username): Path<String>,
) -> Result<Json<UserPresence>, BackendError> {
    let record = presence.presence_of(&username).await?;
    Ok(Json(record))
}
