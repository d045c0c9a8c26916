//! Reaction handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::backend::chat::ReactionFanout;
use crate::backend::error::BackendError;
use crate::backend::middleware::AuthUser;
use crate::shared::reaction::{Reaction, ReactionRequest, ReactionTarget};

pub async fn add_reaction(
    State(reactions): State<Arc<ReactionFanout>>,
    AuthUser(username): AuthUser,
    Json(request): Json<ReactionRequest>,
) -> Result<(StatusCode, Json<Reaction>), BackendError> {
    let reaction = reactions.add_reaction(&username, request).await?;
    Ok((StatusCode::CREATED, Json(reaction)))
}

pub async fn remove_reaction(
    State(reactions): State<Arc<ReactionFanout>>,
    AuthUser(username): AuthUser,
    Path(reaction_id): Path<i64>,
) -> Result<Json<Reaction>, BackendError> {
    let removed = reactions.remove_reaction(&username, reaction_id).await?;
    Ok(Json(removed))
}

pub async fn list_message_reactions(
    State(reactions): State<Arc<ReactionFanout>>,
    AuthUser(_username): AuthUser,
    Path(message_id): Path<i64>,
) -> Result<Json<Vec<Reaction>>, BackendError> {
    let list = reactions
        .list_reactions(ReactionTarget::RoomMessage(message_id))
        .await?;
    Ok(Json(list))
}

pub async fn list_private_reactions(
    State(reactions): State<Arc<ReactionFanout>>,
    AuthUser(_username): AuthUser,
    Path(message_id): Path<i64>,
) -> Result<Json<Vec<Reaction>>, BackendError> {
    let list = reactions
        .list_reactions(ReactionTarget::PrivateMessage(message_id))
        .await?;
    Ok(Json(list))
}
