//! Inbound chat gateway events.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;

use crate::{ServerError, server::ServerState};
use engine::{CommunityId, MarkerKind, MessageId, UserId};

#[derive(Deserialize)]
pub struct MarkerEvent {
    pub marker: MarkerKind,
    pub message_id: MessageId,
    pub user_id: UserId,
}

#[derive(Deserialize)]
pub struct MemberRemovedEvent {
    pub community_id: CommunityId,
    pub user_id: UserId,
}

pub async fn marker_added(
    State(state): State<ServerState>,
    Json(payload): Json<MarkerEvent>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .on_marker_added(payload.marker, payload.message_id, payload.user_id)
        .await?;
    Ok(StatusCode::ACCEPTED)
}

pub async fn member_removed(
    State(state): State<ServerState>,
    Json(payload): Json<MemberRemovedEvent>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .handle_member_removed(payload.community_id, payload.user_id)
        .await?;
    Ok(StatusCode::ACCEPTED)
}
