//! Wager command endpoints.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use crate::{ServerError, server::ServerState};
use engine::{ChannelId, CommunityId, MessageId, MessageOrigin, UserId, WagerId};

#[derive(Deserialize)]
pub struct WagerNew {
    pub community_id: Option<CommunityId>,
    pub channel_id: Option<ChannelId>,
    pub creator_id: UserId,
    pub amount: i64,
    pub description: String,
}

#[derive(Serialize)]
pub struct WagerCreated {
    pub id: WagerId,
    pub message_id: Option<MessageId>,
}

#[derive(Deserialize)]
pub struct WagerCancel {
    pub user_id: UserId,
    #[serde(default)]
    pub wager_ids: Vec<WagerId>,
}

#[derive(Deserialize)]
pub struct WagerListRequest {
    pub user_id: UserId,
}

pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<WagerNew>,
) -> Result<(StatusCode, Json<WagerCreated>), ServerError> {
    let origin = match (payload.community_id, payload.channel_id) {
        (Some(community_id), Some(channel_id)) => MessageOrigin::Community {
            community_id,
            channel_id,
        },
        _ => MessageOrigin::Direct,
    };

    let wager = state
        .engine
        .create_wager(
            origin,
            payload.creator_id,
            payload.amount,
            payload.description.trim(),
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(WagerCreated {
            id: wager.id,
            message_id: wager.message_id,
        }),
    ))
}

pub async fn cancel(
    State(state): State<ServerState>,
    Json(payload): Json<WagerCancel>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .cancel_wagers(payload.user_id, &payload.wager_ids)
        .await?;
    Ok(StatusCode::OK)
}

pub async fn send_list(
    State(state): State<ServerState>,
    Json(payload): Json<WagerListRequest>,
) -> Result<StatusCode, ServerError> {
    state.engine.send_wager_list(payload.user_id).await?;
    Ok(StatusCode::OK)
}
