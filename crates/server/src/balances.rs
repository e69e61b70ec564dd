//! Balance endpoint.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::{ServerError, server::ServerState};
use engine::UserId;

#[derive(Deserialize)]
pub struct BalanceRequest {
    pub user_id: UserId,
}

#[derive(Serialize)]
pub struct BalanceResponse {
    pub money: i64,
    pub outstanding: i64,
    pub available: i64,
}

/// Provisions the user if needed, sends them the balance notice and echoes
/// the breakdown back to the gateway.
pub async fn balance(
    State(state): State<ServerState>,
    Json(payload): Json<BalanceRequest>,
) -> Result<Json<BalanceResponse>, ServerError> {
    state.engine.send_balance(payload.user_id).await?;
    let summary = state.engine.ledger().summary(payload.user_id).await?;
    Ok(Json(BalanceResponse {
        money: summary.money,
        outstanding: summary.outstanding,
        available: summary.available(),
    }))
}
