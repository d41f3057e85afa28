use std::sync::Arc;

use crate::{
    app::AppState,
    catalog::{self, Reward},
    domain::{
        errors::ApiError,
        events::{AppEvent, NewRedemptionEvent},
        fields::{Redemption, User},
    },
    ledger,
};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Serialize;

#[derive(Serialize)]
pub struct RewardsResponse {
    rewards: &'static [Reward],
}

#[derive(Serialize)]
pub struct RedemptionResponse {
    redemption: Redemption,
}

pub async fn list_rewards() -> Json<RewardsResponse> {
    Json(RewardsResponse {
        rewards: catalog::list(),
    })
}

pub async fn redeem_reward(
    State(state): State<Arc<AppState>>,
    Path(reward_id): Path<String>,
    Extension(user): Extension<User>,
) -> Result<Json<RedemptionResponse>, ApiError> {
    tracing::info!("redeeming reward >>> {} for {}", reward_id, user.email);
    let redemption = ledger::redeem(&state.get_store(), user.uid, &reward_id).await?;

    let _ = state
        .get_sender()
        .send(AppEvent::NewRedemption(NewRedemptionEvent {
            user: user.email.clone(),
            reward: redemption.reward_name.clone(),
            points_cost: redemption.points_cost,
        }));

    Ok(Json(RedemptionResponse { redemption }))
}
