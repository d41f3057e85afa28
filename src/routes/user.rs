use std::sync::Arc;

use crate::{
    app::AppState,
    domain::{
        errors::ApiError,
        fields::{Redemption, Referral, User},
    },
    ledger,
};
use axum::{extract::State, Extension, Json};
use serde::Serialize;

#[derive(Serialize)]
pub struct AuthenticatedUserResponse {
    #[serde(flatten)]
    user: User,
}

#[derive(Serialize)]
pub struct ReferralsResponse {
    referrals: Vec<Referral>,
}

#[derive(Serialize)]
pub struct RedemptionsResponse {
    redemptions: Vec<Redemption>,
}

pub async fn get_authenticated_user(
    Extension(user): Extension<User>,
) -> Result<Json<AuthenticatedUserResponse>, ApiError> {
    Ok(Json(AuthenticatedUserResponse { user }))
}

pub async fn get_referrals(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> Result<Json<ReferralsResponse>, ApiError> {
    let referrals = ledger::referrals_for(&state.get_store(), &user).await?;
    Ok(Json(ReferralsResponse { referrals }))
}

pub async fn get_redemptions(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> Result<Json<RedemptionsResponse>, ApiError> {
    let redemptions = ledger::redemptions_for(&state.get_store(), user.uid).await?;
    Ok(Json(RedemptionsResponse { redemptions }))
}
