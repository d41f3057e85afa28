use super::fields::{Email, User};
use serde::Serialize;

#[derive(Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NewReferralEvent {
    pub referrer: Email,
    pub referred_user: Email,
}

#[derive(Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NewRedemptionEvent {
    pub user: Email,
    pub reward: String,
    pub points_cost: i64,
}

#[derive(Serialize, Clone)]
#[serde(tag = "type", content = "data")]
pub enum AppEvent {
    NewLogin(User),
    NewRegister(User),
    NewReferral(NewReferralEvent),
    NewRedemption(NewRedemptionEvent),
}
