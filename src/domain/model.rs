use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(FromRow)]
pub struct DbUser {
    pub uid: Uuid,
    pub(crate) email: String,
    pub(crate) name: String,
    pub(crate) password_hash: String,
    pub(crate) referral_code: String,
    pub(crate) points: i64,
    pub(crate) referred_by: Option<Uuid>,
    pub(crate) referrals: Option<i64>,
    #[allow(dead_code)]
    pub(crate) created_on: OffsetDateTime,
}

#[derive(FromRow)]
pub struct DbReferral {
    pub rid: Uuid,
    pub(crate) referrer_code: String,
    pub(crate) referee_email: String,
    pub(crate) created_on: OffsetDateTime,
}

#[derive(FromRow)]
pub struct DbRedemption {
    pub rid: Uuid,
    pub(crate) user_uid: Uuid,
    pub(crate) reward_id: String,
    pub(crate) reward_name: String,
    pub(crate) points_cost: i64,
    pub(crate) created_on: OffsetDateTime,
}
