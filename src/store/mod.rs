use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    errors::StoreError,
    fields::{Email, Redemption, Referral, ReferralCode, User},
};

pub mod memory;
pub mod postgres;

pub use memory::MemStore;
pub use postgres::PgStore;

pub struct NewUser {
    pub email: Email,
    pub name: String,
    pub password_hash: String,
    pub referral_code: ReferralCode,
    pub initial_points: i64,
    pub referred_by: Option<Uuid>,
}

pub struct NewReferral {
    pub referrer_code: ReferralCode,
    pub referee_email: Email,
}

pub struct NewRedemption {
    pub user_uid: Uuid,
    pub reward_id: String,
    pub reward_name: String,
    pub points_cost: i64,
}

/// Persistence seam for the ledger and the session layer. The ledger only
/// relies on the contracts stated here; the transport and schema behind
/// them are the implementation's concern.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_user_by_email(&self, email: &Email) -> Result<Option<User>, StoreError>;

    async fn find_user_by_referral_code(
        &self,
        code: &ReferralCode,
    ) -> Result<Option<User>, StoreError>;

    async fn find_user_by_uid(&self, uid: Uuid) -> Result<Option<User>, StoreError>;

    async fn create_user(&self, new_user: NewUser) -> Result<User, StoreError>;

    async fn credit_points(&self, uid: Uuid, amount: i64) -> Result<(), StoreError>;

    /// Subtracts `amount` from the balance only if the balance covers it,
    /// as one atomic mutation. Returns whether the debit applied. Two
    /// concurrent debits must never both succeed against a balance that
    /// covers only one of them.
    async fn debit_points(&self, uid: Uuid, amount: i64) -> Result<bool, StoreError>;

    async fn create_referral(&self, referral: NewReferral) -> Result<Referral, StoreError>;

    async fn create_redemption(&self, redemption: NewRedemption)
        -> Result<Redemption, StoreError>;

    /// Password check against the stored hash; `None` for unknown email or
    /// a failed verification, without distinguishing the two.
    async fn authenticate(&self, email: &Email, password: &str)
        -> Result<Option<User>, StoreError>;

    async fn referrals_for_code(&self, code: &ReferralCode) -> Result<Vec<Referral>, StoreError>;

    async fn redemptions_for_user(&self, uid: Uuid) -> Result<Vec<Redemption>, StoreError>;
}
