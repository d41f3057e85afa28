//! The referral/points ledger. Signup bonuses, referrer credits, and reward
//! redemptions all pass through here; persistence goes through the
//! [`CredentialStore`] seam so the same rules run against Postgres and the
//! in-memory store alike.

use secrecy::{ExposeSecret, Secret};
use uuid::Uuid;

use crate::catalog;
use crate::domain::{
    errors::{LedgerError, StoreError},
    fields::{Email, Redemption, Referral, ReferralCode, User},
};
use crate::store::{CredentialStore, NewRedemption, NewReferral, NewUser};
use crate::utils::password;

/// Points granted to a new user who signs up with a working referral code.
pub const REFEREE_BONUS: i64 = 5;
/// Points credited to the owner of the code for each signup it brings in.
pub const REFERRER_CREDIT: i64 = 10;

pub struct NewSignup {
    pub email: Email,
    pub name: String,
    pub password: Secret<String>,
    pub referral_code: Option<ReferralCode>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignupWarning {
    InvalidReferralCode,
}

impl SignupWarning {
    pub fn message(&self) -> &'static str {
        match self {
            Self::InvalidReferralCode => "The referral code you entered is not valid",
        }
    }
}

pub struct SignupOutcome {
    pub user: User,
    /// The resolved referrer, when the signup was referred. Lets the caller
    /// announce the referral without another lookup.
    pub referrer: Option<User>,
    pub warning: Option<SignupWarning>,
}

/// Registers a new account. A supplied referral code that resolves to
/// another user pays [`REFEREE_BONUS`] to the signee, [`REFERRER_CREDIT`] to
/// the referrer, and records the referral; a code that resolves to nothing
/// downgrades to a warning and the signup still goes through.
pub async fn process_signup<S: CredentialStore>(
    store: &S,
    signup: NewSignup,
) -> Result<SignupOutcome, LedgerError> {
    if store.find_user_by_email(&signup.email).await?.is_some() {
        return Err(LedgerError::EmailTaken);
    }

    let mut warning = None;
    let referrer = match &signup.referral_code {
        Some(code) => match store.find_user_by_referral_code(code).await? {
            Some(referrer) if referrer.email == signup.email => {
                return Err(LedgerError::SelfReferral)
            }
            Some(referrer) => Some(referrer),
            None => {
                tracing::info!("referral code did not resolve >>> {}", code);
                warning = Some(SignupWarning::InvalidReferralCode);
                None
            }
        },
        None => None,
    };

    let referral_code = generate_unique_code(store, &signup.name).await?;
    let password_hash = password::hash(signup.password.expose_secret()).map_err(|e| {
        tracing::error!("password hashing failed >>> {}", e);
        StoreError::Backend
    })?;

    let initial_points = if referrer.is_some() { REFEREE_BONUS } else { 0 };
    let user = store
        .create_user(NewUser {
            email: signup.email,
            name: signup.name,
            password_hash,
            referral_code,
            initial_points,
            referred_by: referrer.as_ref().map(|r| r.uid),
        })
        .await?;

    if let Some(referrer) = &referrer {
        store.credit_points(referrer.uid, REFERRER_CREDIT).await?;
        store
            .create_referral(NewReferral {
                referrer_code: referrer.referral_code.clone(),
                referee_email: user.email.clone(),
            })
            .await?;
    }

    Ok(SignupOutcome {
        user,
        referrer,
        warning,
    })
}

/// Exchanges points for a catalog reward. The debit is a single conditional
/// mutation in the store; the record snapshots the reward's name and price
/// at call time so later catalog changes leave history untouched.
pub async fn redeem<S: CredentialStore>(
    store: &S,
    user_uid: Uuid,
    reward_id: &str,
) -> Result<Redemption, LedgerError> {
    let reward = catalog::get(reward_id).ok_or(LedgerError::RewardNotFound)?;
    let user = store
        .find_user_by_uid(user_uid)
        .await?
        .ok_or(LedgerError::UserNotFound)?;

    // the balance read above only feeds the error message; the store's
    // conditional update is what decides
    if !store.debit_points(user_uid, reward.points_cost).await? {
        return Err(LedgerError::InsufficientPoints {
            available: user.points,
            required: reward.points_cost,
        });
    }

    let redemption = store
        .create_redemption(NewRedemption {
            user_uid,
            reward_id: reward.id.to_string(),
            reward_name: reward.name.to_string(),
            points_cost: reward.points_cost,
        })
        .await?;

    Ok(redemption)
}

/// Referral history for the user's own code, newest first.
pub async fn referrals_for<S: CredentialStore>(
    store: &S,
    user: &User,
) -> Result<Vec<Referral>, LedgerError> {
    Ok(store.referrals_for_code(&user.referral_code).await?)
}

/// The user's redemption history, newest first.
pub async fn redemptions_for<S: CredentialStore>(
    store: &S,
    user_uid: Uuid,
) -> Result<Vec<Redemption>, LedgerError> {
    Ok(store.redemptions_for_user(user_uid).await?)
}

async fn generate_unique_code<S: CredentialStore>(
    store: &S,
    name: &str,
) -> Result<ReferralCode, StoreError> {
    let mut code = ReferralCode::new(name);
    while store.find_user_by_referral_code(&code).await?.is_some() {
        code = ReferralCode::new(name);
    }

    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemStore;

    async fn signup(
        store: &MemStore,
        email: &str,
        name: &str,
        code: Option<ReferralCode>,
    ) -> Result<SignupOutcome, LedgerError> {
        process_signup(
            store,
            NewSignup {
                email: email.to_string().into(),
                name: name.to_string(),
                password: Secret::new("hunter2".to_string()),
                referral_code: code,
            },
        )
        .await
    }

    #[tokio::test]
    async fn plain_signup_starts_with_zero_points() {
        let store = MemStore::new();
        let outcome = signup(&store, "a@example.com", "Anna", None).await.unwrap();

        assert_eq!(outcome.user.points, 0);
        assert!(outcome.referrer.is_none());
        assert!(outcome.warning.is_none());
        let referrals = referrals_for(&store, &outcome.user).await.unwrap();
        assert!(referrals.is_empty());
    }

    #[tokio::test]
    async fn referred_signup_pays_both_sides_and_records_the_referral() {
        let store = MemStore::new();
        let anna = signup(&store, "a@example.com", "Anna", None).await.unwrap().user;

        let outcome = signup(
            &store,
            "b@example.com",
            "Bela",
            Some(anna.referral_code.clone()),
        )
        .await
        .unwrap();

        assert_eq!(outcome.user.points, REFEREE_BONUS);
        assert_eq!(outcome.user.referred_by, Some(anna.uid));
        assert!(outcome.warning.is_none());

        let anna_after = store.find_user_by_uid(anna.uid).await.unwrap().unwrap();
        assert_eq!(anna_after.points, REFERRER_CREDIT);
        assert_eq!(anna_after.referrals, 1);

        let referrals = referrals_for(&store, &anna_after).await.unwrap();
        assert_eq!(referrals.len(), 1);
        assert_eq!(referrals[0].referrer_code, anna.referral_code);
        assert_eq!(referrals[0].referee_email, outcome.user.email);
    }

    #[tokio::test]
    async fn unknown_code_warns_but_the_signup_goes_through() {
        let store = MemStore::new();
        let outcome = signup(
            &store,
            "b@example.com",
            "Bela",
            Some("ZZZ999".to_string().into()),
        )
        .await
        .unwrap();

        assert_eq!(outcome.user.points, 0);
        assert!(outcome.referrer.is_none());
        assert_eq!(outcome.warning, Some(SignupWarning::InvalidReferralCode));
        let referrals = referrals_for(&store, &outcome.user).await.unwrap();
        assert!(referrals.is_empty());
    }

    #[tokio::test]
    async fn self_referral_never_pays_out() {
        let store = MemStore::new();
        let anna = signup(&store, "a@example.com", "Anna", None).await.unwrap().user;

        // presenting your own code means your email already has an account,
        // so the duplicate-email rule refuses it before the self-referral
        // guard can; either way the signup fails and nobody gets paid
        let result = signup(
            &store,
            "a@example.com",
            "Anna",
            Some(anna.referral_code.clone()),
        )
        .await;

        assert!(matches!(
            result,
            Err(LedgerError::EmailTaken | LedgerError::SelfReferral)
        ));
        let anna_after = store.find_user_by_uid(anna.uid).await.unwrap().unwrap();
        assert_eq!(anna_after.points, 0);
        let referrals = referrals_for(&store, &anna_after).await.unwrap();
        assert!(referrals.is_empty());
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected_regardless_of_code() {
        let store = MemStore::new();
        let anna = signup(&store, "a@example.com", "Anna", None).await.unwrap().user;
        signup(&store, "b@example.com", "Bela", None).await.unwrap();

        let plain = signup(&store, "b@example.com", "Bela", None).await;
        assert!(matches!(plain, Err(LedgerError::EmailTaken)));

        let with_code = signup(
            &store,
            "b@example.com",
            "Bela",
            Some(anna.referral_code.clone()),
        )
        .await;
        assert!(matches!(with_code, Err(LedgerError::EmailTaken)));

        // the refused signup must not have paid the referrer
        let anna_after = store.find_user_by_uid(anna.uid).await.unwrap().unwrap();
        assert_eq!(anna_after.points, 0);
    }

    #[tokio::test]
    async fn redeem_refuses_a_short_balance() {
        let store = MemStore::new();
        let user = signup(&store, "a@example.com", "Anna", None).await.unwrap().user;
        store.credit_points(user.uid, 29).await.unwrap();

        let result = redeem(&store, user.uid, "reward1").await;
        assert!(matches!(
            result,
            Err(LedgerError::InsufficientPoints {
                available: 29,
                required: 30
            })
        ));

        let after = store.find_user_by_uid(user.uid).await.unwrap().unwrap();
        assert_eq!(after.points, 29);
        assert!(redemptions_for(&store, user.uid).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn redeem_debits_exactly_the_cost_and_snapshots_the_price() {
        let store = MemStore::new();
        let user = signup(&store, "a@example.com", "Anna", None).await.unwrap().user;
        store.credit_points(user.uid, 45).await.unwrap();

        let redemption = redeem(&store, user.uid, "reward1").await.unwrap();
        assert_eq!(redemption.points_cost, 30);
        assert_eq!(redemption.reward_name, "Free eBook");
        assert_eq!(redemption.user_uid, user.uid);

        let after = store.find_user_by_uid(user.uid).await.unwrap().unwrap();
        assert_eq!(after.points, 15);

        let history = redemptions_for(&store, user.uid).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].rid, redemption.rid);
    }

    #[tokio::test]
    async fn redeem_unknown_reward_is_not_found() {
        let store = MemStore::new();
        let user = signup(&store, "a@example.com", "Anna", None).await.unwrap().user;

        let result = redeem(&store, user.uid, "reward9").await;
        assert!(matches!(result, Err(LedgerError::RewardNotFound)));
    }

    #[tokio::test]
    async fn redeem_unknown_user_is_not_found() {
        let store = MemStore::new();
        let result = redeem(&store, Uuid::new_v4(), "reward1").await;
        assert!(matches!(result, Err(LedgerError::UserNotFound)));
    }
}
