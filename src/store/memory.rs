use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{CredentialStore, NewRedemption, NewReferral, NewUser};
use crate::domain::{
    errors::StoreError,
    fields::{Email, Redemption, Referral, ReferralCode, User},
};
use crate::utils::password;

struct MemUser {
    uid: Uuid,
    email: Email,
    name: String,
    password_hash: String,
    referral_code: ReferralCode,
    points: i64,
    referred_by: Option<Uuid>,
}

#[derive(Default)]
struct Inner {
    users: HashMap<Uuid, MemUser>,
    referrals: Vec<Referral>,
    redemptions: Vec<Redemption>,
}

/// In-process credential store. One lock spans every read-modify-write, so
/// the conditional-debit contract holds without further coordination. This
/// is the store the ledger test suite runs against.
#[derive(Default)]
pub struct MemStore {
    inner: Mutex<Inner>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn to_user(inner: &Inner, record: &MemUser) -> User {
    let referrals = inner
        .users
        .values()
        .filter(|u| u.referred_by == Some(record.uid))
        .count() as i64;

    User {
        uid: record.uid,
        email: record.email.clone(),
        name: record.name.clone(),
        referral_code: record.referral_code.clone(),
        points: record.points,
        referred_by: record.referred_by,
        referrals,
    }
}

#[async_trait]
impl CredentialStore for MemStore {
    async fn find_user_by_email(&self, email: &Email) -> Result<Option<User>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .users
            .values()
            .find(|u| &u.email == email)
            .map(|u| to_user(&inner, u)))
    }

    async fn find_user_by_referral_code(
        &self,
        code: &ReferralCode,
    ) -> Result<Option<User>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .users
            .values()
            .find(|u| &u.referral_code == code)
            .map(|u| to_user(&inner, u)))
    }

    async fn find_user_by_uid(&self, uid: Uuid) -> Result<Option<User>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.users.get(&uid).map(|u| to_user(&inner, u)))
    }

    async fn create_user(&self, new_user: NewUser) -> Result<User, StoreError> {
        let mut inner = self.inner.lock().await;
        let uid = Uuid::new_v4();
        inner.users.insert(
            uid,
            MemUser {
                uid,
                email: new_user.email,
                name: new_user.name,
                password_hash: new_user.password_hash,
                referral_code: new_user.referral_code,
                points: new_user.initial_points,
                referred_by: new_user.referred_by,
            },
        );

        Ok(to_user(&inner, &inner.users[&uid]))
    }

    async fn credit_points(&self, uid: Uuid, amount: i64) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        if let Some(user) = inner.users.get_mut(&uid) {
            user.points += amount;
        }

        Ok(())
    }

    async fn debit_points(&self, uid: Uuid, amount: i64) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().await;
        match inner.users.get_mut(&uid) {
            Some(user) if user.points >= amount => {
                user.points -= amount;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn create_referral(&self, referral: NewReferral) -> Result<Referral, StoreError> {
        let mut inner = self.inner.lock().await;
        let referral = Referral {
            rid: Uuid::new_v4(),
            referrer_code: referral.referrer_code,
            referee_email: referral.referee_email,
            created_on: OffsetDateTime::now_utc(),
        };
        inner.referrals.push(referral.clone());

        Ok(referral)
    }

    async fn create_redemption(
        &self,
        redemption: NewRedemption,
    ) -> Result<Redemption, StoreError> {
        let mut inner = self.inner.lock().await;
        let redemption = Redemption {
            rid: Uuid::new_v4(),
            user_uid: redemption.user_uid,
            reward_id: redemption.reward_id,
            reward_name: redemption.reward_name,
            points_cost: redemption.points_cost,
            created_on: OffsetDateTime::now_utc(),
        };
        inner.redemptions.push(redemption.clone());

        Ok(redemption)
    }

    async fn authenticate(
        &self,
        email: &Email,
        password: &str,
    ) -> Result<Option<User>, StoreError> {
        let inner = self.inner.lock().await;
        match inner.users.values().find(|u| &u.email == email) {
            Some(u) if password::verify(password, &u.password_hash) => {
                Ok(Some(to_user(&inner, u)))
            }
            _ => Ok(None),
        }
    }

    async fn referrals_for_code(&self, code: &ReferralCode) -> Result<Vec<Referral>, StoreError> {
        let inner = self.inner.lock().await;
        let mut referrals: Vec<Referral> = inner
            .referrals
            .iter()
            .filter(|r| &r.referrer_code == code)
            .cloned()
            .collect();
        // insertion order is chronological; history reads newest first
        referrals.reverse();

        Ok(referrals)
    }

    async fn redemptions_for_user(&self, uid: Uuid) -> Result<Vec<Redemption>, StoreError> {
        let inner = self.inner.lock().await;
        let mut redemptions: Vec<Redemption> = inner
            .redemptions
            .iter()
            .filter(|r| r.user_uid == uid)
            .cloned()
            .collect();
        redemptions.reverse();

        Ok(redemptions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn new_user(email: &str, points: i64) -> NewUser {
        NewUser {
            email: email.to_string().into(),
            name: "Test".into(),
            password_hash: "unused".into(),
            referral_code: ReferralCode::new("Test"),
            initial_points: points,
            referred_by: None,
        }
    }

    #[tokio::test]
    async fn debit_refuses_when_balance_is_short() {
        let store = MemStore::new();
        let user = store.create_user(new_user("a@example.com", 20)).await.unwrap();

        assert!(!store.debit_points(user.uid, 30).await.unwrap());
        let reloaded = store.find_user_by_uid(user.uid).await.unwrap().unwrap();
        assert_eq!(reloaded.points, 20);
    }

    #[tokio::test]
    async fn concurrent_debits_never_overdraw() {
        let store = Arc::new(MemStore::new());
        let user = store.create_user(new_user("a@example.com", 50)).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..2 {
            let store = store.clone();
            let uid = user.uid;
            handles.push(tokio::spawn(async move {
                store.debit_points(uid, 30).await.unwrap()
            }));
        }

        let mut applied = 0;
        for handle in handles {
            if handle.await.unwrap() {
                applied += 1;
            }
        }

        assert_eq!(applied, 1);
        let reloaded = store.find_user_by_uid(user.uid).await.unwrap().unwrap();
        assert_eq!(reloaded.points, 20);
    }

    #[tokio::test]
    async fn authenticate_checks_the_stored_hash() {
        let store = MemStore::new();
        let mut fresh = new_user("a@example.com", 0);
        fresh.password_hash = password::hash("hunter2").unwrap();
        store.create_user(fresh).await.unwrap();

        let email: Email = "a@example.com".to_string().into();
        assert!(store.authenticate(&email, "hunter2").await.unwrap().is_some());
        assert!(store.authenticate(&email, "hunter3").await.unwrap().is_none());
        let other: Email = "b@example.com".to_string().into();
        assert!(store.authenticate(&other, "hunter2").await.unwrap().is_none());
    }
}
