use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use super::{CredentialStore, NewRedemption, NewReferral, NewUser};
use crate::domain::{
    errors::StoreError,
    fields::{Email, Redemption, Referral, ReferralCode, User},
    model::{DbRedemption, DbReferral, DbUser},
};
use crate::utils::password;

/// Postgres-backed credential store. Queries go through the runtime-checked
/// sqlx API so the crate builds without a live database; the schema lives in
/// `migrations/` and is applied with sqlx-cli.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_db_user_by_email(&self, email: &Email) -> Result<Option<DbUser>, StoreError> {
        sqlx::query_as::<_, DbUser>(
            "select a.*, (select count(*) from users as b where b.referred_by=a.uid) as referrals from users as a where email = $1",
        )
        .bind(email.inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("get user by email failed >>> {}", e);
            StoreError::Backend
        })
    }
}

#[async_trait]
impl CredentialStore for PgStore {
    async fn find_user_by_email(&self, email: &Email) -> Result<Option<User>, StoreError> {
        let user = self.fetch_db_user_by_email(email).await?;
        Ok(user.map(|u| u.into()))
    }

    async fn find_user_by_referral_code(
        &self,
        code: &ReferralCode,
    ) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, DbUser>(
            "select a.*, (select count(*) from users as b where b.referred_by=a.uid) as referrals from users as a where referral_code = $1",
        )
        .bind(code.inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("get user by referral code failed >>> {}", e);
            StoreError::Backend
        })?;

        Ok(user.map(|u| u.into()))
    }

    async fn find_user_by_uid(&self, uid: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, DbUser>(
            "select a.*, (select count(*) from users as b where b.referred_by=a.uid) as referrals from users as a where uid = $1",
        )
        .bind(uid)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("get user by uid failed >>> {}", e);
            StoreError::Backend
        })?;

        Ok(user.map(|u| u.into()))
    }

    async fn create_user(&self, new_user: NewUser) -> Result<User, StoreError> {
        sqlx::query(
            "insert into users (uid, email, name, password_hash, referral_code, points, referred_by) values ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(Uuid::new_v4())
        .bind(new_user.email.inner())
        .bind(new_user.name)
        .bind(new_user.password_hash)
        .bind(new_user.referral_code.inner())
        .bind(new_user.initial_points)
        .bind(new_user.referred_by)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("creating user failed >>> {}", e);
            StoreError::Backend
        })?;

        let user = self.find_user_by_email(&new_user.email).await?;
        user.ok_or_else(|| {
            tracing::error!("created user missing on reload >>> {}", new_user.email);
            StoreError::Backend
        })
    }

    async fn credit_points(&self, uid: Uuid, amount: i64) -> Result<(), StoreError> {
        sqlx::query("update users set points = points + $1 where uid = $2")
            .bind(amount)
            .bind(uid)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("crediting points failed >>> {}", e);
                StoreError::Backend
            })?;

        Ok(())
    }

    async fn debit_points(&self, uid: Uuid, amount: i64) -> Result<bool, StoreError> {
        // the balance guard is part of the statement, so two racing debits
        // can never both pass against a stale read
        let result =
            sqlx::query("update users set points = points - $1 where uid = $2 and points >= $1")
                .bind(amount)
                .bind(uid)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    tracing::error!("debiting points failed >>> {}", e);
                    StoreError::Backend
                })?;

        Ok(result.rows_affected() > 0)
    }

    async fn create_referral(&self, referral: NewReferral) -> Result<Referral, StoreError> {
        let referral = Referral {
            rid: Uuid::new_v4(),
            referrer_code: referral.referrer_code,
            referee_email: referral.referee_email,
            created_on: OffsetDateTime::now_utc(),
        };

        sqlx::query(
            "insert into referrals (rid, referrer_code, referee_email, created_on) values ($1, $2, $3, $4)",
        )
        .bind(referral.rid)
        .bind(referral.referrer_code.inner())
        .bind(referral.referee_email.inner())
        .bind(referral.created_on)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("creating referral failed >>> {}", e);
            StoreError::Backend
        })?;

        Ok(referral)
    }

    async fn create_redemption(
        &self,
        redemption: NewRedemption,
    ) -> Result<Redemption, StoreError> {
        let redemption = Redemption {
            rid: Uuid::new_v4(),
            user_uid: redemption.user_uid,
            reward_id: redemption.reward_id,
            reward_name: redemption.reward_name,
            points_cost: redemption.points_cost,
            created_on: OffsetDateTime::now_utc(),
        };

        sqlx::query(
            "insert into redemptions (rid, user_uid, reward_id, reward_name, points_cost, created_on) values ($1, $2, $3, $4, $5, $6)",
        )
        .bind(redemption.rid)
        .bind(redemption.user_uid)
        .bind(&redemption.reward_id)
        .bind(&redemption.reward_name)
        .bind(redemption.points_cost)
        .bind(redemption.created_on)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("creating redemption failed >>> {}", e);
            StoreError::Backend
        })?;

        Ok(redemption)
    }

    async fn authenticate(
        &self,
        email: &Email,
        password: &str,
    ) -> Result<Option<User>, StoreError> {
        let user = self.fetch_db_user_by_email(email).await?;

        match user {
            Some(u) if password::verify(password, &u.password_hash) => Ok(Some(u.into())),
            _ => Ok(None),
        }
    }

    async fn referrals_for_code(&self, code: &ReferralCode) -> Result<Vec<Referral>, StoreError> {
        let referrals = sqlx::query_as::<_, DbReferral>(
            "select * from referrals where referrer_code = $1 order by created_on desc",
        )
        .bind(code.inner())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("getting referral history failed >>> {}", e);
            StoreError::Backend
        })?;

        Ok(referrals.into_iter().map(|r| r.into()).collect())
    }

    async fn redemptions_for_user(&self, uid: Uuid) -> Result<Vec<Redemption>, StoreError> {
        let redemptions = sqlx::query_as::<_, DbRedemption>(
            "select * from redemptions where user_uid = $1 order by created_on desc",
        )
        .bind(uid)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("getting redemption history failed >>> {}", e);
            StoreError::Backend
        })?;

        Ok(redemptions.into_iter().map(|r| r.into()).collect())
    }
}
