use rand::{distributions::Uniform, prelude::Distribution};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use time::OffsetDateTime;
use uuid::Uuid;

use super::model::{DbRedemption, DbReferral, DbUser};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Email(String);

impl Email {
    pub fn inner(&self) -> String {
        self.0.to_owned()
    }
}

impl From<String> for Email {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ReferralCode(String);

impl ReferralCode {
    /// A fresh code: the first three characters of the name, uppercased,
    /// followed by three random digits. Uniqueness is the ledger's job.
    pub fn new(name: &str) -> Self {
        let prefix: String = name.chars().take(3).collect();
        Self(format!(
            "{}{}",
            prefix.to_uppercase(),
            Self::generate_code_digits()
        ))
    }

    pub fn inner(&self) -> String {
        self.0.to_owned()
    }

    fn generate_code_digits() -> String {
        let mut rng = rand::thread_rng();
        let uni_sample = Uniform::from(100..=999);
        let code = uni_sample.sample(&mut rng);
        code.to_string()
    }
}

impl From<String> for ReferralCode {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Display for ReferralCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub uid: Uuid,
    pub email: Email,
    pub name: String,
    pub referral_code: ReferralCode,
    pub points: i64,
    pub referred_by: Option<Uuid>,
    pub referrals: i64,
}

impl From<DbUser> for User {
    fn from(value: DbUser) -> Self {
        Self {
            uid: value.uid,
            email: value.email.into(),
            name: value.name,
            referral_code: value.referral_code.into(),
            points: value.points,
            referred_by: value.referred_by,
            referrals: value.referrals.unwrap_or(0),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Referral {
    pub rid: Uuid,
    pub referrer_code: ReferralCode,
    pub referee_email: Email,
    #[serde(with = "time::serde::rfc3339")]
    pub created_on: OffsetDateTime,
}

impl From<DbReferral> for Referral {
    fn from(value: DbReferral) -> Self {
        Self {
            rid: value.rid,
            referrer_code: value.referrer_code.into(),
            referee_email: value.referee_email.into(),
            created_on: value.created_on,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Redemption {
    pub rid: Uuid,
    pub user_uid: Uuid,
    pub reward_id: String,
    pub reward_name: String,
    pub points_cost: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_on: OffsetDateTime,
}

impl From<DbRedemption> for Redemption {
    fn from(value: DbRedemption) -> Self {
        Self {
            rid: value.rid,
            user_uid: value.user_uid,
            reward_id: value.reward_id,
            reward_name: value.reward_name,
            points_cost: value.points_cost,
            created_on: value.created_on,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iss: String,
    pub exp: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn referral_code_uses_uppercased_name_prefix() {
        let code = ReferralCode::new("alice").inner();
        assert!(code.starts_with("ALI"), "unexpected code {code}");
        assert_eq!(code.len(), 6);
        let digits: u32 = code[3..].parse().unwrap();
        assert!((100..=999).contains(&digits));
    }

    #[test]
    fn referral_code_handles_short_names() {
        let code = ReferralCode::new("Al").inner();
        assert!(code.starts_with("AL"));
        assert_eq!(code.len(), 5);
    }

    #[test]
    fn referral_code_prefix_is_character_aware() {
        // must not panic on multi-byte characters
        let code = ReferralCode::new("Åsa").inner();
        assert!(code.starts_with("ÅSA"));
    }
}
