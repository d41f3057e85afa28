use serde::Serialize;

use crate::domain::fields::User;

/// Static rewards for the first version.
#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Reward {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub points_cost: i64,
    pub image: &'static str,
}

const CATALOG: [Reward; 4] = [
    Reward {
        id: "reward1",
        name: "Free eBook",
        description: "Download our exclusive guide on maximizing your productivity",
        points_cost: 30,
        image: "/placeholder.svg",
    },
    Reward {
        id: "reward2",
        name: "Amazon Coupon",
        description: "$10 Amazon gift card for your next purchase",
        points_cost: 100,
        image: "/placeholder.svg",
    },
    Reward {
        id: "reward3",
        name: "Premium Membership",
        description: "One month of premium membership features",
        points_cost: 150,
        image: "/placeholder.svg",
    },
    Reward {
        id: "reward4",
        name: "Exclusive Webinar",
        description: "Access to our upcoming expert webinar",
        points_cost: 50,
        image: "/placeholder.svg",
    },
];

pub fn list() -> &'static [Reward] {
    &CATALOG
}

pub fn get(reward_id: &str) -> Option<&'static Reward> {
    CATALOG.iter().find(|r| r.id == reward_id)
}

/// True iff the user's current balance covers the reward's current price.
pub fn eligibility(user: &User, reward_id: &str) -> bool {
    match get(reward_id) {
        Some(reward) => user.points >= reward.points_cost,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fields::ReferralCode;
    use uuid::Uuid;

    fn user_with_points(points: i64) -> User {
        User {
            uid: Uuid::new_v4(),
            email: "a@example.com".to_string().into(),
            name: "Anna".into(),
            referral_code: ReferralCode::new("Anna"),
            points,
            referred_by: None,
            referrals: 0,
        }
    }

    #[test]
    fn lookup_by_id() {
        assert_eq!(get("reward2").unwrap().points_cost, 100);
        assert!(get("reward9").is_none());
    }

    #[test]
    fn eligibility_tracks_balance_against_cost() {
        assert!(eligibility(&user_with_points(30), "reward1"));
        assert!(!eligibility(&user_with_points(29), "reward1"));
        assert!(!eligibility(&user_with_points(1000), "reward9"));
    }
}
