//! The full referral journey, run against the in-memory credential store:
//! a plain signup, a referred signup, a refused redemption, and a
//! successful one after the balance catches up.

use referly_server::domain::errors::LedgerError;
use referly_server::ledger::{
    process_signup, redeem, redemptions_for, referrals_for, NewSignup, REFEREE_BONUS,
    REFERRER_CREDIT,
};
use referly_server::store::{CredentialStore, MemStore};
use secrecy::Secret;

async fn signup(
    store: &MemStore,
    email: &str,
    name: &str,
    code: Option<&str>,
) -> referly_server::ledger::SignupOutcome {
    process_signup(
        store,
        NewSignup {
            email: email.to_string().into(),
            name: name.to_string(),
            password: Secret::new("hunter2".to_string()),
            referral_code: code.map(|c| c.to_string().into()),
        },
    )
    .await
    .expect("signup should succeed")
}

#[tokio::test]
async fn referral_and_redemption_journey() {
    let store = MemStore::new();

    // A signs up without a code and starts from zero
    let anna = signup(&store, "anna@example.com", "Anna", None).await.user;
    assert_eq!(anna.points, 0);

    // B signs up with A's code: B gets the bonus, A gets the credit,
    // and exactly one referral is recorded
    let bela = signup(
        &store,
        "bela@example.com",
        "Bela",
        Some(&anna.referral_code.inner()),
    )
    .await
    .user;
    assert_eq!(bela.points, REFEREE_BONUS);

    let anna_after = store.find_user_by_uid(anna.uid).await.unwrap().unwrap();
    assert_eq!(anna_after.points, REFERRER_CREDIT);
    assert_eq!(anna_after.referrals, 1);

    let referrals = referrals_for(&store, &anna_after).await.unwrap();
    assert_eq!(referrals.len(), 1);
    assert_eq!(referrals[0].referee_email, bela.email);

    // 5 points is not enough for the 100-point coupon
    let refused = redeem(&store, bela.uid, "reward2").await;
    assert!(matches!(
        refused,
        Err(LedgerError::InsufficientPoints {
            available: 5,
            required: 100
        })
    ));

    // three of B's friends sign up with B's code, bringing B to 35
    for (email, name) in [
        ("cleo@example.com", "Cleo"),
        ("dana@example.com", "Dana"),
        ("emil@example.com", "Emil"),
    ] {
        let friend = signup(&store, email, name, Some(&bela.referral_code.inner())).await;
        assert_eq!(friend.user.points, REFEREE_BONUS);
    }

    let bela_funded = store.find_user_by_uid(bela.uid).await.unwrap().unwrap();
    assert_eq!(bela_funded.points, REFEREE_BONUS + 3 * REFERRER_CREDIT);
    assert_eq!(bela_funded.referrals, 3);

    // the 30-point reward now goes through and debits exactly its cost
    let redemption = redeem(&store, bela.uid, "reward1").await.unwrap();
    assert_eq!(redemption.points_cost, 30);

    let bela_after = store.find_user_by_uid(bela.uid).await.unwrap().unwrap();
    assert_eq!(bela_after.points, REFEREE_BONUS + 3 * REFERRER_CREDIT - 30);

    let history = redemptions_for(&store, bela.uid).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].reward_name, "Free eBook");
}
