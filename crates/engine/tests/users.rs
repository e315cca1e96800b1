mod common;

use common::{ADMIN, ALICE, BOB, balance, engine_with_db, fund, seed};
use engine::{EngineError, TransferCmd, UserStatus, UserUpsert};

#[tokio::test]
async fn create_user_opens_default_account() {
    let (engine, _db) = engine_with_db().await;
    engine.add_currency("USD", "US Dollar", "$").await.unwrap();

    let upsert = engine.create_user(ALICE, "@alice").await.unwrap();
    let UserUpsert::Created(user) = upsert else {
        panic!("expected a new user, got {upsert:?}");
    };
    assert_eq!(user.username, "alice");
    assert_eq!(user.status, UserStatus::Active);
    assert!(!user.is_admin);

    let accounts = engine.accounts(ALICE).await.unwrap();
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0].currency_code, "USD");
    assert_eq!(accounts[0].amount_minor, 0);
}

#[tokio::test]
async fn create_user_twice_is_rejected() {
    let (engine, _db) = engine_with_db().await;
    engine.add_currency("USD", "US Dollar", "$").await.unwrap();

    engine.create_user(ALICE, "alice").await.unwrap();
    let err = engine.create_user(ALICE, "alice").await.unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));

    assert_eq!(engine.list_users_with_balances().await.unwrap().len(), 1);
    assert_eq!(engine.accounts(ALICE).await.unwrap().len(), 1);
}

#[tokio::test]
async fn create_user_renames_active_user_in_place() {
    let (engine, _db) = engine_with_db().await;
    seed(&engine).await;
    fund(&engine, "alice", 42, "USD").await;

    let upsert = engine.create_user(ALICE, "alicia").await.unwrap();
    let UserUpsert::Renamed {
        user,
        previous_username,
    } = upsert
    else {
        panic!("expected a rename, got {upsert:?}");
    };
    assert_eq!(previous_username, "alice");
    assert_eq!(user.username, "alicia");

    assert!(matches!(
        engine.user_by_username("alice").await,
        Err(EngineError::KeyNotFound(_))
    ));
    assert_eq!(engine.user_by_username("alicia").await.unwrap().identity, ALICE);
    assert_eq!(balance(&engine, ALICE, "USD").await, 42);
}

#[tokio::test]
async fn username_held_by_another_user_is_rejected() {
    let (engine, _db) = engine_with_db().await;
    seed(&engine).await;

    let err = engine.create_user(999, "Bob").await.unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));
    let err = engine.create_user(ALICE, "bob").await.unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));
}

#[tokio::test]
async fn disabled_user_is_invisible_until_resurrected() {
    let (engine, _db) = engine_with_db().await;
    seed(&engine).await;
    fund(&engine, "alice", 100, "USD").await;
    fund(&engine, "bob", 100, "USD").await;

    let disabled = engine.disable_user("bob").await.unwrap();
    assert_eq!(disabled.status, UserStatus::Disabled);
    assert!(disabled.disabled_at.is_some());

    let err = engine
        .transfer(TransferCmd::new(ALICE, "bob", 10, "USD"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
    let err = engine
        .transfer(TransferCmd::new(BOB, "alice", 10, "USD"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
    assert!(matches!(
        engine.transaction_history(BOB, None).await,
        Err(EngineError::KeyNotFound(_))
    ));
    assert!(matches!(
        engine.disable_user("bob").await,
        Err(EngineError::KeyNotFound(_))
    ));

    let upsert = engine.create_user(BOB, "robert").await.unwrap();
    let UserUpsert::Resurrected(user) = upsert else {
        panic!("expected a resurrection, got {upsert:?}");
    };
    assert_eq!(user.username, "robert");
    assert!(user.is_active());
    assert!(user.disabled_at.is_none());

    assert_eq!(balance(&engine, BOB, "USD").await, 100);
    engine
        .transfer(TransferCmd::new(ALICE, "robert", 10, "USD"))
        .await
        .unwrap();
    assert_eq!(balance(&engine, BOB, "USD").await, 110);
}

#[tokio::test]
async fn destroy_user_removes_accounts_and_history() {
    let (engine, _db) = engine_with_db().await;
    seed(&engine).await;
    fund(&engine, "alice", 100, "USD").await;
    engine
        .transfer(TransferCmd::new(ALICE, "bob", 25, "USD"))
        .await
        .unwrap();

    let destroyed = engine.destroy_user("bob").await.unwrap();
    assert_eq!(destroyed.identity, BOB);

    assert!(matches!(engine.user(BOB).await, Err(EngineError::KeyNotFound(_))));
    assert!(matches!(
        engine.destroy_user("bob").await,
        Err(EngineError::KeyNotFound(_))
    ));

    // The counterparty keeps its own side of the history.
    let alice_history = engine.transaction_history(ALICE, None).await.unwrap();
    assert_eq!(alice_history.len(), 2);
    assert_eq!(alice_history[0].to_username, "bob");

    // The identity starts over from scratch.
    let upsert = engine.create_user(BOB, "bob").await.unwrap();
    assert!(matches!(upsert, UserUpsert::Created(_)));
    assert_eq!(balance(&engine, BOB, "USD").await, 0);
    assert!(engine.transaction_history(BOB, None).await.unwrap().is_empty());
}

#[tokio::test]
async fn destroy_reaches_disabled_users() {
    let (engine, _db) = engine_with_db().await;
    seed(&engine).await;

    engine.disable_user("bob").await.unwrap();
    let destroyed = engine.destroy_user("@bob").await.unwrap();
    assert_eq!(destroyed.status, UserStatus::Disabled);

    let upsert = engine.create_user(BOB, "bob").await.unwrap();
    assert!(matches!(upsert, UserUpsert::Created(_)));
}

#[tokio::test]
async fn admin_gate_fails_closed() {
    let (engine, _db) = engine_with_db().await;
    seed(&engine).await;

    assert!(engine.is_admin(ADMIN).await);
    assert!(!engine.is_admin(ALICE).await);
    assert!(!engine.is_admin(123_456).await);

    engine.set_admin_status("alice", true).await.unwrap();
    assert!(engine.is_admin(ALICE).await);

    engine.disable_user("alice").await.unwrap();
    assert!(!engine.is_admin(ALICE).await);

    assert!(matches!(
        engine.set_admin_status("nobody", true).await,
        Err(EngineError::KeyNotFound(_))
    ));
}

#[tokio::test]
async fn usernames_are_validated() {
    let (engine, _db) = engine_with_db().await;

    for bad in ["", "   ", "@", "two words"] {
        let err = engine.create_user(ALICE, bad).await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)), "{bad:?}");
    }
}

#[tokio::test]
async fn users_created_before_the_catalog_have_no_accounts() {
    let (engine, _db) = engine_with_db().await;

    engine.create_user(ALICE, "alice").await.unwrap();
    assert!(engine.accounts(ALICE).await.unwrap().is_empty());
}
