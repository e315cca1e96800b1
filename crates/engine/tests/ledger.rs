mod common;

use sea_orm::{ConnectionTrait, Statement};

use common::{ADMIN, ALICE, BOB, CAROL, balance, engine_with_db, fund, seed};
use engine::{
    EngineError, MAX_HISTORY_LIMIT, SetBalanceCmd, TransactionKind, TransferCmd,
};

#[tokio::test]
async fn transfer_moves_funds_and_logs_both_sides() {
    let (engine, _db) = engine_with_db().await;
    seed(&engine).await;
    fund(&engine, "alice", 100, "USD").await;

    let receipt = engine
        .transfer(TransferCmd::new(ALICE, "bob", 40, "USD"))
        .await
        .unwrap();

    assert_eq!(balance(&engine, ALICE, "USD").await, 60);
    assert_eq!(balance(&engine, BOB, "USD").await, 40);

    assert_eq!(receipt.outgoing.kind, TransactionKind::TransferOut);
    assert_eq!(receipt.outgoing.amount_minor, -40);
    assert_eq!(receipt.outgoing.balance_after_minor, 60);
    assert_eq!(receipt.incoming.kind, TransactionKind::TransferIn);
    assert_eq!(receipt.incoming.amount_minor, 40);
    assert_eq!(receipt.incoming.balance_after_minor, 40);
    assert_eq!(receipt.outgoing.occurred_at, receipt.incoming.occurred_at);
    assert_eq!(receipt.incoming.from_username, "alice");
    assert_eq!(receipt.incoming.to_username, "bob");

    let err = engine
        .transfer(TransferCmd::new(ALICE, "bob", 100, "USD"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InsufficientFunds(_)));
    assert_eq!(balance(&engine, ALICE, "USD").await, 60);
    assert_eq!(balance(&engine, BOB, "USD").await, 40);

    let alice_history = engine.transaction_history(ALICE, None).await.unwrap();
    let kinds: Vec<_> = alice_history.iter().map(|tx| tx.kind).collect();
    assert_eq!(
        kinds,
        vec![TransactionKind::TransferOut, TransactionKind::AdminSetBalance]
    );
}

#[tokio::test]
async fn transfer_conserves_money() {
    let (engine, _db) = engine_with_db().await;
    seed(&engine).await;
    fund(&engine, "alice", 1_000, "USD").await;
    fund(&engine, "bob", 500, "USD").await;

    for (from, to, amount) in [(ALICE, "bob", 123), (BOB, "alice", 77), (ALICE, "bob", 1)] {
        let before = balance(&engine, ALICE, "USD").await + balance(&engine, BOB, "USD").await;
        engine
            .transfer(TransferCmd::new(from, to, amount, "USD"))
            .await
            .unwrap();
        let after = balance(&engine, ALICE, "USD").await + balance(&engine, BOB, "USD").await;
        assert_eq!(before, after);
    }
    assert_eq!(balance(&engine, ALICE, "USD").await, 1_000 - 123 + 77 - 1);
}

#[tokio::test]
async fn transfer_checks_run_in_order() {
    let (engine, _db) = engine_with_db().await;
    seed(&engine).await;
    engine.add_currency("EUR", "Euro", "€").await.unwrap();
    fund(&engine, "alice", 10, "USD").await;

    let cases = [
        (TransferCmd::new(ALICE, "ghost", 0, "USD"), "amount"),
        (TransferCmd::new(ALICE, "ghost", 5, "USD"), "recipient"),
        (TransferCmd::new(999, "bob", 5, "USD"), "sender"),
        (TransferCmd::new(ALICE, "@alice", 5, "USD"), "self"),
        (TransferCmd::new(ALICE, "bob", 5, "EUR"), "not held"),
        (TransferCmd::new(ALICE, "bob", 11, "USD"), "insufficient"),
    ];
    for (cmd, case) in cases {
        let err = engine.transfer(cmd).await.unwrap_err();
        let ok = match case {
            "amount" => matches!(err, EngineError::InvalidAmount(_)),
            "recipient" | "sender" => matches!(err, EngineError::KeyNotFound(_)),
            "self" => matches!(err, EngineError::SelfTransfer(_)),
            "not held" => matches!(err, EngineError::CurrencyNotHeld(_)),
            "insufficient" => matches!(err, EngineError::InsufficientFunds(_)),
            _ => false,
        };
        assert!(ok, "{case}: unexpected {err:?}");
    }

    assert_eq!(balance(&engine, ALICE, "USD").await, 10);
    let history = engine.transaction_history(ALICE, None).await.unwrap();
    assert_eq!(history.len(), 1);
}

#[tokio::test]
async fn transfer_opens_recipient_account_lazily() {
    let (engine, _db) = engine_with_db().await;
    seed(&engine).await;
    engine.add_currency("EUR", "Euro", "€").await.unwrap();
    fund(&engine, "alice", 50, "EUR").await;

    assert!(matches!(
        engine.account(BOB, "EUR").await,
        Err(EngineError::KeyNotFound(_))
    ));

    engine
        .transfer(TransferCmd::new(ALICE, "@Bob", 20, "eur"))
        .await
        .unwrap();

    assert_eq!(balance(&engine, BOB, "EUR").await, 20);
    let codes: Vec<_> = engine
        .accounts(BOB)
        .await
        .unwrap()
        .into_iter()
        .map(|account| account.currency_code)
        .collect();
    assert_eq!(codes, vec!["EUR".to_string(), "USD".to_string()]);
}

#[tokio::test]
async fn failed_credit_rolls_back_the_debit() {
    let (engine, db) = engine_with_db().await;
    seed(&engine).await;
    fund(&engine, "alice", 100, "USD").await;

    db.execute(Statement::from_string(
        db.get_database_backend(),
        "CREATE TRIGGER fail_credit BEFORE UPDATE ON accounts \
         WHEN NEW.amount_minor > OLD.amount_minor \
         BEGIN SELECT RAISE(ABORT, 'injected credit failure'); END;"
            .to_string(),
    ))
    .await
    .unwrap();

    let err = engine
        .transfer(TransferCmd::new(ALICE, "bob", 30, "USD"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Database(_)), "{err:?}");

    assert_eq!(balance(&engine, ALICE, "USD").await, 100);
    assert_eq!(balance(&engine, BOB, "USD").await, 0);
    assert_eq!(engine.transaction_history(ALICE, None).await.unwrap().len(), 1);
    assert!(engine.transaction_history(BOB, None).await.unwrap().is_empty());
}

#[tokio::test]
async fn admin_set_balance_records_delta() {
    let (engine, _db) = engine_with_db().await;
    seed(&engine).await;

    fund(&engine, "carol", 250, "USD").await;
    let entry = engine
        .admin_set_balance(SetBalanceCmd::new(ADMIN, "carol", 100, "USD"))
        .await
        .unwrap();

    assert_eq!(entry.kind, TransactionKind::AdminSetBalance);
    assert_eq!(entry.amount_minor, -150);
    assert_eq!(entry.balance_after_minor, 100);
    assert_eq!(entry.from_identity, ADMIN);
    assert_eq!(entry.to_identity, CAROL);
    assert_eq!(balance(&engine, CAROL, "USD").await, 100);
}

#[tokio::test]
async fn admin_set_balance_is_gated_and_validated() {
    let (engine, _db) = engine_with_db().await;
    seed(&engine).await;

    let err = engine
        .admin_set_balance(SetBalanceCmd::new(ALICE, "bob", 100, "USD"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Unauthorized(_)));

    let err = engine
        .admin_set_balance(SetBalanceCmd::new(4242, "bob", 100, "USD"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Unauthorized(_)));

    let err = engine
        .admin_set_balance(SetBalanceCmd::new(ADMIN, "bob", -1, "USD"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    let err = engine
        .admin_set_balance(SetBalanceCmd::new(ADMIN, "bob", 1, "XXX"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));

    assert_eq!(balance(&engine, BOB, "USD").await, 0);
    assert!(engine.transaction_history(BOB, None).await.unwrap().is_empty());
}

#[tokio::test]
async fn history_is_newest_first_and_capped() {
    let (engine, _db) = engine_with_db().await;
    seed(&engine).await;
    fund(&engine, "alice", 1_000, "USD").await;

    for _ in 0..12 {
        engine
            .transfer(TransferCmd::new(ALICE, "bob", 1, "USD"))
            .await
            .unwrap();
    }

    let page = engine.transaction_history(ALICE, None).await.unwrap();
    assert_eq!(page.len(), 10);
    assert!(page.windows(2).all(|w| w[0].occurred_at >= w[1].occurred_at));
    assert_eq!(page[0].balance_after_minor, 1_000 - 12);

    let all = engine.transaction_history(ALICE, Some(50)).await.unwrap();
    assert_eq!(all.len(), 13);
    assert_eq!(all.last().unwrap().kind, TransactionKind::AdminSetBalance);

    let capped = engine
        .transaction_history(ALICE, Some(MAX_HISTORY_LIMIT * 10))
        .await
        .unwrap();
    assert_eq!(capped.len(), 13);

    assert!(engine.transaction_history(ALICE, Some(0)).await.unwrap().is_empty());
}

#[tokio::test]
async fn listing_shows_active_users_with_balances() {
    let (engine, _db) = engine_with_db().await;
    seed(&engine).await;
    engine.add_currency("EUR", "Euro", "€").await.unwrap();
    fund(&engine, "alice", 300, "USD").await;
    fund(&engine, "alice", 7, "EUR").await;
    engine.disable_user("carol").await.unwrap();

    let listing = engine.list_users_with_balances().await.unwrap();
    let names: Vec<_> = listing.iter().map(|u| u.username.as_str()).collect();
    assert_eq!(names, vec!["alice", "bob", "root"]);

    let alice = &listing[0];
    assert_eq!(alice.identity, ALICE);
    assert_eq!(alice.balances.get("USD"), Some(&300));
    assert_eq!(alice.balances.get("EUR"), Some(&7));
    assert!(listing[2].is_admin);
}
