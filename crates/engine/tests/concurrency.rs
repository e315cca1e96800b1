mod common;

use std::sync::Arc;

use common::{ALICE, BOB, CAROL, balance, engine_with_file_db, fund, seed};
use engine::{EngineError, TransferCmd};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_overdraft_race_has_one_winner() {
    let (engine, _db, path) = engine_with_file_db().await;
    let engine = Arc::new(engine);
    seed(&engine).await;
    fund(&engine, "alice", 100, "USD").await;

    let mut tasks = Vec::new();
    for recipient in ["bob", "carol"] {
        let engine = engine.clone();
        tasks.push(tokio::spawn(async move {
            engine
                .transfer(TransferCmd::new(ALICE, recipient, 60, "USD"))
                .await
        }));
    }

    let mut succeeded = 0;
    let mut insufficient = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => succeeded += 1,
            Err(EngineError::InsufficientFunds(_)) => insufficient += 1,
            Err(err) => panic!("unexpected error: {err:?}"),
        }
    }
    assert_eq!((succeeded, insufficient), (1, 1));

    let alice = balance(&engine, ALICE, "USD").await;
    let bob = balance(&engine, BOB, "USD").await;
    let carol = balance(&engine, CAROL, "USD").await;
    assert_eq!(alice, 40);
    assert_eq!(alice + bob + carol, 100);

    drop(engine);
    let _ = std::fs::remove_file(path);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn opposite_transfers_conserve_money() {
    let (engine, _db, path) = engine_with_file_db().await;
    let engine = Arc::new(engine);
    seed(&engine).await;
    fund(&engine, "alice", 500, "USD").await;
    fund(&engine, "bob", 500, "USD").await;

    let mut tasks = Vec::new();
    for i in 0..20 {
        let engine = engine.clone();
        tasks.push(tokio::spawn(async move {
            let cmd = if i % 2 == 0 {
                TransferCmd::new(ALICE, "bob", 7, "USD")
            } else {
                TransferCmd::new(BOB, "alice", 3, "USD")
            };
            engine.transfer(cmd).await
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let alice = balance(&engine, ALICE, "USD").await;
    let bob = balance(&engine, BOB, "USD").await;
    assert_eq!(alice + bob, 1_000);
    assert_eq!(alice, 500 - 10 * 7 + 10 * 3);

    let history = engine.transaction_history(ALICE, Some(100)).await.unwrap();
    assert_eq!(history.len(), 21);
    assert!(history.iter().all(|tx| tx.balance_after_minor >= 0));

    drop(engine);
    let _ = std::fs::remove_file(path);
}
