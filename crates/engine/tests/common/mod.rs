#![allow(dead_code)]

use sea_orm::{Database, DatabaseConnection};

use engine::{Engine, SetBalanceCmd};
use migration::MigratorTrait;
use uuid::Uuid;

pub const ADMIN: i64 = 1;
pub const ALICE: i64 = 100;
pub const BOB: i64 = 200;
pub const CAROL: i64 = 300;

pub async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

/// A file-backed database with a real connection pool, for tests that need
/// parallel store access.
pub async fn engine_with_file_db() -> (Engine, DatabaseConnection, std::path::PathBuf) {
    let root = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../target/test_dbs");
    std::fs::create_dir_all(&root).unwrap();

    let path = root.join(format!("engine_{}.db", Uuid::new_v4()));
    let url = format!("sqlite:{}?mode=rwc", path.display());

    let db = Database::connect(&url).await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db, path)
}

/// USD catalog, an admin and three regular users.
pub async fn seed(engine: &Engine) {
    engine.add_currency("usd", "US Dollar", "$").await.unwrap();
    engine.create_user(ADMIN, "root").await.unwrap();
    engine.set_admin_status("root", true).await.unwrap();
    engine.create_user(ALICE, "alice").await.unwrap();
    engine.create_user(BOB, "bob").await.unwrap();
    engine.create_user(CAROL, "carol").await.unwrap();
}

pub async fn fund(engine: &Engine, username: &str, amount_minor: i64, code: &str) {
    engine
        .admin_set_balance(SetBalanceCmd::new(ADMIN, username, amount_minor, code))
        .await
        .unwrap();
}

pub async fn balance(engine: &Engine, identity: i64, code: &str) -> i64 {
    engine.account(identity, code).await.unwrap().amount_minor
}
