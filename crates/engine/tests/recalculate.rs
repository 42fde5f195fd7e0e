use chrono::Utc;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};
use uuid::Uuid;

use engine::{Currency, Engine, EngineError};
use migration::MigratorTrait;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    engine.create_user("alice").await.unwrap();
    (engine, db)
}

async fn execute(db: &DatabaseConnection, sql: &str, values: Vec<sea_orm::Value>) {
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(backend, sql, values))
        .await
        .unwrap();
}

async fn new_wallet(engine: &Engine, name: &str) -> Uuid {
    engine
        .new_wallet("alice", name, Currency::Eur, 0)
        .await
        .unwrap()
}

#[tokio::test]
async fn drifted_counter_is_reset_to_ledger_truth() {
    let (engine, db) = engine_with_db().await;
    let wallet_id = new_wallet(&engine, "Cash").await;

    // No ledger entries exist, so whatever the counter says, truth is 0.
    execute(
        &db,
        "UPDATE wallets SET balance = ? WHERE id = ?",
        vec![777.into(), wallet_id.to_string().into()],
    )
    .await;

    let report = engine.recalculate("alice").await.unwrap();

    assert!(report.is_clean());
    assert_eq!(report.balances.get(&wallet_id), Some(&0));
    let wallet = engine.wallet(wallet_id, "alice").await.unwrap();
    assert_eq!(wallet.balance, 0);
}

#[tokio::test]
async fn aggregates_all_three_collections() {
    let (engine, db) = engine_with_db().await;
    let a = new_wallet(&engine, "Checking").await;
    let b = new_wallet(&engine, "Savings").await;
    let now = Utc::now();

    engine.income("alice", a, 100, now, None).await.unwrap();
    engine.income("alice", a, 50, now, None).await.unwrap();
    engine.outcome("alice", a, 30, now, None).await.unwrap();
    engine.transfer("alice", b, a, 20, now, None).await.unwrap();

    // Scramble both counters to prove the run ignores them.
    for wallet_id in [a, b] {
        execute(
            &db,
            "UPDATE wallets SET balance = ? WHERE id = ?",
            vec![(-9999).into(), wallet_id.to_string().into()],
        )
        .await;
    }

    let report = engine.recalculate("alice").await.unwrap();

    assert!(report.is_clean());
    assert_eq!(report.balances.get(&a), Some(&140));
    assert_eq!(report.balances.get(&b), Some(&-20));
    assert_eq!(engine.wallet(a, "alice").await.unwrap().balance, 140);
    assert_eq!(engine.wallet(b, "alice").await.unwrap().balance, -20);
}

#[tokio::test]
async fn rerun_on_unchanged_ledger_is_idempotent() {
    let (engine, _db) = engine_with_db().await;
    let wallet_id = new_wallet(&engine, "Cash").await;
    let now = Utc::now();

    engine
        .income("alice", wallet_id, 1234, now, None)
        .await
        .unwrap();
    engine
        .outcome("alice", wallet_id, 234, now, None)
        .await
        .unwrap();

    let first = engine.recalculate("alice").await.unwrap();
    let second = engine.recalculate("alice").await.unwrap();

    assert_eq!(first.balances, second.balances);
    assert_eq!(second.balances.get(&wallet_id), Some(&1000));
}

#[tokio::test]
async fn archived_wallets_are_still_recalculated() {
    let (engine, db) = engine_with_db().await;
    let wallet_id = new_wallet(&engine, "Old").await;
    let now = Utc::now();

    engine
        .income("alice", wallet_id, 500, now, None)
        .await
        .unwrap();
    engine
        .set_wallet_archived(wallet_id, true, "alice")
        .await
        .unwrap();
    execute(
        &db,
        "UPDATE wallets SET balance = ? WHERE id = ?",
        vec![1.into(), wallet_id.to_string().into()],
    )
    .await;

    let report = engine.recalculate("alice").await.unwrap();

    assert_eq!(report.balances.get(&wallet_id), Some(&500));
    assert_eq!(engine.wallet(wallet_id, "alice").await.unwrap().balance, 500);
}

#[tokio::test]
async fn entries_of_deleted_wallets_become_orphans() {
    let (engine, _db) = engine_with_db().await;
    let kept = new_wallet(&engine, "Kept").await;
    let doomed = new_wallet(&engine, "Doomed").await;
    let now = Utc::now();

    engine.income("alice", kept, 100, now, None).await.unwrap();
    engine.income("alice", doomed, 40, now, None).await.unwrap();
    engine.outcome("alice", doomed, 10, now, None).await.unwrap();
    engine.delete_wallet(doomed, "alice").await.unwrap();

    let report = engine.recalculate("alice").await.unwrap();

    assert_eq!(report.balances.len(), 1);
    assert_eq!(report.balances.get(&kept), Some(&100));
    assert_eq!(report.orphans.incomes.len(), 1);
    assert_eq!(report.orphans.incomes[0].wallet_id, doomed);
    assert_eq!(report.orphans.outcomes.len(), 1);
    assert_eq!(report.orphans.total(), 2);
    assert!(report.write_failures.is_empty());
}

#[tokio::test]
async fn half_orphaned_transfer_still_applies_valid_side() {
    let (engine, _db) = engine_with_db().await;
    let source = new_wallet(&engine, "Source").await;
    let sink = new_wallet(&engine, "Sink").await;
    let now = Utc::now();

    engine.income("alice", source, 100, now, None).await.unwrap();
    engine
        .transfer("alice", source, sink, 20, now, None)
        .await
        .unwrap();
    engine.delete_wallet(sink, "alice").await.unwrap();

    let report = engine.recalculate("alice").await.unwrap();

    // The debit side survives; only the dangling credit side is reported.
    assert_eq!(report.balances.get(&source), Some(&80));
    assert!(report.orphans.transfer_sources.is_empty());
    assert_eq!(report.orphans.transfer_destinations.len(), 1);
    assert_eq!(report.orphans.transfer_destinations[0].to_wallet_id, sink);
}

#[tokio::test]
async fn corrupt_rows_are_quarantined_not_aggregated() {
    let (engine, db) = engine_with_db().await;
    let wallet_id = new_wallet(&engine, "Cash").await;
    let now = Utc::now();

    let bad = engine
        .income("alice", wallet_id, 100, now, None)
        .await
        .unwrap();
    engine
        .income("alice", wallet_id, 200, now, None)
        .await
        .unwrap();
    let ugly = engine
        .outcome("alice", wallet_id, 30, now, None)
        .await
        .unwrap();

    execute(
        &db,
        "UPDATE incomes SET amount_minor = ? WHERE id = ?",
        vec![(-5).into(), bad.to_string().into()],
    )
    .await;
    execute(
        &db,
        "UPDATE outcomes SET currency = ? WHERE id = ?",
        vec!["DOGE".into(), ugly.to_string().into()],
    )
    .await;

    let report = engine.recalculate("alice").await.unwrap();

    assert_eq!(report.balances.get(&wallet_id), Some(&200));
    assert_eq!(report.invalid.len(), 2);
    let collections: Vec<&str> = report.invalid.iter().map(|r| r.collection).collect();
    assert!(collections.contains(&"incomes"));
    assert!(collections.contains(&"outcomes"));
    assert!(report.orphans.is_empty());
}

#[tokio::test]
async fn unknown_user_is_rejected() {
    let (engine, _db) = engine_with_db().await;

    let err = engine.recalculate("nobody").await.unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}

#[tokio::test]
async fn blocked_write_is_collected_while_siblings_proceed() {
    let (engine, db) = engine_with_db().await;
    let good = new_wallet(&engine, "Good").await;
    let stuck = new_wallet(&engine, "Stuck").await;
    let now = Utc::now();

    engine.income("alice", good, 500, now, None).await.unwrap();
    engine.income("alice", stuck, 700, now, None).await.unwrap();
    for wallet_id in [good, stuck] {
        execute(
            &db,
            "UPDATE wallets SET balance = ? WHERE id = ?",
            vec![1.into(), wallet_id.to_string().into()],
        )
        .await;
    }
    // Make the balance write fail for one wallet only.
    execute(
        &db,
        &format!(
            "CREATE TRIGGER stuck_wallet_is_readonly \
             BEFORE UPDATE ON wallets WHEN NEW.id = '{stuck}' \
             BEGIN SELECT RAISE(ABORT, 'wallet row locked'); END"
        ),
        vec![],
    )
    .await;

    let report = engine.recalculate("alice").await.unwrap();

    assert_eq!(report.write_failures.len(), 1);
    assert_eq!(report.write_failures[0].wallet_id, stuck);
    // The computed balance is still reported even though it was not persisted.
    assert_eq!(report.balances.get(&stuck), Some(&700));
    assert_eq!(engine.wallet(stuck, "alice").await.unwrap().balance, 1);
    // The sibling write went through.
    assert_eq!(report.balances.get(&good), Some(&500));
    assert_eq!(engine.wallet(good, "alice").await.unwrap().balance, 500);
}

#[tokio::test]
async fn loading_flag_flips_on_and_off_on_success() {
    let (engine, _db) = engine_with_db().await;
    new_wallet(&engine, "Cash").await;

    let mut flags: Vec<bool> = Vec::new();
    engine
        .recalculate_with_progress("alice", |on| flags.push(on))
        .await
        .unwrap();

    assert_eq!(flags, vec![true, false]);
}

#[tokio::test]
async fn fetch_failure_aborts_without_writes_and_clears_loading_flag() {
    let (engine, db) = engine_with_db().await;
    let wallet_id = new_wallet(&engine, "Cash").await;

    execute(
        &db,
        "UPDATE wallets SET balance = ? WHERE id = ?",
        vec![777.into(), wallet_id.to_string().into()],
    )
    .await;
    execute(&db, "DROP TABLE incomes", vec![]).await;

    let mut flags: Vec<bool> = Vec::new();
    let result = engine
        .recalculate_with_progress("alice", |on| flags.push(on))
        .await;

    assert!(result.is_err());
    assert_eq!(flags, vec![true, false]);
    // Nothing was written back.
    assert_eq!(engine.wallet(wallet_id, "alice").await.unwrap().balance, 777);
}
