//! Postgres store tests. Skipped unless `DATABASE_URL` points at a scratch database.

use std::sync::Arc;
use std::time::Duration;

use ledgerbank_core::AccountNumber;
use ledgerbank_infra::{LedgerError, LedgerStore, PostgresLedgerStore, TransferEngine};
use ledgerbank_ledger::NewAccount;
use uuid::Uuid;

async fn store() -> Option<Arc<PostgresLedgerStore>> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set; skipping postgres test");
        return None;
    };
    let store = PostgresLedgerStore::connect(&url, 8, Duration::from_secs(5))
        .await
        .unwrap();
    store.ensure_schema().await.unwrap();
    Some(Arc::new(store))
}

async fn open(store: &PostgresLedgerStore) -> AccountNumber {
    let email = format!("{}@bank.test", Uuid::now_v7());
    store
        .create_account(NewAccount::new("Pat", "Doe", email, "hash").unwrap())
        .await
        .unwrap()
        .account_number
}

async fn balance(store: &PostgresLedgerStore, number: AccountNumber) -> String {
    store
        .get_account_by_number(number)
        .await
        .unwrap()
        .unwrap()
        .balance
        .to_string()
}

#[tokio::test]
async fn schema_is_idempotent() {
    let Some(store) = store().await else { return };
    store.ensure_schema().await.unwrap();
}

#[tokio::test]
async fn scenario_against_postgres() {
    let Some(store) = store().await else { return };
    let a = open(&store).await;
    let b = open(&store).await;
    assert_ne!(a, b);

    let engine = TransferEngine::new(store.clone(), Duration::from_secs(5));
    engine.top_up(a, "100.00").await.unwrap();

    let view = engine.transfer(a, b, "40.00").await.unwrap();
    assert_eq!(view.sender_account.balance.to_string(), "60.00");
    assert_eq!(view.receiver_account.balance.to_string(), "40.00");

    let err = engine.transfer(a, b, "1000.00").await.unwrap_err();
    assert!(matches!(err, LedgerError::InsufficientFundsOrInvalidAccount));
    assert_eq!(balance(&store, a).await, "60.00");

    let err = engine
        .transfer(a, AccountNumber::new(i64::MAX), "1.00")
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidAccount(_)));
    assert_eq!(balance(&store, a).await, "60.00");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_drains_against_postgres() {
    let Some(store) = store().await else { return };
    let a = open(&store).await;
    let b = open(&store).await;
    let engine = Arc::new(TransferEngine::new(store.clone(), Duration::from_secs(10)));
    engine.top_up(a, "20.00").await.unwrap();

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let engine = engine.clone();
            tokio::spawn(async move { engine.transfer(a, b, "20.00").await })
        })
        .collect();

    let mut succeeded = 0;
    for task in tasks {
        if task.await.unwrap().is_ok() {
            succeeded += 1;
        }
    }
    assert_eq!(succeeded, 1);
    assert_eq!(balance(&store, a).await, "0.00");
    assert_eq!(balance(&store, b).await, "20.00");
}

#[tokio::test]
async fn balance_overflow_is_a_validation_error() {
    let Some(store) = store().await else { return };
    let a = open(&store).await;
    let engine = TransferEngine::new(store.clone(), Duration::from_secs(5));

    engine.top_up(a, "999999999999999999.99").await.unwrap();
    let err = engine.top_up(a, "0.01").await.unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)), "{err:?}");
    assert_eq!(balance(&store, a).await, "999999999999999999.99");
}

#[tokio::test]
async fn self_transfer_against_postgres() {
    let Some(store) = store().await else { return };
    let a = open(&store).await;
    let engine = TransferEngine::new(store.clone(), Duration::from_secs(5));
    engine.top_up(a, "12.00").await.unwrap();

    engine.transfer(a, a, "12.00").await.unwrap();
    assert_eq!(balance(&store, a).await, "12.00");
}
