use std::sync::Arc;

use futures::future::join_all;
use tokio::test;
use uuid::Uuid;

use common::decimal::dec;
use common::error::Error;
use common::model::EntryDirection;
use dotenv::dotenv;
use ledger_service::{
    build_store, AccountQueryService, AccountRepository, AccountService, EntryRepository,
    LedgerConfig, LedgerStore, StoreKind, TransferEngine,
};

// PostgreSQL integration tests for the transfer engine
// These tests require a running PostgreSQL database
// Run with: cargo test --test transfer_postgres_tests -- --ignored

async fn create_test_store() -> LedgerStore {
    dotenv().ok(); // Load .env.test if it exists

    let database_url = std::env::var("TEST_DATABASE_URL")
        .expect("TEST_DATABASE_URL must be set to run PostgreSQL tests");

    let config = LedgerConfig::new(StoreKind::Postgres, database_url, 10);
    build_store(&config)
        .await
        .expect("Failed to connect to the test database")
}

fn build_services(store: LedgerStore) -> (AccountService, TransferEngine, AccountQueryService) {
    let queries = AccountQueryService::new(
        AccountRepository::new(store.clone()),
        EntryRepository::new(store.clone()),
    );

    (
        AccountService::new(store.clone()),
        TransferEngine::new(store),
        queries,
    )
}

#[test]
#[ignore = "Requires test database"]
async fn test_postgres_account_creation() {
    let store = create_test_store().await;
    let (accounts, _engine, _queries) = build_services(store);

    let account = accounts.create_account("Alice", dec!(500)).await.unwrap();
    assert!(account.id != Uuid::nil());

    let retrieved = accounts.get_account(account.id).await.unwrap();
    assert_eq!(retrieved.id, account.id);
    assert_eq!(retrieved.holder_name, "Alice");
    assert_eq!(retrieved.balance, dec!(500));
}

#[test]
#[ignore = "Requires test database"]
async fn test_postgres_transfer_and_history() {
    let store = create_test_store().await;
    let (accounts, engine, queries) = build_services(store);

    let a = accounts.create_account("Alice", dec!(500)).await.unwrap();
    let b = accounts.create_account("Bob", dec!(100)).await.unwrap();

    let correlation_id = engine.transfer(a.id, b.id, dec!(125.50)).await.unwrap();

    let a_view = queries.get_account_with_history(a.id).await.unwrap();
    let b_view = queries.get_account_with_history(b.id).await.unwrap();

    assert_eq!(a_view.account.balance, dec!(374.50));
    assert_eq!(b_view.account.balance, dec!(225.50));
    assert_eq!(a_view.entries.len(), 2);
    assert_eq!(b_view.entries.len(), 2);

    let outgoing = a_view
        .entries
        .iter()
        .find(|e| e.direction == EntryDirection::Outgoing)
        .unwrap();
    let incoming = a_view
        .entries
        .iter()
        .find(|e| e.direction == EntryDirection::Incoming)
        .unwrap();

    assert_eq!(outgoing.correlation_id, correlation_id);
    assert_eq!(incoming.correlation_id, correlation_id);
    assert_eq!(outgoing.closing_balance, dec!(374.50));
    assert_eq!(incoming.closing_balance, dec!(225.50));
}

#[test]
#[ignore = "Requires test database"]
async fn test_postgres_insufficient_balance() {
    let store = create_test_store().await;
    let (accounts, engine, queries) = build_services(store);

    let a = accounts.create_account("Alice", dec!(10)).await.unwrap();
    let b = accounts.create_account("Bob", dec!(0)).await.unwrap();

    let result = engine.transfer(a.id, b.id, dec!(50)).await;
    assert!(result.is_err());
    match result {
        Err(Error::InsufficientBalance(_)) => (),
        _ => panic!("Expected InsufficientBalance error"),
    }

    let a_view = queries.get_account_with_history(a.id).await.unwrap();
    assert_eq!(a_view.account.balance, dec!(10));
    assert!(a_view.entries.is_empty());
}

#[test]
#[ignore = "Requires test database"]
async fn test_postgres_missing_destination_rolls_back() {
    let store = create_test_store().await;
    let (accounts, engine, queries) = build_services(store);

    let a = accounts.create_account("Alice", dec!(100)).await.unwrap();

    let result = engine.transfer(a.id, Uuid::new_v4(), dec!(40)).await;
    match result {
        Err(Error::InvalidDestinationAccount(_)) => (),
        _ => panic!("Expected InvalidDestinationAccount error"),
    }

    let a_view = queries.get_account_with_history(a.id).await.unwrap();
    assert_eq!(a_view.account.balance, dec!(100));
    assert!(a_view.entries.is_empty());
}

#[test]
#[ignore = "Requires test database"]
async fn test_postgres_concurrent_transfers_are_serialized() {
    let store = create_test_store().await;
    let accounts = AccountService::new(store.clone());
    let queries = AccountQueryService::new(
        AccountRepository::new(store.clone()),
        EntryRepository::new(store.clone()),
    );

    // Serialization failures are expected here; give the engine room
    // to retry them all the way through
    let config = LedgerConfig {
        max_transfer_retries: 50,
        retry_backoff_ms: 5,
        transfer_timeout_ms: 30_000,
        ..LedgerConfig::default()
    };
    let engine = Arc::new(TransferEngine::with_config(store, &config));

    let a = accounts.create_account("Alice", dec!(100)).await.unwrap();
    let b = accounts.create_account("Bob", dec!(100)).await.unwrap();

    let transfers = (0..5).map(|_| {
        let engine = Arc::clone(&engine);
        let (source, destination) = (a.id, b.id);
        async move { engine.transfer(source, destination, dec!(10)).await }
    });

    for result in join_all(transfers).await {
        result.unwrap();
    }

    let a_view = queries.get_account_with_history(a.id).await.unwrap();
    let b_view = queries.get_account_with_history(b.id).await.unwrap();

    assert_eq!(a_view.account.balance, dec!(50));
    assert_eq!(b_view.account.balance, dec!(150));
    assert_eq!(a_view.entries.len(), 10);
    assert_eq!(b_view.entries.len(), 10);
}
