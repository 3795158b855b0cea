use std::sync::Arc;

use uuid::Uuid;

use common::decimal::dec;
use common::error::Error;
use common::model::EntryDirection;
use ledger_service::{
    AccountQueryService, AccountRepository, AccountService, EntryRepository, LedgerConfig,
    LedgerStore, TransferEngine,
};

// Transfer engine tests over the in-memory store

fn build_services() -> (AccountService, TransferEngine, AccountQueryService) {
    let store = LedgerStore::in_memory();
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

#[tokio::test]
async fn test_transfer_moves_funds_between_accounts() {
    let (accounts, engine, queries) = build_services();

    let a = accounts.create_account("Alice", dec!(100)).await.unwrap();
    let b = accounts.create_account("Bob", dec!(0)).await.unwrap();

    // Draining the whole balance is allowed, zero is not negative
    let correlation_id = engine.transfer(a.id, b.id, dec!(100)).await.unwrap();
    assert!(correlation_id != Uuid::nil());

    let a_view = queries.get_account_with_history(a.id).await.unwrap();
    let b_view = queries.get_account_with_history(b.id).await.unwrap();

    assert_eq!(a_view.account.balance, dec!(0));
    assert_eq!(b_view.account.balance, dec!(100));

    // Both entries of the pair name both participants, so each account
    // sees the full pair in its history
    assert_eq!(a_view.entries.len(), 2);
    assert_eq!(b_view.entries.len(), 2);
}

#[tokio::test]
async fn test_transfer_records_a_correlated_entry_pair() {
    let store = LedgerStore::in_memory();
    let accounts = AccountService::new(store.clone());
    let engine = TransferEngine::new(store.clone());
    let entries = EntryRepository::new(store);

    let a = accounts.create_account("Alice", dec!(100)).await.unwrap();
    let b = accounts.create_account("Bob", dec!(50)).await.unwrap();

    let correlation_id = engine.transfer(a.id, b.id, dec!(30)).await.unwrap();

    let pair = entries.find_by_correlation(correlation_id).await.unwrap();
    assert_eq!(pair.len(), 2);

    let outgoing = pair
        .iter()
        .find(|e| e.direction == EntryDirection::Outgoing)
        .unwrap();
    let incoming = pair
        .iter()
        .find(|e| e.direction == EntryDirection::Incoming)
        .unwrap();

    assert_eq!(outgoing.amount, dec!(30));
    assert_eq!(incoming.amount, dec!(30));

    // The outgoing entry names the transfer as issued; the incoming entry
    // swaps the roles so it reads correctly from the receiver's side
    assert_eq!(outgoing.source_account_id, a.id);
    assert_eq!(outgoing.destination_account_id, b.id);
    assert_eq!(incoming.source_account_id, b.id);
    assert_eq!(incoming.destination_account_id, a.id);

    // Each entry carries its own account's balance after the transfer
    assert_eq!(outgoing.closing_balance, dec!(70));
    assert_eq!(incoming.closing_balance, dec!(80));
}

#[tokio::test]
async fn test_transfers_conserve_the_total_balance() {
    let (accounts, engine, queries) = build_services();

    let a = accounts.create_account("Alice", dec!(100)).await.unwrap();
    let b = accounts.create_account("Bob", dec!(50)).await.unwrap();

    engine.transfer(a.id, b.id, dec!(30)).await.unwrap();
    engine.transfer(b.id, a.id, dec!(10)).await.unwrap();
    engine.transfer(a.id, b.id, dec!(20.25)).await.unwrap();

    let a_view = queries.get_account_with_history(a.id).await.unwrap();
    let b_view = queries.get_account_with_history(b.id).await.unwrap();

    assert_eq!(a_view.account.balance, dec!(59.75));
    assert_eq!(b_view.account.balance, dec!(90.25));
    assert_eq!(a_view.account.balance + b_view.account.balance, dec!(150));

    // Three transfers, each contributing a pair to both histories
    assert_eq!(a_view.entries.len(), 6);
    assert_eq!(b_view.entries.len(), 6);
}

#[tokio::test]
async fn test_insufficient_balance_leaves_state_untouched() {
    let (accounts, engine, queries) = build_services();

    let a = accounts.create_account("Alice", dec!(99)).await.unwrap();
    let b = accounts.create_account("Bob", dec!(0)).await.unwrap();

    let result = engine.transfer(a.id, b.id, dec!(100)).await;

    assert!(result.is_err());
    match result {
        Err(Error::InsufficientBalance(_)) => (),
        _ => panic!("Expected InsufficientBalance error"),
    }

    let a_view = queries.get_account_with_history(a.id).await.unwrap();
    let b_view = queries.get_account_with_history(b.id).await.unwrap();

    assert_eq!(a_view.account.balance, dec!(99));
    assert_eq!(b_view.account.balance, dec!(0));
    assert!(a_view.entries.is_empty());
    assert!(b_view.entries.is_empty());
}

#[tokio::test]
async fn test_non_positive_amounts_are_rejected() {
    let (accounts, engine, queries) = build_services();

    let a = accounts.create_account("Alice", dec!(100)).await.unwrap();
    let b = accounts.create_account("Bob", dec!(0)).await.unwrap();

    for amount in [dec!(0), dec!(-5)] {
        let result = engine.transfer(a.id, b.id, amount).await;
        match result {
            Err(Error::InvalidAmount(_)) => (),
            _ => panic!("Expected InvalidAmount error"),
        }
    }

    let a_view = queries.get_account_with_history(a.id).await.unwrap();
    assert_eq!(a_view.account.balance, dec!(100));
    assert!(a_view.entries.is_empty());
}

#[tokio::test]
async fn test_missing_source_account_is_rejected() {
    let (accounts, engine, queries) = build_services();

    let b = accounts.create_account("Bob", dec!(0)).await.unwrap();

    let result = engine.transfer(Uuid::new_v4(), b.id, dec!(10)).await;
    match result {
        Err(Error::InvalidSourceAccount(_)) => (),
        _ => panic!("Expected InvalidSourceAccount error"),
    }

    let b_view = queries.get_account_with_history(b.id).await.unwrap();
    assert_eq!(b_view.account.balance, dec!(0));
    assert!(b_view.entries.is_empty());
}

#[tokio::test]
async fn test_missing_destination_rolls_back_the_debit() {
    let (accounts, engine, queries) = build_services();

    let a = accounts.create_account("Alice", dec!(100)).await.unwrap();

    // The debit and the outgoing entry are staged before the destination
    // read fails; neither may survive
    let result = engine.transfer(a.id, Uuid::new_v4(), dec!(40)).await;
    match result {
        Err(Error::InvalidDestinationAccount(_)) => (),
        _ => panic!("Expected InvalidDestinationAccount error"),
    }

    let a_view = queries.get_account_with_history(a.id).await.unwrap();
    assert_eq!(a_view.account.balance, dec!(100));
    assert!(a_view.entries.is_empty());
}

#[tokio::test]
async fn test_transfer_to_self_keeps_the_balance() {
    let (accounts, engine, queries) = build_services();

    let a = accounts.create_account("Alice", dec!(100)).await.unwrap();

    engine.transfer(a.id, a.id, dec!(25)).await.unwrap();

    let view = queries.get_account_with_history(a.id).await.unwrap();
    assert_eq!(view.account.balance, dec!(100));
    assert_eq!(view.entries.len(), 2);

    // The outgoing leg closes on the debited balance, the incoming leg
    // on the restored one
    let outgoing = view
        .entries
        .iter()
        .find(|e| e.direction == EntryDirection::Outgoing)
        .unwrap();
    let incoming = view
        .entries
        .iter()
        .find(|e| e.direction == EntryDirection::Incoming)
        .unwrap();
    assert_eq!(outgoing.closing_balance, dec!(75));
    assert_eq!(incoming.closing_balance, dec!(100));
}

#[tokio::test]
async fn test_self_transfer_still_needs_sufficient_funds() {
    let (accounts, engine, queries) = build_services();

    let a = accounts.create_account("Alice", dec!(100)).await.unwrap();

    let result = engine.transfer(a.id, a.id, dec!(150)).await;
    match result {
        Err(Error::InsufficientBalance(_)) => (),
        _ => panic!("Expected InsufficientBalance error"),
    }

    let view = queries.get_account_with_history(a.id).await.unwrap();
    assert_eq!(view.account.balance, dec!(100));
    assert!(view.entries.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_transfers_settle_exactly() {
    let store = LedgerStore::in_memory();
    let accounts = AccountService::new(store.clone());
    let queries = AccountQueryService::new(
        AccountRepository::new(store.clone()),
        EntryRepository::new(store.clone()),
    );

    // A hundred writers hammering one source account need a much larger
    // retry budget than the default before they all get through
    let config = LedgerConfig {
        max_transfer_retries: 300,
        retry_backoff_ms: 1,
        transfer_timeout_ms: 60_000,
        ..LedgerConfig::default()
    };
    let engine = Arc::new(TransferEngine::with_config(store, &config));

    let a = accounts.create_account("Alice", dec!(1000)).await.unwrap();
    let b = accounts.create_account("Bob", dec!(0)).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..100 {
        let engine = Arc::clone(&engine);
        let (source, destination) = (a.id, b.id);
        handles.push(tokio::spawn(async move {
            engine.transfer(source, destination, dec!(10)).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let a_view = queries.get_account_with_history(a.id).await.unwrap();
    let b_view = queries.get_account_with_history(b.id).await.unwrap();

    assert_eq!(a_view.account.balance, dec!(0));
    assert_eq!(b_view.account.balance, dec!(1000));

    // 100 transfers, two entries each, visible from both sides
    assert_eq!(a_view.entries.len(), 200);
    assert_eq!(b_view.entries.len(), 200);

    let outgoing_total: common::decimal::Amount = a_view
        .entries
        .iter()
        .filter(|e| e.direction == EntryDirection::Outgoing)
        .map(|e| e.amount)
        .sum();
    assert_eq!(outgoing_total, dec!(1000));
}
