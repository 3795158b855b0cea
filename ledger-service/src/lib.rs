//! Ledger services: account provisioning, the atomic transfer engine,
//! and the account history query service

use std::sync::Arc;

pub mod config;
pub mod engine;
pub mod query;
pub mod repository;
pub mod service;

pub use config::{LedgerConfig, StoreKind};
pub use engine::TransferEngine;
pub use query::{AccountQueryService, AccountView};
pub use repository::{AccountRepository, EntryRepository};
pub use service::AccountService;

use common::error::Result;
use ledger_store::PostgresStore;

pub use ledger_store::LedgerStore;

/// Build the document store selected by the configuration
pub async fn build_store(config: &LedgerConfig) -> Result<LedgerStore> {
    match config.store {
        StoreKind::Memory => Ok(LedgerStore::in_memory()),
        StoreKind::Postgres => {
            let backend =
                PostgresStore::connect(&config.database_url, config.db_pool_size).await?;
            Ok(LedgerStore::new(Arc::new(backend)))
        }
    }
}
