//! Store handle and the atomic execution primitive
//!
//! `LedgerStore` is the handle the service layer holds. It exposes plain
//! reads for query paths and `run_atomic` for everything that mutates
//! ledger state. The backend trait keeps the storage technology behind a
//! uniform session interface.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use tracing::error;
use uuid::Uuid;

use common::error::Result;

use crate::memory::MemoryStore;
use crate::session::StoreSession;
use crate::{Document, Filter};

/// Backend interface implemented by each storage technology
#[async_trait]
pub trait StoreBackend: Send + Sync {
    /// Open a new atomic session
    async fn begin(&self) -> Result<StoreSession>;

    /// Read a single document outside any session
    async fn find_by_id(&self, collection: &str, id: Uuid) -> Result<Option<Document>>;

    /// Read all matching documents outside any session, in insert order
    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>>;
}

/// Handle to the document store backing the ledger
#[derive(Clone)]
pub struct LedgerStore {
    backend: Arc<dyn StoreBackend>,
}

impl LedgerStore {
    /// Create a store handle over the given backend
    pub fn new(backend: Arc<dyn StoreBackend>) -> Self {
        Self { backend }
    }

    /// Create a store backed by the in-process memory backend
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Read a single document outside any session
    pub async fn find_by_id(&self, collection: &str, id: Uuid) -> Result<Option<Document>> {
        self.backend.find_by_id(collection, id).await
    }

    /// Read all matching documents outside any session, in insert order
    pub async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>> {
        self.backend.find(collection, filter).await
    }

    /// Run `work` as one atomic unit.
    ///
    /// Every operation issued through the session handle is part of the
    /// same unit: returning `Ok` commits all of them durably before this
    /// method returns, returning `Err` rolls all of them back and
    /// propagates the error unchanged. Commit itself can fail with
    /// `Error::Conflict` when a concurrent session could not be
    /// serialized; callers decide whether to retry.
    pub async fn run_atomic<T, F>(&self, work: F) -> Result<T>
    where
        F: for<'s> FnOnce(&'s mut StoreSession) -> BoxFuture<'s, Result<T>>,
    {
        let mut session = self.backend.begin().await?;

        let work_result = work(&mut session).await;

        match work_result {
            Ok(value) => {
                session.commit().await?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback_err) = session.rollback().await {
                    // Keep the original failure, the rollback error is secondary
                    error!("Failed to roll back session: {}", rollback_err);
                }
                Err(e)
            }
        }
    }
}
