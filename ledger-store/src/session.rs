//! Atomic session handle
//!
//! A session is either a buffered view over the memory store or a live
//! PostgreSQL transaction. Commit and rollback consume the session, so a
//! handle can never be reused after it resolves.

use uuid::Uuid;

use common::error::Result;

use crate::memory::MemorySession;
use crate::postgres::PgSession;
use crate::Document;

/// Session enum covering every backend
pub enum StoreSession {
    /// Session over the in-process memory store
    Memory(MemorySession),
    /// Session over a PostgreSQL transaction
    Postgres(PgSession),
}

impl StoreSession {
    /// Read a document by id.
    ///
    /// Writes buffered in this session are visible to this read.
    pub async fn find_by_id(&mut self, collection: &str, id: Uuid) -> Result<Option<Document>> {
        match self {
            StoreSession::Memory(session) => session.find_by_id(collection, id).await,
            StoreSession::Postgres(session) => session.find_by_id(collection, id).await,
        }
    }

    /// Insert a new document under the given id
    pub async fn insert_one(&mut self, collection: &str, id: Uuid, doc: Document) -> Result<()> {
        match self {
            StoreSession::Memory(session) => session.insert_one(collection, id, doc).await,
            StoreSession::Postgres(session) => session.insert_one(collection, id, doc).await,
        }
    }

    /// Replace the document stored under the given id
    pub async fn replace_one(&mut self, collection: &str, id: Uuid, doc: Document) -> Result<()> {
        match self {
            StoreSession::Memory(session) => session.replace_one(collection, id, doc).await,
            StoreSession::Postgres(session) => session.replace_one(collection, id, doc).await,
        }
    }

    /// Commit every write issued through this session
    pub async fn commit(self) -> Result<()> {
        match self {
            StoreSession::Memory(session) => session.commit().await,
            StoreSession::Postgres(session) => session.commit().await,
        }
    }

    /// Discard every write issued through this session
    pub async fn rollback(self) -> Result<()> {
        match self {
            StoreSession::Memory(session) => session.rollback().await,
            StoreSession::Postgres(session) => session.rollback().await,
        }
    }
}
