//! In-process memory backend with optimistic concurrency control
//!
//! Documents are kept versioned under one store-wide lock. A session
//! never holds the lock between operations: reads record the version they
//! observed and writes are buffered in the session. Commit takes the
//! write lock once, revalidates every recorded version, and publishes all
//! buffered writes together, so other observers see either none of a
//! session's writes or all of them. The first session to commit wins;
//! a session whose reads went stale fails with `Error::Conflict`.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use common::error::{Error, Result};

use crate::session::StoreSession;
use crate::store::StoreBackend;
use crate::{Document, Filter};

/// Version given to a document on first insert; 0 means absent
const FIRST_VERSION: u64 = 1;

#[derive(Debug, Clone)]
struct VersionedDoc {
    version: u64,
    doc: Document,
}

#[derive(Debug, Default)]
struct MemoryCollection {
    docs: HashMap<Uuid, VersionedDoc>,
    /// Ids in commit order, driving scan order for `find`
    order: Vec<Uuid>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    collections: HashMap<String, MemoryCollection>,
}

impl MemoryInner {
    /// Current version of a document, 0 when absent
    fn version_of(&self, collection: &str, id: Uuid) -> u64 {
        self.collections
            .get(collection)
            .and_then(|coll| coll.docs.get(&id))
            .map(|doc| doc.version)
            .unwrap_or(0)
    }

    fn get(&self, collection: &str, id: Uuid) -> Option<&VersionedDoc> {
        self.collections
            .get(collection)
            .and_then(|coll| coll.docs.get(&id))
    }

    fn publish(&mut self, writes: Vec<PendingWrite>) {
        for write in writes {
            match write {
                PendingWrite::Insert { collection, id, doc } => {
                    let coll = self.collections.entry(collection).or_default();
                    coll.docs.insert(
                        id,
                        VersionedDoc {
                            version: FIRST_VERSION,
                            doc,
                        },
                    );
                    coll.order.push(id);
                }
                PendingWrite::Replace { collection, id, doc } => {
                    let coll = self.collections.entry(collection).or_default();
                    match coll.docs.get_mut(&id) {
                        Some(existing) => {
                            existing.version += 1;
                            existing.doc = doc;
                        }
                        None => {
                            coll.docs.insert(
                                id,
                                VersionedDoc {
                                    version: FIRST_VERSION,
                                    doc,
                                },
                            );
                            coll.order.push(id);
                        }
                    }
                }
            }
        }
    }
}

type SharedInner = Arc<RwLock<MemoryInner>>;

fn read_guard(inner: &SharedInner) -> Result<RwLockReadGuard<'_, MemoryInner>> {
    inner
        .read()
        .map_err(|_| Error::Unavailable("memory store lock poisoned".to_string()))
}

fn write_guard(inner: &SharedInner) -> Result<RwLockWriteGuard<'_, MemoryInner>> {
    inner
        .write()
        .map_err(|_| Error::Unavailable("memory store lock poisoned".to_string()))
}

/// In-process memory store
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: SharedInner,
}

impl MemoryStore {
    /// Create an empty memory store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StoreBackend for MemoryStore {
    async fn begin(&self) -> Result<StoreSession> {
        Ok(StoreSession::Memory(MemorySession::new(self.inner.clone())))
    }

    async fn find_by_id(&self, collection: &str, id: Uuid) -> Result<Option<Document>> {
        let inner = read_guard(&self.inner)?;
        Ok(inner.get(collection, id).map(|stored| stored.doc.clone()))
    }

    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>> {
        let inner = read_guard(&self.inner)?;
        let Some(coll) = inner.collections.get(collection) else {
            return Ok(Vec::new());
        };

        let mut found = Vec::new();
        for id in &coll.order {
            if let Some(stored) = coll.docs.get(id) {
                if filter.matches(&stored.doc) {
                    found.push(stored.doc.clone());
                }
            }
        }
        Ok(found)
    }
}

enum PendingWrite {
    Insert {
        collection: String,
        id: Uuid,
        doc: Document,
    },
    Replace {
        collection: String,
        id: Uuid,
        doc: Document,
    },
}

/// Buffered session over the memory store
pub struct MemorySession {
    inner: SharedInner,
    /// (collection, id, version observed at read time); 0 means absent
    reads: Vec<(String, Uuid, u64)>,
    writes: Vec<PendingWrite>,
    /// Read-your-writes view of documents this session has written
    overlay: HashMap<(String, Uuid), Document>,
}

impl MemorySession {
    fn new(inner: SharedInner) -> Self {
        Self {
            inner,
            reads: Vec::new(),
            writes: Vec::new(),
            overlay: HashMap::new(),
        }
    }

    pub(crate) async fn find_by_id(
        &mut self,
        collection: &str,
        id: Uuid,
    ) -> Result<Option<Document>> {
        let key = (collection.to_string(), id);
        if let Some(doc) = self.overlay.get(&key) {
            return Ok(Some(doc.clone()));
        }

        let inner = read_guard(&self.inner)?;
        match inner.get(collection, id) {
            Some(stored) => {
                self.reads.push((key.0, id, stored.version));
                Ok(Some(stored.doc.clone()))
            }
            None => {
                // Record absence so a concurrent insert invalidates us
                self.reads.push((key.0, id, 0));
                Ok(None)
            }
        }
    }

    pub(crate) async fn insert_one(
        &mut self,
        collection: &str,
        id: Uuid,
        doc: Document,
    ) -> Result<()> {
        self.overlay.insert((collection.to_string(), id), doc.clone());
        self.writes.push(PendingWrite::Insert {
            collection: collection.to_string(),
            id,
            doc,
        });
        Ok(())
    }

    pub(crate) async fn replace_one(
        &mut self,
        collection: &str,
        id: Uuid,
        doc: Document,
    ) -> Result<()> {
        self.overlay.insert((collection.to_string(), id), doc.clone());
        self.writes.push(PendingWrite::Replace {
            collection: collection.to_string(),
            id,
            doc,
        });
        Ok(())
    }

    pub(crate) async fn commit(self) -> Result<()> {
        let mut inner = write_guard(&self.inner)?;

        for (collection, id, version) in &self.reads {
            let current = inner.version_of(collection, *id);
            if current != *version {
                return Err(Error::Conflict(format!(
                    "document {}/{} changed concurrently",
                    collection, id
                )));
            }
        }

        for write in &self.writes {
            if let PendingWrite::Insert { collection, id, .. } = write {
                if inner.version_of(collection, *id) != 0 {
                    return Err(Error::Conflict(format!(
                        "document {}/{} already exists",
                        collection, id
                    )));
                }
            }
        }

        debug!("Committing session with {} writes", self.writes.len());
        inner.publish(self.writes);
        Ok(())
    }

    pub(crate) async fn rollback(self) -> Result<()> {
        // Writes were only buffered, dropping them is the rollback
        debug!("Discarding session with {} writes", self.writes.len());
        Ok(())
    }
}
