//! Document store abstraction for the ledger service
//!
//! This library gives the transfer engine a single primitive: run a
//! sequence of reads and writes against named collections as one atomic
//! unit. Two backends implement it, an in-process memory store with
//! optimistic concurrency control and a PostgreSQL store using
//! serializable transactions. Callers never see which backend is active.

pub mod memory;
pub mod postgres;
pub mod session;
pub mod store;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;
pub use session::StoreSession;
pub use store::{LedgerStore, StoreBackend};

/// A document persisted in a named collection
pub type Document = serde_json::Value;

/// Filter language for collection scans.
///
/// Covers the queries the ledger actually issues: everything, equality on
/// one top-level field, and a disjunction of nested filters.
#[derive(Debug, Clone)]
pub enum Filter {
    /// Match every document
    All,
    /// Match documents whose field equals the given value
    Eq(String, serde_json::Value),
    /// Match documents satisfying any of the nested filters
    Or(Vec<Filter>),
}

impl Filter {
    /// Equality filter on a top-level document field
    pub fn eq(field: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Filter::Eq(field.into(), value.into())
    }

    /// Disjunction of filters
    pub fn any_of(filters: Vec<Filter>) -> Self {
        Filter::Or(filters)
    }

    /// Whether a document satisfies this filter
    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Filter::All => true,
            Filter::Eq(field, value) => doc.get(field) == Some(value),
            Filter::Or(filters) => filters.iter().any(|f| f.matches(doc)),
        }
    }
}
