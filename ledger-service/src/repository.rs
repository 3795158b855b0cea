//! Typed repositories over the document store
//!
//! The store traffics in JSON documents; these repositories own the
//! conversion to and from the domain models for their collections.

use tracing::debug;
use uuid::Uuid;

use common::error::Result;
use common::model::{Account, LedgerEntry, ACCOUNTS_COLLECTION, ENTRIES_COLLECTION};
use ledger_store::{Document, Filter, LedgerStore, StoreSession};

/// Typed access to account documents
#[derive(Clone)]
pub struct AccountRepository {
    store: LedgerStore,
}

impl AccountRepository {
    /// Create a repository over the given store
    pub fn new(store: LedgerStore) -> Self {
        Self { store }
    }

    fn to_doc(account: &Account) -> Result<Document> {
        Ok(serde_json::to_value(account)?)
    }

    fn from_doc(doc: Document) -> Result<Account> {
        Ok(serde_json::from_value(doc)?)
    }

    /// Read an account outside any session
    pub async fn get(&self, id: Uuid) -> Result<Option<Account>> {
        let doc = self.store.find_by_id(ACCOUNTS_COLLECTION, id).await?;
        doc.map(Self::from_doc).transpose()
    }

    /// Read an account through an atomic session
    pub async fn get_in_session(
        &self,
        session: &mut StoreSession,
        id: Uuid,
    ) -> Result<Option<Account>> {
        let doc = session.find_by_id(ACCOUNTS_COLLECTION, id).await?;
        doc.map(Self::from_doc).transpose()
    }

    /// Insert a freshly created account through an atomic session
    pub async fn insert_in_session(
        &self,
        session: &mut StoreSession,
        account: &Account,
    ) -> Result<()> {
        debug!("Inserting account {}", account.id);
        session
            .insert_one(ACCOUNTS_COLLECTION, account.id, Self::to_doc(account)?)
            .await
    }

    /// Persist an account's new balance through an atomic session
    pub async fn update_in_session(
        &self,
        session: &mut StoreSession,
        account: &Account,
    ) -> Result<()> {
        debug!("Updating account {}", account.id);
        session
            .replace_one(ACCOUNTS_COLLECTION, account.id, Self::to_doc(account)?)
            .await
    }
}

/// Typed access to ledger-entry documents
#[derive(Clone)]
pub struct EntryRepository {
    store: LedgerStore,
}

impl EntryRepository {
    /// Create a repository over the given store
    pub fn new(store: LedgerStore) -> Self {
        Self { store }
    }

    fn to_doc(entry: &LedgerEntry) -> Result<Document> {
        Ok(serde_json::to_value(entry)?)
    }

    fn from_doc(doc: Document) -> Result<LedgerEntry> {
        Ok(serde_json::from_value(doc)?)
    }

    /// Record one entry of a transfer through an atomic session
    pub async fn insert_in_session(
        &self,
        session: &mut StoreSession,
        entry: &LedgerEntry,
    ) -> Result<()> {
        debug!(
            "Inserting {:?} entry {} for transfer {}",
            entry.direction, entry.id, entry.correlation_id
        );
        session
            .insert_one(ENTRIES_COLLECTION, entry.id, Self::to_doc(entry)?)
            .await
    }

    /// Entries where the account appears on either side, in commit order
    pub async fn find_for_account(&self, account_id: Uuid) -> Result<Vec<LedgerEntry>> {
        let id = account_id.to_string();
        let filter = Filter::any_of(vec![
            Filter::eq("source_account_id", id.clone()),
            Filter::eq("destination_account_id", id),
        ]);

        let docs = self.store.find(ENTRIES_COLLECTION, &filter).await?;
        docs.into_iter().map(Self::from_doc).collect()
    }

    /// Both entries recorded under one correlation id, in commit order
    pub async fn find_by_correlation(&self, correlation_id: Uuid) -> Result<Vec<LedgerEntry>> {
        let filter = Filter::eq("correlation_id", correlation_id.to_string());

        let docs = self.store.find(ENTRIES_COLLECTION, &filter).await?;
        docs.into_iter().map(Self::from_doc).collect()
    }
}
