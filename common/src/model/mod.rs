//! Domain models for the ledger service

pub mod account;
pub mod entry;

pub use account::Account;
pub use entry::{EntryDirection, LedgerEntry};

/// Logical collection holding account documents
pub const ACCOUNTS_COLLECTION: &str = "accounts";

/// Logical collection holding ledger-entry documents
pub const ENTRIES_COLLECTION: &str = "ledger_entries";
