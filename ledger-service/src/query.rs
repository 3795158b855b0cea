//! Account query service
//!
//! Produces the read view of one account: its current fields plus every
//! ledger entry in which it appears, in chronological (commit) order.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use common::error::{Error, ErrorExt, Result};
use common::model::{Account, LedgerEntry};
#[cfg(feature = "utoipa")]
use common::utoipa::ToSchema;

use crate::repository::{AccountRepository, EntryRepository};

/// An account together with its full entry history
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct AccountView {
    /// The account's current fields
    pub account: Account,
    /// Every entry where the account is source or destination,
    /// chronological
    pub entries: Vec<LedgerEntry>,
}

/// Read-only service assembling account views
#[derive(Clone)]
pub struct AccountQueryService {
    accounts: AccountRepository,
    entries: EntryRepository,
}

impl AccountQueryService {
    /// Create a query service over the given repositories
    pub fn new(accounts: AccountRepository, entries: EntryRepository) -> Self {
        Self { accounts, entries }
    }

    /// Read one account and its full entry history.
    ///
    /// The two reads are independent rather than one atomic session, so a
    /// transfer committing between them can leave the history momentarily
    /// ahead of or behind the returned balance. Callers get a consistent
    /// account document and a consistent entry list, just not a single
    /// snapshot spanning both.
    pub async fn get_account_with_history(&self, account_id: Uuid) -> Result<AccountView> {
        let account = self
            .accounts
            .get(account_id)
            .await
            .with_context(|| format!("Failed to read account {}", account_id))?
            .ok_or_else(|| {
                Error::AccountNotFound(format!("account {} does not exist", account_id))
            })?;

        let entries = self
            .entries
            .find_for_account(account_id)
            .await
            .with_context(|| format!("Failed to read entries for account {}", account_id))?;

        Ok(AccountView { account, entries })
    }
}
