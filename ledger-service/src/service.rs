//! Account provisioning service
//!
//! Creates accounts and serves single-account lookups. Balances are only
//! ever mutated by the transfer engine afterwards.

use tracing::info;
use uuid::Uuid;

use common::decimal::{precision, Amount};
use common::error::{Error, Result};
use common::model::Account;
use ledger_store::LedgerStore;

use crate::repository::AccountRepository;

/// Service for creating and fetching accounts
#[derive(Clone)]
pub struct AccountService {
    store: LedgerStore,
    accounts: AccountRepository,
}

impl AccountService {
    /// Create an account service over the given store
    pub fn new(store: LedgerStore) -> Self {
        Self {
            accounts: AccountRepository::new(store.clone()),
            store,
        }
    }

    /// Create a new account for `holder_name` with the given opening
    /// balance.
    ///
    /// The opening balance is rounded to currency scale and must not be
    /// negative; zero opens an empty account.
    pub async fn create_account(&self, holder_name: &str, opening_balance: Amount) -> Result<Account> {
        let holder_name = holder_name.trim();
        if holder_name.is_empty() {
            return Err(Error::ValidationError(
                "holder name must not be empty".to_string(),
            ));
        }
        if opening_balance < Amount::ZERO {
            return Err(Error::InvalidAmount(format!(
                "opening balance must not be negative, got {}",
                opening_balance
            )));
        }

        let account = Account::new(
            holder_name.to_string(),
            precision::round_amount(opening_balance),
        );
        info!(
            "Creating account {} for '{}' with opening balance {}",
            account.id, account.holder_name, account.balance
        );

        let accounts = self.accounts.clone();
        let to_store = account.clone();
        self.store
            .run_atomic(move |session| {
                Box::pin(async move { accounts.insert_in_session(session, &to_store).await })
            })
            .await?;

        Ok(account)
    }

    /// Fetch a single account by id
    pub async fn get_account(&self, id: Uuid) -> Result<Account> {
        self.accounts
            .get(id)
            .await?
            .ok_or_else(|| Error::AccountNotFound(format!("account {} does not exist", id)))
    }
}
