//! Transfer engine
//!
//! Executes one funds movement as an atomic unit: debit the source,
//! credit the destination, and record the two correlated ledger entries.
//! Either all four writes become durable or none do. Store conflicts are
//! retried a bounded number of times with randomized backoff; business
//! failures surface to the caller untouched.

use std::time::Duration;

use tracing::{debug, info, warn};
use uuid::Uuid;

use common::decimal::Amount;
use common::error::{Error, Result};
use common::model::LedgerEntry;
use ledger_store::LedgerStore;

use crate::config::LedgerConfig;
use crate::repository::{AccountRepository, EntryRepository};

/// Default additional attempts after a conflicted transfer
const DEFAULT_MAX_RETRIES: u32 = 3;
/// Default base delay between conflict retries
const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_millis(20);
/// Default deadline for one transfer call
const DEFAULT_TRANSFER_TIMEOUT: Duration = Duration::from_secs(5);

/// Engine executing funds transfers between accounts
pub struct TransferEngine {
    store: LedgerStore,
    accounts: AccountRepository,
    entries: EntryRepository,
    max_retries: u32,
    retry_backoff: Duration,
    transfer_timeout: Duration,
}

impl TransferEngine {
    /// Create an engine with default retry and deadline settings
    pub fn new(store: LedgerStore) -> Self {
        Self {
            accounts: AccountRepository::new(store.clone()),
            entries: EntryRepository::new(store.clone()),
            store,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
            transfer_timeout: DEFAULT_TRANSFER_TIMEOUT,
        }
    }

    /// Create an engine with retry and deadline settings from the config
    pub fn with_config(store: LedgerStore, config: &LedgerConfig) -> Self {
        Self {
            accounts: AccountRepository::new(store.clone()),
            entries: EntryRepository::new(store.clone()),
            store,
            max_retries: config.max_transfer_retries,
            retry_backoff: config.retry_backoff(),
            transfer_timeout: config.transfer_timeout(),
        }
    }

    /// Move `amount` from the source account to the destination account.
    ///
    /// Returns the correlation id shared by the two ledger entries the
    /// transfer recorded. On any failure nothing is persisted: the four
    /// writes of a transfer are only ever visible together.
    pub async fn transfer(
        &self,
        source_account_id: Uuid,
        destination_account_id: Uuid,
        amount: Amount,
    ) -> Result<Uuid> {
        if amount <= Amount::ZERO {
            return Err(Error::InvalidAmount(format!(
                "transfer amount must be positive, got {}",
                amount
            )));
        }

        // One correlation id per logical transfer, stable across retries
        let correlation_id = Uuid::new_v4();
        debug!(
            "Transfer {}: {} -> {} amount {}",
            correlation_id, source_account_id, destination_account_id, amount
        );

        tokio::time::timeout(
            self.transfer_timeout,
            self.transfer_with_retries(
                correlation_id,
                source_account_id,
                destination_account_id,
                amount,
            ),
        )
        .await
        .map_err(|_| {
            Error::Timeout(format!(
                "transfer {} exceeded its deadline of {:?}",
                correlation_id, self.transfer_timeout
            ))
        })?
    }

    async fn transfer_with_retries(
        &self,
        correlation_id: Uuid,
        source_account_id: Uuid,
        destination_account_id: Uuid,
        amount: Amount,
    ) -> Result<Uuid> {
        let mut attempt = 0;
        loop {
            match self
                .execute_transfer(
                    correlation_id,
                    source_account_id,
                    destination_account_id,
                    amount,
                )
                .await
            {
                Ok(()) => {
                    info!("Transfer {} committed", correlation_id);
                    return Ok(correlation_id);
                }
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    let delay = self.backoff_delay(attempt);
                    warn!(
                        "Transfer {} conflicted, retry {}/{} in {:?}",
                        correlation_id, attempt, self.max_retries, delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Exponential backoff with jitter; the entropy comes from a random
    /// UUID, which keeps simultaneous losers from retrying in lockstep.
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(8);
        let base = self.retry_backoff.saturating_mul(1u32 << exponent);

        let span = self.retry_backoff.as_millis().max(1);
        let jitter_ms = (Uuid::new_v4().as_u128() % span) as u64;
        base + Duration::from_millis(jitter_ms)
    }

    /// One attempt at the transfer, all writes inside one atomic session
    async fn execute_transfer(
        &self,
        correlation_id: Uuid,
        source_account_id: Uuid,
        destination_account_id: Uuid,
        amount: Amount,
    ) -> Result<()> {
        let accounts = self.accounts.clone();
        let entries = self.entries.clone();

        self.store
            .run_atomic(move |session| {
                Box::pin(async move {
                    let mut source = accounts
                        .get_in_session(session, source_account_id)
                        .await?
                        .ok_or_else(|| {
                            Error::InvalidSourceAccount(format!(
                                "account {} does not exist",
                                source_account_id
                            ))
                        })?;

                    let new_source_balance = source.balance - amount;
                    if new_source_balance < Amount::ZERO {
                        return Err(Error::InsufficientBalance(format!(
                            "account {} holds {}, cannot send {}",
                            source_account_id, source.balance, amount
                        )));
                    }

                    let outgoing = LedgerEntry::outgoing(
                        correlation_id,
                        source_account_id,
                        destination_account_id,
                        amount,
                        new_source_balance,
                    );
                    entries.insert_in_session(session, &outgoing).await?;

                    source.apply_balance(new_source_balance);
                    accounts.update_in_session(session, &source).await?;

                    // Read after the source writes so a transfer to self
                    // observes the debited balance
                    let mut destination = accounts
                        .get_in_session(session, destination_account_id)
                        .await?
                        .ok_or_else(|| {
                            Error::InvalidDestinationAccount(format!(
                                "account {} does not exist",
                                destination_account_id
                            ))
                        })?;

                    let new_destination_balance = destination.balance + amount;

                    let incoming = LedgerEntry::incoming(
                        correlation_id,
                        source_account_id,
                        destination_account_id,
                        amount,
                        new_destination_balance,
                    );
                    entries.insert_in_session(session, &incoming).await?;

                    destination.apply_balance(new_destination_balance);
                    accounts.update_in_session(session, &destination).await?;

                    Ok(())
                })
            })
            .await
    }
}
