//! Ledger-entry model
//!
//! A transfer commits exactly two entries under one correlation id: an
//! `Outgoing` entry against the paying account and an `Incoming` entry
//! against the receiving account. Entries are immutable once committed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Amount;
use crate::time::utc_now;
#[cfg(feature = "utoipa")]
use crate::utoipa::ToSchema;

/// Which side of a transfer an entry records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub enum EntryDirection {
    /// The paying side; the owning account's balance decreased
    Outgoing,
    /// The receiving side; the owning account's balance increased
    Incoming,
}

/// One half of a transfer record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct LedgerEntry {
    /// Unique entry ID
    pub id: Uuid,
    /// Shared by the two entries of one transfer
    pub correlation_id: Uuid,
    /// Account that paid for this leg
    pub source_account_id: Uuid,
    /// Account that was paid for this leg
    pub destination_account_id: Uuid,
    /// Side of the transfer this entry records
    pub direction: EntryDirection,
    /// Transferred amount; positive and equal on both entries of a pair
    pub amount: Amount,
    /// Owning account's balance immediately after this entry applied
    pub closing_balance: Amount,
    /// Entry timestamp
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Entry recorded against the paying account of a transfer.
    ///
    /// `source_account_id` and `destination_account_id` are the transfer's
    /// own source and destination.
    pub fn outgoing(
        correlation_id: Uuid,
        source_account_id: Uuid,
        destination_account_id: Uuid,
        amount: Amount,
        closing_balance: Amount,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            correlation_id,
            source_account_id,
            destination_account_id,
            direction: EntryDirection::Outgoing,
            amount,
            closing_balance,
            created_at: utc_now(),
        }
    }

    /// Entry recorded against the receiving account of a transfer.
    ///
    /// Takes the transfer's source and destination in the same order as
    /// [`LedgerEntry::outgoing`] and stores them swapped, so that each
    /// entry read on its own names who paid whom for its leg.
    pub fn incoming(
        correlation_id: Uuid,
        source_account_id: Uuid,
        destination_account_id: Uuid,
        amount: Amount,
        closing_balance: Amount,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            correlation_id,
            source_account_id: destination_account_id,
            destination_account_id: source_account_id,
            direction: EntryDirection::Incoming,
            amount,
            closing_balance,
            created_at: utc_now(),
        }
    }
}
