//! Account model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Amount;
use crate::time::utc_now;
#[cfg(feature = "utoipa")]
use crate::utoipa::ToSchema;

/// A balance-holding account
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct Account {
    /// Unique account ID
    pub id: Uuid,
    /// Globally unique identifier shown to clients, distinct from `id`
    pub external_id: String,
    /// Display name of the account holder
    pub holder_name: String,
    /// Current balance; never negative in a committed state
    pub balance: Amount,
    /// Account creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last balance mutation; absent until the first transfer touches
    /// the account
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Account {
    /// Create a new account with generated identifiers
    pub fn new(holder_name: String, opening_balance: Amount) -> Self {
        Self {
            id: Uuid::new_v4(),
            external_id: Uuid::new_v4().to_string(),
            holder_name,
            balance: opening_balance,
            created_at: utc_now(),
            updated_at: None,
        }
    }

    /// Record a committed balance change, stamping the mutation time
    pub fn apply_balance(&mut self, new_balance: Amount) {
        self.balance = new_balance;
        self.updated_at = Some(utc_now());
    }
}
