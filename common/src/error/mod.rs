//! Error types for the ledger service
//!
//! This module provides a unified error handling system for all crates in
//! the ledger workspace. It defines standard error types that can be used
//! across service boundaries and provides consistent error conversion.

use std::fmt::Display;
use thiserror::Error;

/// Ledger service error type
#[derive(Debug, Error)]
pub enum Error {
    /// Error when a transfer amount fails validation
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Error when the paying account of a transfer does not exist
    #[error("Invalid source account: {0}")]
    InvalidSourceAccount(String),

    /// Error when the receiving account of a transfer does not exist
    #[error("Invalid destination account: {0}")]
    InvalidDestinationAccount(String),

    /// Error when an account has insufficient funds
    #[error("Insufficient balance: {0}")]
    InsufficientBalance(String),

    /// Error when an account cannot be found
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// Generic validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Error when the store could not serialize a concurrent commit;
    /// transient, safe to retry
    #[error("Transaction conflict: {0}")]
    Conflict(String),

    /// Error when the store is unreachable or failing
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Error when an operation exceeded its deadline
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Decimal conversion error
    #[error("Decimal conversion error: {0}")]
    DecimalError(String),
}

impl Error {
    /// Whether the failure is transient and the operation may be retried.
    ///
    /// Only store conflicts qualify. Business failures must surface
    /// verbatim and infrastructure outages need caller-level backoff.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Conflict(_))
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait to add context to error results
pub trait ErrorExt<T> {
    /// Add context information to an error
    fn with_context<C, F>(self, context_fn: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Display;
}

impl<T> ErrorExt<T> for Result<T> {
    fn with_context<C, F>(self, context_fn: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Display,
    {
        self.map_err(|e| {
            let context = context_fn().to_string();
            match e {
                Error::InvalidAmount(msg) => Error::InvalidAmount(format!("{}: {}", context, msg)),
                Error::InvalidSourceAccount(msg) => {
                    Error::InvalidSourceAccount(format!("{}: {}", context, msg))
                }
                Error::InvalidDestinationAccount(msg) => {
                    Error::InvalidDestinationAccount(format!("{}: {}", context, msg))
                }
                Error::InsufficientBalance(msg) => {
                    Error::InsufficientBalance(format!("{}: {}", context, msg))
                }
                Error::AccountNotFound(msg) => {
                    Error::AccountNotFound(format!("{}: {}", context, msg))
                }
                Error::ValidationError(msg) => {
                    Error::ValidationError(format!("{}: {}", context, msg))
                }
                Error::ConfigurationError(msg) => {
                    Error::ConfigurationError(format!("{}: {}", context, msg))
                }
                Error::Conflict(msg) => Error::Conflict(format!("{}: {}", context, msg)),
                Error::Unavailable(msg) => Error::Unavailable(format!("{}: {}", context, msg)),
                Error::Timeout(msg) => Error::Timeout(format!("{}: {}", context, msg)),
                Error::Internal(msg) => Error::Internal(format!("{}: {}", context, msg)),
                Error::Database(e) => Error::Database(e),
                Error::Serialization(e) => Error::Serialization(e),
                Error::DecimalError(msg) => Error::DecimalError(format!("{}: {}", context, msg)),
            }
        })
    }
}

/// Convert string messages into an error
impl From<String> for Error {
    fn from(message: String) -> Self {
        Error::Internal(message)
    }
}

/// Convert static string references into an error
impl From<&str> for Error {
    fn from(message: &str) -> Self {
        Error::Internal(message.to_string())
    }
}

/// From rust_decimal::Error
impl From<rust_decimal::Error> for Error {
    fn from(err: rust_decimal::Error) -> Self {
        Error::DecimalError(err.to_string())
    }
}
