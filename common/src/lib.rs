//! Common types and utilities for the ledger service
//!
//! This library contains shared types and abstractions used across the
//! ledger workspace. It provides a unified approach to error handling,
//! monetary amounts, timestamps, and the persisted domain models.

pub mod decimal;
pub mod error;
pub mod model;
pub mod time;

/// Re-export important types
pub use decimal::*;
pub use error::{Error, ErrorExt, Result};
pub use time::utc_now;

// Re-export utoipa for use in model ToSchema derives
#[cfg(feature = "utoipa")]
pub use utoipa;
