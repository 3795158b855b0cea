//! API handlers
//!
//! This module contains all the API endpoint handlers organized by resource.
//! Each handler follows a consistent pattern:
//! - Extract state and parameters using Axum extractors
//! - Call the appropriate service methods
//! - Map the result to the standardized response envelope

pub mod account;
pub mod response;
pub mod transfer;

// Re-export the response module for easy access
pub use response::ApiResponse;
