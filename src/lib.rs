// This is a metapackage for tests
// Re-export the workspace crates so the integration tests can reach
// everything through one dependency

pub use api_gateway;
pub use common;
pub use ledger_service;
pub use ledger_store;
