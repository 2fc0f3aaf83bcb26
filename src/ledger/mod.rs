//! Persisted ledger documents and their filesystem store.

pub mod audit;
pub mod schema;
pub mod store;
