//! SQLite persistence adapters.
//!
//! Provides the SQLite-backed store for game configuration, balances and
//! the transaction ledger using Diesel ORM.

pub mod database;
pub mod store;

pub use store::SqliteStore;
