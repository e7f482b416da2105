//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`domain`] — Builders for transaction records and accounts.
//! - [`notifier`] — Recording and failing [`Notifier`](crate::port::Notifier)
//!   implementations.

pub mod domain;
pub mod notifier;
