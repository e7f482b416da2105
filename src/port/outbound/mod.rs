//! Outbound ports (driven side): interfaces implemented by outbound adapters.
//!
//! These contracts describe infrastructure dependencies: configuration,
//! ledger and balance storage, and audit notifications.

pub mod notifier;
pub mod store;
