//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! Ports define the extension points in the hexagonal architecture.
//! Adapters implement them to integrate with storage and notification
//! channels.
//!
//! # Architecture
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │      Application        │
//!                    │                         │
//!     ┌──────────────┤  Domain + Port          ├──────────────┐
//!     │              │                         │              │
//!     │              └─────────────────────────┘              │
//!     │                         │                             │
//!     ▼                         ▼                             ▼
//! ┌─────────┐            ┌─────────────┐              ┌───────────┐
//! │ Config  │            │ Ledger /    │              │ Notifier  │
//! │ Store   │            │ Accounts    │              │  Adapter  │
//! └─────────┘            └─────────────┘              └───────────┘
//! ```
//!
//! # Available Ports
//!
//! - [`GameConfigStore`] - Per-guild game configuration
//! - [`TransactionStore`] - Ledger queries and grouped aggregates
//! - [`AccountStore`] - Balances paired atomically with ledger entries
//! - [`Notifier`] - Audit-log notifications

pub mod outbound;

pub use outbound::notifier::{
    AuditAction, AuditEvent, Delivery, LogNotifier, Notifier, NotifierRegistry, NullNotifier,
};
pub use outbound::store::{
    AccountStore, GameConfigStore, GroupField, ResetReceipt, TransactionStore,
};
