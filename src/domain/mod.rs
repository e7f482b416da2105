//! Storage-agnostic casino economics.

mod account;
mod error;
mod id;
mod ledger;
mod transaction;

pub mod game;
pub mod query;
pub mod rtp;

// Identifiers
pub use id::{AccountKey, GuildId, TransactionId, UserId};

// Ledger entries and their summaries
pub use ledger::{zero_source_counts, zero_type_counts, zero_type_sums, LedgerSummary};
pub use transaction::{
    TransactionBuilder, TransactionMeta, TransactionRecord, TransactionSource, TransactionType,
};

// Accounts and mutation outcomes
pub use account::{
    ApplyResult, BalanceAccount, MutationOutcome, MutationReceipt, NotificationStatus, Rejection,
    ResetPolicy,
};

pub use error::DomainError;
