//! Application services (use cases).
//!
//! These services orchestrate domain logic and coordinate adapters
//! to implement the application's use cases.

pub mod casino;
pub mod ledger;
pub mod lock;
pub mod treasury;

pub use casino::{CasinoService, RtpReport};
pub use ledger::{FoldAggregator, GroupedAggregator, LedgerAggregator, LedgerPage, LedgerService};
pub use lock::{AccountGuard, AccountLocks};
pub use treasury::{format_money, TreasuryService};
