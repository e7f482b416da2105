//! Croupier - casino economics engine.
//!
//! Computes the theoretical return-to-player of configurable casino games,
//! keeps balances and their transaction ledger in lockstep, and answers
//! filtered, paginated ledger queries with whole-selection summaries.
//!
//! # Architecture
//!
//! The crate is laid out hexagonally:
//!
//! - [`domain`] - Storage-agnostic types and pure logic: game configs and
//!   the RTP calculator, transaction records, ledger queries and summaries,
//!   balance mutation outcomes.
//! - [`port`] - Traits the application needs from the outside world:
//!   configuration, transaction and account stores, audit notifiers.
//! - [`application`] - Use cases: [`application::CasinoService`],
//!   [`application::LedgerService`], [`application::TreasuryService`].
//! - [`adapter`] - The SQLite and in-memory stores, and the CLI.
//! - [`infrastructure`] - Configuration loading and logging setup.
//!
//! # Example
//!
//! ```
//! use croupier::domain::game::{BetLimits, GameConfig};
//! use croupier::domain::rtp::{compute_rtp, RtpResult};
//!
//! let dice = GameConfig::Dice {
//!     limits: BetLimits::unbounded(),
//!     win_multiplier: 5.5,
//! };
//! let RtpResult::Single(rtp) = compute_rtp(&dice) else {
//!     unreachable!()
//! };
//! assert!((rtp - 5.5 / 6.0).abs() < 1e-12);
//! ```

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
