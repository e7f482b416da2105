//! Domain validation errors for core domain types.
//!
//! These errors are returned when a game configuration or ledger value
//! violates a domain invariant. The RTP calculator never surfaces them; it
//! folds malformed input to a zero result instead.
//!
//! # Examples
//!
//! ```
//! use croupier::domain::DomainError;
//! use croupier::domain::game::{BetLimits, GameConfig};
//!
//! let config = GameConfig::Dice {
//!     limits: BetLimits::unbounded(),
//!     win_multiplier: -1.0,
//! };
//!
//! assert!(matches!(
//!     config.validate(),
//!     Err(DomainError::NegativeParameter { .. })
//! ));
//! ```

use thiserror::Error;

/// Errors that occur when domain invariants are violated.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Multipliers, weights and odds must be non-negative finite numbers.
    #[error("{field} must be a non-negative number, got {value}")]
    NegativeParameter {
        /// The offending field.
        field: String,
        /// The rejected value.
        value: f64,
    },

    /// Bet limits must be non-negative and ordered.
    #[error("invalid bet limits: min {min} max {max}")]
    InvalidBetLimits {
        min: rust_decimal::Decimal,
        max: rust_decimal::Decimal,
    },

    /// Weighted games need at least one positive weight.
    #[error("symbol weights must contain at least one positive weight")]
    EmptyWeights,

    /// Odds of one-in-N require N > 0.
    #[error("one-in chance must be greater than zero, got {0}")]
    NonPositiveOdds(f64),

    /// House cut must be a fraction between 0 and 1.
    #[error("house cut must be between 0 and 1, got {0}")]
    CutOutOfRange(f64),

    /// Transaction amounts are positive magnitudes.
    #[error("amount must be positive, got {0}")]
    NonPositiveAmount(rust_decimal::Decimal),

    /// Unknown value for a closed vocabulary.
    #[error("unknown {vocabulary} value '{value}'")]
    UnknownVariant {
        vocabulary: &'static str,
        value: String,
    },
}
