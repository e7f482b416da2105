//! Balance accounts and the outcome types of balance mutations.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::AccountKey;
use super::transaction::TransactionRecord;

/// One user's balance in one guild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceAccount {
    pub key: AccountKey,
    pub balance: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BalanceAccount {
    /// A freshly registered account with a zero balance.
    #[must_use]
    pub fn open(key: AccountKey, at: DateTime<Utc>) -> Self {
        Self {
            key,
            balance: Decimal::ZERO,
            created_at: at,
            updated_at: at,
        }
    }
}

/// What happens to a user's history when their balance is reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResetPolicy {
    /// Delete every transaction of the user in the guild.
    #[default]
    Purge,
    /// Keep history and append an adjusting withdrawal.
    Adjust,
}

/// Result of the store's atomic delta-and-append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyResult {
    Applied { new_balance: Decimal },
    InsufficientFunds { balance: Decimal },
    NotFound,
}

/// Why a mutation was refused. Nothing was written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "camelCase")]
pub enum Rejection {
    NotRegistered,
    AlreadyRegistered,
    /// Unregister of an account that does not exist.
    AlreadyUnregistered,
    InsufficientFunds { balance: Decimal, requested: Decimal },
    InvalidAmount,
}

impl Rejection {
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Rejection::NotRegistered => "User not registered.",
            Rejection::AlreadyRegistered => "User already registered.",
            Rejection::AlreadyUnregistered => "User is not registered.",
            Rejection::InsufficientFunds { .. } => "User has insufficient balance.",
            Rejection::InvalidAmount => "Amount must be greater than zero.",
        }
    }
}

/// Delivery state of the audit notification for an applied mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "camelCase")]
pub enum NotificationStatus {
    Delivered,
    /// No notification channel configured for the event.
    Skipped,
    Failed(String),
}

/// Details of an applied mutation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationReceipt {
    pub new_balance: Decimal,
    pub message: String,
    pub notification: NotificationStatus,
    /// The paired ledger record. `None` for register/unregister and for a
    /// purge reset.
    pub record: Option<TransactionRecord>,
}

/// Outcome of a balance operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum MutationOutcome {
    Applied(MutationReceipt),
    Rejected(Rejection),
}

impl MutationOutcome {
    #[must_use]
    pub const fn success(&self) -> bool {
        matches!(self, MutationOutcome::Applied(_))
    }

    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            MutationOutcome::Applied(receipt) => &receipt.message,
            MutationOutcome::Rejected(rejection) => rejection.message(),
        }
    }

    #[must_use]
    pub fn new_balance(&self) -> Option<Decimal> {
        match self {
            MutationOutcome::Applied(receipt) => Some(receipt.new_balance),
            MutationOutcome::Rejected(_) => None,
        }
    }

    /// Applied, but the audit notification failed.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        matches!(
            self,
            MutationOutcome::Applied(MutationReceipt {
                notification: NotificationStatus::Failed(_),
                ..
            })
        )
    }

    #[must_use]
    pub fn record(&self) -> Option<&TransactionRecord> {
        match self {
            MutationOutcome::Applied(receipt) => receipt.record.as_ref(),
            MutationOutcome::Rejected(_) => None,
        }
    }

    #[must_use]
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            MutationOutcome::Applied(_) => None,
            MutationOutcome::Rejected(rejection) => Some(rejection),
        }
    }
}
