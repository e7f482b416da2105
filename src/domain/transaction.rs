//! Transaction records: the immutable ledger entries paired with every
//! balance mutation.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SubsecRound, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::id::{AccountKey, GuildId, TransactionId, UserId};

/// What a transaction did to the balance.
///
/// Closed vocabulary: adding a value means updating every zero-map site,
/// which all go through [`TransactionType::ALL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Deposit,
    Withdraw,
    Bet,
    Win,
    Refund,
    Bonus,
    Vip,
}

impl TransactionType {
    pub const ALL: [TransactionType; 7] = [
        TransactionType::Deposit,
        TransactionType::Withdraw,
        TransactionType::Bet,
        TransactionType::Win,
        TransactionType::Refund,
        TransactionType::Bonus,
        TransactionType::Vip,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            TransactionType::Deposit => "deposit",
            TransactionType::Withdraw => "withdraw",
            TransactionType::Bet => "bet",
            TransactionType::Win => "win",
            TransactionType::Refund => "refund",
            TransactionType::Bonus => "bonus",
            TransactionType::Vip => "vip",
        }
    }

    /// Whether the type takes money out of the user's balance.
    #[must_use]
    pub const fn is_debit(self) -> bool {
        matches!(
            self,
            TransactionType::Withdraw | TransactionType::Bet | TransactionType::Vip
        )
    }

    /// Balance delta for a positive `amount` of this type.
    #[must_use]
    pub fn signed(self, amount: Decimal) -> Decimal {
        if self.is_debit() {
            -amount
        } else {
            amount
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DomainError::UnknownVariant {
                vocabulary: "transaction type",
                value: s.to_string(),
            })
    }
}

/// Where a transaction originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionSource {
    Command,
    Manual,
    Web,
    System,
    Casino,
}

impl TransactionSource {
    pub const ALL: [TransactionSource; 5] = [
        TransactionSource::Command,
        TransactionSource::Manual,
        TransactionSource::Web,
        TransactionSource::System,
        TransactionSource::Casino,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            TransactionSource::Command => "command",
            TransactionSource::Manual => "manual",
            TransactionSource::Web => "web",
            TransactionSource::System => "system",
            TransactionSource::Casino => "casino",
        }
    }
}

impl fmt::Display for TransactionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionSource {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DomainError::UnknownVariant {
                vocabulary: "transaction source",
                value: s.to_string(),
            })
    }
}

/// Free-form annotations, e.g. VIP `action` and `durationDays`.
pub type TransactionMeta = BTreeMap<String, serde_json::Value>;

/// One balance-affecting event. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub id: TransactionId,
    pub user_id: UserId,
    pub guild_id: GuildId,
    /// Positive magnitude; direction comes from `kind`.
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub source: TransactionSource,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bet_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handled_by: Option<UserId>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub meta: TransactionMeta,
}

impl TransactionRecord {
    /// Start building a record for `key`, stamped now.
    #[must_use]
    pub fn builder(
        key: &AccountKey,
        kind: TransactionType,
        source: TransactionSource,
        amount: Decimal,
    ) -> TransactionBuilder {
        TransactionBuilder {
            record: TransactionRecord {
                id: TransactionId::generate(),
                user_id: key.user_id.clone(),
                guild_id: key.guild_id.clone(),
                amount,
                kind,
                source,
                created_at: Utc::now().trunc_subsecs(3),
                bet_id: None,
                handled_by: None,
                meta: TransactionMeta::new(),
            },
        }
    }

    #[must_use]
    pub fn account_key(&self) -> AccountKey {
        AccountKey {
            user_id: self.user_id.clone(),
            guild_id: self.guild_id.clone(),
        }
    }

    /// Effect of this record on the balance.
    #[must_use]
    pub fn balance_delta(&self) -> Decimal {
        self.kind.signed(self.amount)
    }

    /// System withdrawal that offsets `balance` when a reset keeps history.
    /// `None` when the balance is not positive.
    #[must_use]
    pub fn reset_adjustment(
        key: &AccountKey,
        balance: Decimal,
        operator: &UserId,
    ) -> Option<TransactionRecord> {
        Self::builder(key, TransactionType::Withdraw, TransactionSource::System, balance)
            .handled_by(operator.clone())
            .meta("reason", "reset")
            .build()
            .ok()
    }
}

/// Builder for [`TransactionRecord`]; validates the amount on `build`.
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    record: TransactionRecord,
}

impl TransactionBuilder {
    #[must_use]
    pub fn handled_by(mut self, operator: impl Into<UserId>) -> Self {
        self.record.handled_by = Some(operator.into());
        self
    }

    #[must_use]
    pub fn bet_id(mut self, bet_id: impl Into<String>) -> Self {
        self.record.bet_id = Some(bet_id.into());
        self
    }

    #[must_use]
    pub fn meta(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.record.meta.insert(key.into(), value.into());
        self
    }

    /// Override the timestamp (seeding historical ledgers, tests).
    /// Truncated to millisecond precision like fresh records.
    #[must_use]
    pub fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.record.created_at = at.trunc_subsecs(3);
        self
    }

    /// Finish the record.
    ///
    /// # Errors
    /// Returns [`DomainError::NonPositiveAmount`] for zero or negative amounts.
    pub fn build(self) -> Result<TransactionRecord, DomainError> {
        if self.record.amount <= Decimal::ZERO {
            return Err(DomainError::NonPositiveAmount(self.record.amount));
        }
        Ok(self.record)
    }
}
