//! Persistence ports for game configuration, the ledger and balances.

use std::collections::BTreeMap;
use std::future::Future;

use rust_decimal::Decimal;

use crate::domain::game::{CasinoSettings, GameConfig};
use crate::domain::query::{LedgerFilter, Page, SortSpec};
use crate::domain::{
    AccountKey, ApplyResult, BalanceAccount, GuildId, ResetPolicy, TransactionRecord,
    TransactionType, UserId,
};
use crate::error::Result;

/// Per-guild game configuration.
pub trait GameConfigStore: Send + Sync {
    /// Load a guild's settings. Games never saved come back with defaults.
    fn load_config(&self, guild: &GuildId) -> impl Future<Output = Result<CasinoSettings>> + Send;

    /// Save one game's configuration, replacing the previous one.
    fn save_config(
        &self,
        guild: &GuildId,
        config: &GameConfig,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Field a grouped count is keyed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupField {
    Type,
    Source,
}

impl GroupField {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            GroupField::Type => "type",
            GroupField::Source => "source",
        }
    }
}

/// Query and append operations on the transaction ledger.
pub trait TransactionStore: Send + Sync {
    /// One page of matching records in `sort` order, plus the number of
    /// matching records ignoring the page.
    fn find_transactions(
        &self,
        filter: &LedgerFilter,
        sort: &SortSpec,
        page: Page,
    ) -> impl Future<Output = Result<(Vec<TransactionRecord>, u64)>> + Send;

    /// Count matching records grouped by `field`. Values with no records
    /// are absent.
    fn aggregate_by_field(
        &self,
        filter: &LedgerFilter,
        field: GroupField,
    ) -> impl Future<Output = Result<BTreeMap<String, u64>>> + Send;

    /// Total amount of matching records per type. Types with no records
    /// are absent.
    fn sum_by_type(
        &self,
        filter: &LedgerFilter,
    ) -> impl Future<Output = Result<BTreeMap<TransactionType, Decimal>>> + Send;

    /// Append a record without touching any balance.
    fn append_transaction(
        &self,
        record: &TransactionRecord,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Delete every record of an account. Returns count deleted.
    fn delete_transactions(&self, key: &AccountKey) -> impl Future<Output = Result<u64>> + Send;
}

/// What a reset did.
#[derive(Debug, Clone, PartialEq)]
pub struct ResetReceipt {
    pub previous_balance: Decimal,
    /// Records deleted by a purge.
    pub purged: u64,
    /// Offsetting withdrawal appended by an adjusting reset.
    pub adjustment: Option<TransactionRecord>,
}

/// Balance accounts. Every balance change goes through [`apply_entry`] or
/// [`reset_account`], which pair the change with the ledger atomically.
///
/// [`apply_entry`]: AccountStore::apply_entry
/// [`reset_account`]: AccountStore::reset_account
pub trait AccountStore: Send + Sync {
    fn load_balance(
        &self,
        key: &AccountKey,
    ) -> impl Future<Output = Result<Option<BalanceAccount>>> + Send;

    /// Accounts of a guild ordered by user id.
    fn list_accounts(
        &self,
        guild: &GuildId,
    ) -> impl Future<Output = Result<Vec<BalanceAccount>>> + Send;

    /// Open a zero-balance account. Returns `false` if it already exists.
    fn create_account(&self, key: &AccountKey) -> impl Future<Output = Result<bool>> + Send;

    /// Remove the account row; ledger history is kept. Returns `false` if
    /// there was no account.
    fn delete_account(&self, key: &AccountKey) -> impl Future<Output = Result<bool>> + Send;

    /// Apply the record's signed amount to the balance and append the
    /// record, in one atomic unit. Debits that would make the balance
    /// negative are refused and nothing is written.
    fn apply_entry(
        &self,
        key: &AccountKey,
        record: &TransactionRecord,
    ) -> impl Future<Output = Result<ApplyResult>> + Send;

    /// Zero the balance atomically with the history change `policy` asks
    /// for: purge deletes the account's records, adjust appends a
    /// [`TransactionRecord::reset_adjustment`] for the balance read inside
    /// the same unit, handled by `operator`. Returns `None` if there is no
    /// account.
    fn reset_account(
        &self,
        key: &AccountKey,
        policy: ResetPolicy,
        operator: &UserId,
    ) -> impl Future<Output = Result<Option<ResetReceipt>>> + Send;
}
