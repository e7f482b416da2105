//! In-memory store implementation.
//!
//! Implements every storage port behind one lock, so a balance change and
//! its ledger record are always observed together. Used by tests and as the
//! reference semantics the SQLite store is checked against.

use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use parking_lot::RwLock;
use rust_decimal::Decimal;

use crate::domain::game::{CasinoSettings, GameConfig, GameKind};
use crate::domain::query::{LedgerFilter, Page, SortSpec};
use crate::domain::{
    AccountKey, ApplyResult, BalanceAccount, GuildId, ResetPolicy, TransactionRecord,
    TransactionType, UserId,
};
use crate::error::Result;
use crate::port::{AccountStore, GameConfigStore, GroupField, ResetReceipt, TransactionStore};

#[derive(Debug, Default)]
struct State {
    configs: HashMap<GuildId, BTreeMap<GameKind, GameConfig>>,
    accounts: BTreeMap<AccountKey, BalanceAccount>,
    transactions: Vec<TransactionRecord>,
}

impl State {
    fn selected<'a>(&'a self, filter: &'a LedgerFilter) -> impl Iterator<Item = &'a TransactionRecord> {
        self.transactions.iter().filter(move |r| filter.matches(r))
    }

    fn purge(&mut self, key: &AccountKey) -> u64 {
        let before = self.transactions.len();
        self.transactions
            .retain(|r| !(r.user_id == key.user_id && r.guild_id == key.guild_id));
        (before - self.transactions.len()) as u64
    }
}

/// In-memory store for tests and throwaway runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    /// Create a new empty memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl GameConfigStore for MemoryStore {
    async fn load_config(&self, guild: &GuildId) -> Result<CasinoSettings> {
        let state = self.state.read();
        let mut settings = CasinoSettings::default();
        if let Some(saved) = state.configs.get(guild) {
            for config in saved.values() {
                settings.upsert(config.clone());
            }
        }
        Ok(settings)
    }

    async fn save_config(&self, guild: &GuildId, config: &GameConfig) -> Result<()> {
        self.state
            .write()
            .configs
            .entry(guild.clone())
            .or_default()
            .insert(config.kind(), config.clone());
        Ok(())
    }
}

impl TransactionStore for MemoryStore {
    async fn find_transactions(
        &self,
        filter: &LedgerFilter,
        sort: &SortSpec,
        page: Page,
    ) -> Result<(Vec<TransactionRecord>, u64)> {
        let state = self.state.read();
        let mut selected: Vec<&TransactionRecord> = state.selected(filter).collect();
        selected.sort_by(|a, b| sort.compare(a, b));
        let total = selected.len() as u64;
        let records = page.slice(&selected).iter().map(|r| (*r).clone()).collect();
        Ok((records, total))
    }

    async fn aggregate_by_field(
        &self,
        filter: &LedgerFilter,
        field: GroupField,
    ) -> Result<BTreeMap<String, u64>> {
        let state = self.state.read();
        let mut counts = BTreeMap::new();
        for record in state.selected(filter) {
            let value = match field {
                GroupField::Type => record.kind.as_str(),
                GroupField::Source => record.source.as_str(),
            };
            *counts.entry(value.to_string()).or_default() += 1;
        }
        Ok(counts)
    }

    async fn sum_by_type(&self, filter: &LedgerFilter) -> Result<BTreeMap<TransactionType, Decimal>> {
        let state = self.state.read();
        let mut sums = BTreeMap::new();
        for record in state.selected(filter) {
            *sums.entry(record.kind).or_insert(Decimal::ZERO) += record.amount;
        }
        Ok(sums)
    }

    async fn append_transaction(&self, record: &TransactionRecord) -> Result<()> {
        self.state.write().transactions.push(record.clone());
        Ok(())
    }

    async fn delete_transactions(&self, key: &AccountKey) -> Result<u64> {
        Ok(self.state.write().purge(key))
    }
}

impl AccountStore for MemoryStore {
    async fn load_balance(&self, key: &AccountKey) -> Result<Option<BalanceAccount>> {
        Ok(self.state.read().accounts.get(key).cloned())
    }

    async fn list_accounts(&self, guild: &GuildId) -> Result<Vec<BalanceAccount>> {
        Ok(self
            .state
            .read()
            .accounts
            .values()
            .filter(|a| &a.key.guild_id == guild)
            .cloned()
            .collect())
    }

    async fn create_account(&self, key: &AccountKey) -> Result<bool> {
        let mut state = self.state.write();
        if state.accounts.contains_key(key) {
            return Ok(false);
        }
        state
            .accounts
            .insert(key.clone(), BalanceAccount::open(key.clone(), Utc::now()));
        Ok(true)
    }

    async fn delete_account(&self, key: &AccountKey) -> Result<bool> {
        Ok(self.state.write().accounts.remove(key).is_some())
    }

    async fn apply_entry(&self, key: &AccountKey, record: &TransactionRecord) -> Result<ApplyResult> {
        let mut state = self.state.write();
        let Some(account) = state.accounts.get_mut(key) else {
            return Ok(ApplyResult::NotFound);
        };
        let new_balance = account.balance + record.balance_delta();
        if new_balance < Decimal::ZERO {
            return Ok(ApplyResult::InsufficientFunds {
                balance: account.balance,
            });
        }
        account.balance = new_balance;
        account.updated_at = Utc::now();
        state.transactions.push(record.clone());
        Ok(ApplyResult::Applied { new_balance })
    }

    async fn reset_account(
        &self,
        key: &AccountKey,
        policy: ResetPolicy,
        operator: &UserId,
    ) -> Result<Option<ResetReceipt>> {
        let mut state = self.state.write();
        let Some(account) = state.accounts.get_mut(key) else {
            return Ok(None);
        };
        let previous_balance = account.balance;
        account.balance = Decimal::ZERO;
        account.updated_at = Utc::now();

        let (purged, adjustment) = match policy {
            ResetPolicy::Purge => (state.purge(key), None),
            ResetPolicy::Adjust => {
                let adjustment =
                    TransactionRecord::reset_adjustment(key, previous_balance, operator);
                if let Some(record) = &adjustment {
                    state.transactions.push(record.clone());
                }
                (0, adjustment)
            }
        };
        Ok(Some(ResetReceipt {
            previous_balance,
            purged,
            adjustment,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TransactionSource;
    use rust_decimal_macros::dec;

    fn entry(key: &AccountKey, kind: TransactionType, amount: Decimal) -> TransactionRecord {
        TransactionRecord::builder(key, kind, TransactionSource::Web, amount)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn apply_entry_refuses_overdraft_without_writing() {
        let store = MemoryStore::new();
        let key = AccountKey::new("u1", "g1");
        assert!(store.create_account(&key).await.unwrap());
        assert!(!store.create_account(&key).await.unwrap());

        let deposit = entry(&key, TransactionType::Deposit, dec!(10));
        assert_eq!(
            store.apply_entry(&key, &deposit).await.unwrap(),
            ApplyResult::Applied { new_balance: dec!(10) }
        );

        let withdraw = entry(&key, TransactionType::Withdraw, dec!(11));
        assert_eq!(
            store.apply_entry(&key, &withdraw).await.unwrap(),
            ApplyResult::InsufficientFunds { balance: dec!(10) }
        );

        let (records, total) = store
            .find_transactions(&LedgerFilter::guild("g1"), &SortSpec::default(), Page::all())
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(records[0].kind, TransactionType::Deposit);
    }

    #[tokio::test]
    async fn apply_entry_on_missing_account() {
        let store = MemoryStore::new();
        let key = AccountKey::new("ghost", "g1");
        let deposit = entry(&key, TransactionType::Deposit, dec!(1));
        assert_eq!(store.apply_entry(&key, &deposit).await.unwrap(), ApplyResult::NotFound);
    }

    #[tokio::test]
    async fn purge_reset_only_touches_one_account() {
        let store = MemoryStore::new();
        let a = AccountKey::new("a", "g1");
        let b = AccountKey::new("b", "g1");
        for key in [&a, &b] {
            store.create_account(key).await.unwrap();
            store
                .apply_entry(key, &entry(key, TransactionType::Deposit, dec!(5)))
                .await
                .unwrap();
        }

        let receipt = store
            .reset_account(&a, ResetPolicy::Purge, &UserId::new("m1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(receipt.previous_balance, dec!(5));
        assert_eq!(receipt.purged, 1);

        let (_, total) = store
            .find_transactions(&LedgerFilter::guild("g1"), &SortSpec::default(), Page::all())
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(store.load_balance(&b).await.unwrap().unwrap().balance, dec!(5));
    }

    #[tokio::test]
    async fn delete_transactions_is_scoped_to_one_account() {
        let store = MemoryStore::new();
        let target = AccountKey::new("u1", "g1");
        let neighbours = [AccountKey::new("u2", "g1"), AccountKey::new("u1", "g2")];
        for key in std::iter::once(&target).chain(&neighbours) {
            store
                .append_transaction(&entry(key, TransactionType::Bonus, dec!(3)))
                .await
                .unwrap();
        }
        store
            .append_transaction(&entry(&target, TransactionType::Deposit, dec!(9)))
            .await
            .unwrap();

        assert_eq!(store.delete_transactions(&target).await.unwrap(), 2);

        let (g1, _) = store
            .find_transactions(&LedgerFilter::guild("g1"), &SortSpec::default(), Page::all())
            .await
            .unwrap();
        assert_eq!(g1.len(), 1);
        assert_eq!(g1[0].user_id.as_str(), "u2");
        let (g2, _) = store
            .find_transactions(&LedgerFilter::guild("g2"), &SortSpec::default(), Page::all())
            .await
            .unwrap();
        assert_eq!(g2.len(), 1);
        assert_eq!(g2[0].account_key(), AccountKey::new("u1", "g2"));
    }

    #[tokio::test]
    async fn saved_configs_override_defaults() {
        let store = MemoryStore::new();
        let guild = GuildId::new("g1");
        let config = GameConfig::Dice {
            limits: crate::domain::game::BetLimits::unbounded(),
            win_multiplier: 4.0,
        };
        store.save_config(&guild, &config).await.unwrap();
        let settings = store.load_config(&guild).await.unwrap();
        assert_eq!(settings.get(GameKind::Dice), &config);
        assert_eq!(
            settings.get(GameKind::CoinFlip),
            &GameConfig::default_for(GameKind::CoinFlip)
        );
    }
}
