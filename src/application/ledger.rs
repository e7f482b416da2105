//! Ledger query and aggregation service.
//!
//! A ledger query returns one page of records together with a summary of
//! the whole filtered selection. Summaries come from a [`LedgerAggregator`];
//! the two backends here produce identical results and differ only in where
//! the work happens.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use crate::domain::query::{LedgerCriteria, LedgerFilter, Page, QueryDefaults, SortSpec};
use crate::domain::{
    GuildId, LedgerSummary, TransactionRecord, TransactionSource, TransactionType, UserId,
};
use crate::error::Result;
use crate::port::{GroupField, TransactionStore};

/// Summarizes a filtered selection of the ledger.
pub trait LedgerAggregator: Send + Sync {
    /// Summary of every record `filter` selects, independent of paging.
    fn summarize(&self, filter: &LedgerFilter)
        -> impl Future<Output = Result<LedgerSummary>> + Send;
}

/// Loads the selection and folds it in process.
pub struct FoldAggregator<S> {
    store: Arc<S>,
}

impl<S> FoldAggregator<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}

impl<S: TransactionStore> LedgerAggregator for FoldAggregator<S> {
    async fn summarize(&self, filter: &LedgerFilter) -> Result<LedgerSummary> {
        let (records, _) = self
            .store
            .find_transactions(filter, &SortSpec::default(), Page::all())
            .await?;
        Ok(LedgerSummary::fold(&records))
    }
}

/// Uses the store's grouped counts and per-type totals.
pub struct GroupedAggregator<S> {
    store: Arc<S>,
}

impl<S> GroupedAggregator<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}

impl<S: TransactionStore> LedgerAggregator for GroupedAggregator<S> {
    async fn summarize(&self, filter: &LedgerFilter) -> Result<LedgerSummary> {
        let by_type = self.store.aggregate_by_field(filter, GroupField::Type).await?;
        let by_source = self
            .store
            .aggregate_by_field(filter, GroupField::Source)
            .await?;
        let sums = self.store.sum_by_type(filter).await?;

        let mut type_counts = BTreeMap::new();
        for (value, count) in by_type {
            type_counts.insert(value.parse::<TransactionType>()?, count);
        }
        let mut source_counts = BTreeMap::new();
        for (value, count) in by_source {
            source_counts.insert(value.parse::<TransactionSource>()?, count);
        }
        let total = type_counts.values().sum();

        Ok(LedgerSummary::from_parts(
            type_counts,
            source_counts,
            &sums,
            total,
        ))
    }
}

/// One page of a ledger query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerPage {
    pub records: Vec<TransactionRecord>,
    pub summary: LedgerSummary,
    /// Matching records across all pages.
    pub total_count: u64,
    pub page: u64,
    pub page_size: u64,
}

impl LedgerPage {
    #[must_use]
    pub fn page_count(&self) -> u64 {
        if self.page_size == 0 {
            0
        } else {
            self.total_count.div_ceil(self.page_size)
        }
    }
}

/// Ledger browsing use cases.
pub struct LedgerService<S, A> {
    store: Arc<S>,
    aggregator: A,
    defaults: QueryDefaults,
}

impl<S: TransactionStore, A: LedgerAggregator> LedgerService<S, A> {
    pub fn new(store: Arc<S>, aggregator: A, defaults: QueryDefaults) -> Self {
        Self {
            store,
            aggregator,
            defaults,
        }
    }

    /// Resolve `criteria` and return the requested page with a summary of
    /// the full selection.
    ///
    /// # Errors
    /// Returns a storage error if either the page or the summary fails.
    pub async fn query_ledger(&self, criteria: &LedgerCriteria) -> Result<LedgerPage> {
        let query = criteria.resolve(&self.defaults);
        debug!(
            guild = %query.filter.guild_id,
            sort = %query.sort,
            skip = query.page.skip,
            "Querying ledger"
        );

        let ((records, total_count), summary) = tokio::try_join!(
            self.store
                .find_transactions(&query.filter, &query.sort, query.page),
            self.aggregator.summarize(&query.filter),
        )?;

        let page_size = query.page.limit.unwrap_or(total_count);
        let page = if page_size == 0 {
            1
        } else {
            query.page.skip / page_size + 1
        };
        Ok(LedgerPage {
            records,
            summary,
            total_count,
            page,
            page_size,
        })
    }

    /// Summary of an explicit filter.
    ///
    /// # Errors
    /// Returns a storage error.
    pub async fn summarize(&self, filter: &LedgerFilter) -> Result<LedgerSummary> {
        self.aggregator.summarize(filter).await
    }

    /// Net gaming result per user of a guild: Σwin − Σbet. Users with no
    /// bets or wins are absent.
    ///
    /// # Errors
    /// Returns a storage error.
    pub async fn net_profit_by_user(&self, guild: &GuildId) -> Result<BTreeMap<UserId, Decimal>> {
        let filter =
            LedgerFilter::guild(guild.clone()).with_types(&[TransactionType::Bet, TransactionType::Win]);
        let (records, _) = self
            .store
            .find_transactions(&filter, &SortSpec::default(), Page::all())
            .await?;

        let mut profits: BTreeMap<UserId, Decimal> = BTreeMap::new();
        for record in records {
            let entry = profits.entry(record.user_id).or_insert(Decimal::ZERO);
            match record.kind {
                TransactionType::Win => *entry += record.amount,
                TransactionType::Bet => *entry -= record.amount,
                _ => {}
            }
        }
        Ok(profits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::outbound::memory::MemoryStore;
    use crate::domain::AccountKey;
    use rust_decimal_macros::dec;

    async fn seeded() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        let rows = [
            ("alice", TransactionType::Deposit, TransactionSource::Web, dec!(100)),
            ("alice", TransactionType::Bet, TransactionSource::Casino, dec!(30)),
            ("alice", TransactionType::Win, TransactionSource::Casino, dec!(45)),
            ("bob", TransactionType::Bet, TransactionSource::Casino, dec!(20)),
            ("bob", TransactionType::Withdraw, TransactionSource::Manual, dec!(5)),
        ];
        for (user, kind, source, amount) in rows {
            let record = TransactionRecord::builder(&AccountKey::new(user, "g1"), kind, source, amount)
                .build()
                .unwrap();
            store.append_transaction(&record).await.unwrap();
        }
        store
    }

    #[tokio::test]
    async fn backends_agree() {
        let store = seeded().await;
        let filter = LedgerFilter::guild("g1");
        let folded = FoldAggregator::new(store.clone()).summarize(&filter).await.unwrap();
        let grouped = GroupedAggregator::new(store).summarize(&filter).await.unwrap();
        assert_eq!(folded, grouped);
        assert_eq!(folded.total, 5);
        assert_eq!(folded.cash_flow, dec!(95));
        assert_eq!(folded.game_pnl, dec!(5));
    }

    #[tokio::test]
    async fn summary_ignores_paging() {
        let store = seeded().await;
        let service = LedgerService::new(
            store.clone(),
            GroupedAggregator::new(store),
            QueryDefaults::default(),
        );
        let mut criteria = LedgerCriteria::new("g1");
        criteria.page_size = Some(2);
        criteria.page = Some(2);
        let page = service.query_ledger(&criteria).await.unwrap();
        assert_eq!(page.records.len(), 2);
        assert_eq!(page.total_count, 5);
        assert_eq!(page.page, 2);
        assert_eq!(page.page_count(), 3);
        assert_eq!(page.summary.total, 5);
    }

    #[tokio::test]
    async fn net_profit_is_wins_minus_bets() {
        let store = seeded().await;
        let service = LedgerService::new(
            store.clone(),
            FoldAggregator::new(store),
            QueryDefaults::default(),
        );
        let profits = service.net_profit_by_user(&GuildId::new("g1")).await.unwrap();
        assert_eq!(profits[&UserId::new("alice")], dec!(15));
        assert_eq!(profits[&UserId::new("bob")], dec!(-20));
    }
}
