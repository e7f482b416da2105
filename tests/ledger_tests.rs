//! Ledger querying and aggregation across both store backends.

mod support;

use std::sync::Arc;

use chrono::Duration;
use croupier::adapter::outbound::memory::MemoryStore;
use croupier::application::{FoldAggregator, GroupedAggregator, LedgerAggregator, LedgerService};
use croupier::domain::query::{LedgerCriteria, LedgerFilter, Page, QueryDefaults, SortSpec};
use croupier::domain::{
    TransactionRecord, TransactionSource, TransactionType, UserId,
};
use croupier::port::TransactionStore;
use croupier::testkit::domain::{account, record, record_at, utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use support::temp_db::TempDb;

const USERS: [&str; 4] = ["alice", "bob", "carol", "dave"];
const OPERATORS: [&str; 3] = ["mgr_one", "mgr_two", "100%_admin"];
const SORTS: [&str; 6] = [
    "createdAt:desc",
    "amount:asc",
    "amount:desc,createdAt:asc",
    "type:asc,userId:desc",
    "handledBy:asc,betId:desc",
    "source:desc,amount:asc",
];

async fn seed<S: TransactionStore>(store: &S, records: &[TransactionRecord]) {
    for record in records {
        store.append_transaction(record).await.unwrap();
    }
}

fn fixture() -> Vec<TransactionRecord> {
    let start = utc(2025, 3, 1, 8, 0);
    support::fixture_rows()
        .into_iter()
        .enumerate()
        .map(|(i, (user, kind, source, amount))| {
            let minutes = i64::try_from(i).unwrap() * 90;
            record_at(user, "g1", kind, source, amount, start + Duration::minutes(minutes))
        })
        .collect()
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

#[tokio::test]
async fn summary_matches_hand_computed_totals() {
    let store = Arc::new(MemoryStore::new());
    seed(store.as_ref(), &fixture()).await;

    let summary = GroupedAggregator::new(store)
        .summarize(&LedgerFilter::guild("g1"))
        .await
        .unwrap();

    assert_eq!(summary.total, 10);
    assert_eq!(summary.count(TransactionType::Bet), 3);
    // deposits 575 - withdraw 5
    assert_eq!(summary.cash_flow, dec!(570));
    // bets 154.50 + vip 60 - wins 240 - bonus 10 - refunds 25.50
    assert_eq!(summary.game_pnl, dec!(-61));
    assert_eq!(summary.cash_flow_formula(), "deposit - withdraw");
    assert_eq!(summary.pnl_formula(), "(bet + vip) - (win + bonus + refund)");
}

#[tokio::test]
async fn sqlite_and_memory_return_the_same_page() {
    let db = TempDb::create();
    let sqlite = db.store();
    let memory = Arc::new(MemoryStore::new());
    let records = fixture();
    seed(sqlite.as_ref(), &records).await;
    seed(memory.as_ref(), &records).await;

    let mut criteria = LedgerCriteria::new("g1");
    criteria.types = vec![TransactionType::Bet, TransactionType::Deposit];
    criteria.sort = Some("amount:desc".to_string());
    criteria.page_size = Some(2);
    criteria.page = Some(2);

    let from_sqlite = LedgerService::new(sqlite.clone(), GroupedAggregator::new(sqlite), QueryDefaults::default())
        .query_ledger(&criteria)
        .await
        .unwrap();
    let from_memory = LedgerService::new(memory.clone(), FoldAggregator::new(memory), QueryDefaults::default())
        .query_ledger(&criteria)
        .await
        .unwrap();

    assert_eq!(from_sqlite, from_memory);
    assert_eq!(from_sqlite.total_count, 5);
    let amounts: Vec<Decimal> = from_sqlite.records.iter().map(|r| r.amount).collect();
    assert_eq!(amounts, vec![dec!(75), dec!(25.50)]);
}

#[tokio::test]
async fn date_filter_uses_configured_offset() {
    let store = Arc::new(MemoryStore::new());
    // 23:30 UTC on the 1st is already the 2nd at UTC+2.
    let late = record_at(
        "alice",
        "g1",
        TransactionType::Deposit,
        TransactionSource::Web,
        dec!(10),
        utc(2025, 3, 1, 23, 30),
    );
    seed(store.as_ref(), &[late]).await;

    let mut criteria = LedgerCriteria::new("g1");
    criteria.date_from = Some("2025-03-02".to_string());
    criteria.date_to = Some("2025-03-02".to_string());

    let utc_service = LedgerService::new(store.clone(), FoldAggregator::new(store.clone()), QueryDefaults::default());
    assert_eq!(utc_service.query_ledger(&criteria).await.unwrap().total_count, 0);

    let plus_two = QueryDefaults {
        utc_offset: chrono::FixedOffset::east_opt(2 * 3600).unwrap(),
        ..QueryDefaults::default()
    };
    let local_service = LedgerService::new(store.clone(), FoldAggregator::new(store), plus_two);
    assert_eq!(local_service.query_ledger(&criteria).await.unwrap().total_count, 1);
}

#[tokio::test]
async fn unparsable_date_is_ignored() {
    let store = Arc::new(MemoryStore::new());
    seed(store.as_ref(), &fixture()).await;
    let mut criteria = LedgerCriteria::new("g1");
    criteria.date_from = Some("yesterday".to_string());

    let service = LedgerService::new(store.clone(), FoldAggregator::new(store), QueryDefaults::default());
    assert_eq!(service.query_ledger(&criteria).await.unwrap().total_count, 10);
}

#[tokio::test]
async fn admin_search_matches_operator_or_bet_id() {
    let db = TempDb::create();
    let store = db.store();
    let key = account("alice", "g1");
    let handled = TransactionRecord::builder(&key, TransactionType::Deposit, TransactionSource::Web, dec!(5))
        .handled_by("100%_admin")
        .build()
        .unwrap();
    let bet = TransactionRecord::builder(&key, TransactionType::Bet, TransactionSource::Casino, dec!(5))
        .bet_id("round-100")
        .build()
        .unwrap();
    let plain = record("alice", "g1", TransactionType::Bonus, TransactionSource::Web, dec!(1));
    seed(store.as_ref(), &[handled, bet, plain]).await;

    let mut filter = LedgerFilter::guild("g1");
    filter.admin_search = Some("100".to_string());
    let (rows, total) = store
        .find_transactions(&filter, &SortSpec::default(), Page::all())
        .await
        .unwrap();
    assert_eq!(total, 2);
    assert!(rows.iter().all(|r| r.kind != TransactionType::Bonus));

    filter.admin_search = Some("0%_".to_string());
    let (rows, _) = store
        .find_transactions(&filter, &SortSpec::default(), Page::all())
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].handled_by, Some(UserId::new("100%_admin")));
}

#[tokio::test]
async fn other_guilds_are_invisible() {
    let store = Arc::new(MemoryStore::new());
    seed(store.as_ref(), &fixture()).await;
    seed(
        store.as_ref(),
        &[record("alice", "g2", TransactionType::Deposit, TransactionSource::Web, dec!(1))],
    )
    .await;

    let summary = FoldAggregator::new(store)
        .summarize(&LedgerFilter::guild("g2"))
        .await
        .unwrap();
    assert_eq!(summary.total, 1);
    assert_eq!(summary.cash_flow, dec!(1));
}

fn arb_record() -> impl Strategy<Value = TransactionRecord> {
    (
        0..USERS.len(),
        0..TransactionType::ALL.len(),
        0..TransactionSource::ALL.len(),
        1i64..100_000,
        0i64..(6 * 24 * 60),
        proptest::option::of(0..OPERATORS.len()),
        proptest::option::of(0u32..5),
    )
        .prop_map(|(user, kind, source, cents, minutes, operator, bet)| {
            let mut builder = TransactionRecord::builder(
                &account(USERS[user], "g1"),
                TransactionType::ALL[kind],
                TransactionSource::ALL[source],
                Decimal::new(cents, 2),
            )
            .created_at(utc(2025, 3, 1, 0, 0) + Duration::minutes(minutes));
            if let Some(operator) = operator {
                builder = builder.handled_by(OPERATORS[operator]);
            }
            if let Some(bet) = bet {
                builder = builder.bet_id(format!("bet-{bet}"));
            }
            builder.build().unwrap()
        })
}

fn arb_criteria() -> impl Strategy<Value = LedgerCriteria> {
    (
        proptest::sample::subsequence(TransactionType::ALL.to_vec(), 0..=3),
        proptest::sample::subsequence(TransactionSource::ALL.to_vec(), 0..=2),
        proptest::option::of(proptest::sample::select(vec!["a", "AR", "o", "zz"])),
        proptest::option::of(proptest::sample::select(vec!["mgr", "%", "_", "bet-1"])),
        proptest::option::of(proptest::sample::select(vec!["2025-03-02", "2025-03-04"])),
        0..SORTS.len(),
        1u32..4,
        1u32..8,
    )
        .prop_map(|(types, sources, user, admin, from, sort, page, size)| {
            let mut criteria = LedgerCriteria::new("g1");
            criteria.types = types;
            criteria.sources = sources;
            criteria.user_search = user.map(str::to_string);
            criteria.admin_search = admin.map(str::to_string);
            criteria.date_from = from.map(str::to_string);
            criteria.sort = Some(SORTS[sort].to_string());
            criteria.page = Some(page);
            criteria.page_size = Some(size);
            criteria
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn backends_agree_on_pages_and_summaries(
        records in proptest::collection::vec(arb_record(), 0..30),
        criteria in arb_criteria(),
    ) {
        runtime().block_on(async {
            let db = TempDb::create();
            let sqlite = db.store();
            let memory = Arc::new(MemoryStore::new());
            seed(sqlite.as_ref(), &records).await;
            seed(memory.as_ref(), &records).await;

            let grouped = LedgerService::new(sqlite.clone(), GroupedAggregator::new(sqlite.clone()), QueryDefaults::default())
                .query_ledger(&criteria)
                .await
                .unwrap();
            let folded = LedgerService::new(sqlite.clone(), FoldAggregator::new(sqlite), QueryDefaults::default())
                .query_ledger(&criteria)
                .await
                .unwrap();
            let in_memory = LedgerService::new(memory.clone(), GroupedAggregator::new(memory), QueryDefaults::default())
                .query_ledger(&criteria)
                .await
                .unwrap();

            assert_eq!(&grouped, &folded);
            assert_eq!(&grouped, &in_memory);
            assert_eq!(grouped.summary.total, grouped.total_count);
        });
    }

    #[test]
    fn pages_partition_the_selection(
        records in proptest::collection::vec(arb_record(), 0..40),
        size in 1u32..7,
        sort in 0..SORTS.len(),
    ) {
        runtime().block_on(async {
            let store = Arc::new(MemoryStore::new());
            seed(store.as_ref(), &records).await;
            let service = LedgerService::new(store.clone(), FoldAggregator::new(store), QueryDefaults::default());

            let mut all = LedgerCriteria::new("g1");
            all.sort = Some(SORTS[sort].to_string());
            all.page_size = Some(500);
            let expected = service.query_ledger(&all).await.unwrap();

            let mut collected = Vec::new();
            let mut page = 1;
            loop {
                let mut criteria = all.clone();
                criteria.page = Some(page);
                criteria.page_size = Some(size);
                let result = service.query_ledger(&criteria).await.unwrap();
                assert_eq!(result.summary, expected.summary);
                if result.records.is_empty() {
                    break;
                }
                collected.extend(result.records);
                page += 1;
            }
            assert_eq!(collected, expected.records);
        });
    }
}
