//! SQLite ledger store implementation.
//!
//! Provides persistent storage for game configuration, balance accounts and
//! the transaction ledger using SQLite and Diesel ORM. Balance changes run
//! in immediate transactions so the balance check, the update and the paired
//! ledger insert cannot interleave with another writer.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use diesel::dsl::count_star;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, PooledConnection};
use diesel::sql_types::Bool;
use diesel::sqlite::Sqlite;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::adapter::outbound::sqlite::database::connection::{
    configure_sqlite_connection, create_pool, run_migrations, DbPool,
};
use crate::adapter::outbound::sqlite::database::model::{
    AccountRow, GameConfigRow, TransactionRow,
};
use crate::adapter::outbound::sqlite::database::schema::{accounts, game_configs, transactions};
use crate::domain::game::{CasinoSettings, GameConfig};
use crate::domain::query::{LedgerFilter, Page, SortDirection, SortField, SortSpec};
use crate::domain::{
    AccountKey, ApplyResult, BalanceAccount, GuildId, ResetPolicy, TransactionId,
    TransactionRecord, TransactionType, UserId,
};
use crate::error::{Error, Result};
use crate::port::{AccountStore, GameConfigStore, GroupField, ResetReceipt, TransactionStore};

type Predicate = Box<dyn BoxableExpression<transactions::table, Sqlite, SqlType = Bool>>;
type Conn = PooledConnection<ConnectionManager<SqliteConnection>>;

/// SQLite-backed implementation of every storage port.
pub struct SqliteStore {
    /// Database connection pool.
    pool: DbPool,
}

impl SqliteStore {
    /// Create a store over an already migrated pool.
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Open the database at `database_url`, running pending migrations.
    ///
    /// # Errors
    /// Returns an error if the pool cannot be created or migrations fail.
    pub fn open(database_url: &str) -> Result<Self> {
        let pool = create_pool(database_url)?;
        run_migrations(&pool)?;
        debug!(database = database_url, "Opened ledger database");
        Ok(Self::new(pool))
    }

    fn conn(&self) -> Result<Conn> {
        let mut conn = self.pool.get()?;
        configure_sqlite_connection(&mut conn)?;
        Ok(conn)
    }

    fn to_row(record: &TransactionRecord) -> Result<TransactionRow> {
        Ok(TransactionRow {
            id: record.id.to_string(),
            user_id: record.user_id.as_str().to_string(),
            guild_id: record.guild_id.as_str().to_string(),
            amount: record.amount.to_string(),
            amount_key: amount_key(record.amount),
            kind: record.kind.as_str().to_string(),
            source: record.source.as_str().to_string(),
            created_at: timestamp(record.created_at),
            bet_id: record.bet_id.clone(),
            handled_by: record.handled_by.as_ref().map(|op| op.as_str().to_string()),
            meta: serde_json::to_string(&record.meta)?,
        })
    }

    fn from_row(row: TransactionRow) -> Result<TransactionRecord> {
        Ok(TransactionRecord {
            id: TransactionId::parse(&row.id).map_err(|e| Error::Parse(e.to_string()))?,
            user_id: UserId::from(row.user_id),
            guild_id: GuildId::from(row.guild_id),
            amount: parse_decimal(&row.amount)?,
            kind: row.kind.parse()?,
            source: row.source.parse()?,
            created_at: parse_timestamp(&row.created_at)?,
            bet_id: row.bet_id,
            handled_by: row.handled_by.map(UserId::from),
            meta: serde_json::from_str(&row.meta)?,
        })
    }

    fn account_from_row(row: AccountRow) -> Result<BalanceAccount> {
        Ok(BalanceAccount {
            key: AccountKey::new(row.user_id, row.guild_id),
            balance: parse_decimal(&row.balance)?,
            created_at: parse_timestamp(&row.created_at)?,
            updated_at: parse_timestamp(&row.updated_at)?,
        })
    }
}

/// Zero-padded amount whose text order is numeric order for every
/// `Decimal` magnitude: 29 integer digits, 28 fraction digits.
fn amount_key(amount: Decimal) -> String {
    let text = amount.abs().normalize().to_string();
    let (int, frac) = text.split_once('.').unwrap_or((text.as_str(), ""));
    format!("{int:0>29}.{frac:0<28}")
}

/// RFC 3339 UTC with fixed millisecond precision, so text order is time
/// order.
fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| Error::Parse(e.to_string()))
}

fn parse_decimal(s: &str) -> Result<Decimal> {
    Decimal::from_str(s).map_err(|e| Error::Parse(e.to_string()))
}

/// `LIKE` pattern matching `needle` as a literal substring.
fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Translate a filter into a SQL predicate. SQLite `LIKE` folds ASCII case,
/// matching the in-process filter.
fn predicate(filter: &LedgerFilter) -> Predicate {
    let mut pred: Predicate =
        Box::new(transactions::guild_id.eq(filter.guild_id.as_str().to_string()));

    if !filter.types.is_empty() {
        let kinds: Vec<String> = filter.types.iter().map(|t| t.as_str().to_string()).collect();
        pred = Box::new(pred.and(transactions::kind.eq_any(kinds)));
    }
    if !filter.sources.is_empty() {
        let sources: Vec<String> = filter
            .sources
            .iter()
            .map(|s| s.as_str().to_string())
            .collect();
        pred = Box::new(pred.and(transactions::source.eq_any(sources)));
    }
    if let Some(from) = filter.created_from {
        pred = Box::new(pred.and(transactions::created_at.ge(timestamp(from))));
    }
    if let Some(to) = filter.created_to {
        pred = Box::new(pred.and(transactions::created_at.le(timestamp(to))));
    }
    if let Some(needle) = &filter.user_search {
        pred = Box::new(
            pred.and(
                transactions::user_id
                    .like(contains_pattern(needle))
                    .escape('\\'),
            ),
        );
    }
    if let Some(needle) = &filter.admin_search {
        let pattern = contains_pattern(needle);
        let handled = transactions::handled_by.is_not_null().and(
            transactions::handled_by
                .assume_not_null()
                .like(pattern.clone())
                .escape('\\'),
        );
        let bet = transactions::bet_id.is_not_null().and(
            transactions::bet_id
                .assume_not_null()
                .like(pattern)
                .escape('\\'),
        );
        pred = Box::new(pred.and(handled.or(bet)));
    }
    pred
}

macro_rules! then_order {
    ($query:expr, $column:expr, $direction:expr) => {
        match $direction {
            SortDirection::Asc => $query.then_order_by($column.asc()),
            SortDirection::Desc => $query.then_order_by($column.desc()),
        }
    };
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

impl GameConfigStore for SqliteStore {
    async fn load_config(&self, guild: &GuildId) -> Result<CasinoSettings> {
        let mut conn = self.conn()?;
        let rows: Vec<GameConfigRow> = game_configs::table
            .filter(game_configs::guild_id.eq(guild.as_str()))
            .select(GameConfigRow::as_select())
            .load(&mut conn)?;

        let mut settings = CasinoSettings::default();
        for row in rows {
            match serde_json::from_str::<GameConfig>(&row.config_json) {
                Ok(config) => settings.upsert(config),
                Err(e) => {
                    warn!(guild = %guild, game = %row.game, error = %e, "Ignoring unreadable game config");
                }
            }
        }
        Ok(settings)
    }

    async fn save_config(&self, guild: &GuildId, config: &GameConfig) -> Result<()> {
        let row = GameConfigRow {
            guild_id: guild.as_str().to_string(),
            game: config.kind().as_str().to_string(),
            config_json: serde_json::to_string(config)?,
            updated_at: timestamp(Utc::now()),
        };
        let mut conn = self.conn()?;
        diesel::replace_into(game_configs::table)
            .values(&row)
            .execute(&mut conn)?;
        Ok(())
    }
}

impl TransactionStore for SqliteStore {
    async fn find_transactions(
        &self,
        filter: &LedgerFilter,
        sort: &SortSpec,
        page: Page,
    ) -> Result<(Vec<TransactionRecord>, u64)> {
        let mut conn = self.conn()?;

        let total: i64 = transactions::table
            .filter(predicate(filter))
            .count()
            .get_result(&mut conn)?;

        let mut query = transactions::table
            .filter(predicate(filter))
            .select(TransactionRow::as_select())
            .into_boxed();

        for key in sort.keys() {
            query = match key.field {
                SortField::CreatedAt => then_order!(query, transactions::created_at, key.direction),
                SortField::Amount => then_order!(query, transactions::amount_key, key.direction),
                SortField::Type => then_order!(query, transactions::kind, key.direction),
                SortField::Source => then_order!(query, transactions::source, key.direction),
                SortField::UserId => then_order!(query, transactions::user_id, key.direction),
                SortField::HandledBy => then_order!(query, transactions::handled_by, key.direction),
                SortField::BetId => then_order!(query, transactions::bet_id, key.direction),
            };
        }
        query = query.then_order_by(transactions::id.asc());

        if let Some(limit) = page.limit {
            query = query.limit(to_i64(limit)).offset(to_i64(page.skip));
        }

        let rows: Vec<TransactionRow> = query.load(&mut conn)?;
        let records = rows
            .into_iter()
            .map(Self::from_row)
            .collect::<Result<Vec<_>>>()?;

        Ok((records, u64::try_from(total).unwrap_or_default()))
    }

    async fn aggregate_by_field(
        &self,
        filter: &LedgerFilter,
        field: GroupField,
    ) -> Result<BTreeMap<String, u64>> {
        let mut conn = self.conn()?;
        let rows: Vec<(String, i64)> = match field {
            GroupField::Type => transactions::table
                .filter(predicate(filter))
                .group_by(transactions::kind)
                .select((transactions::kind, count_star()))
                .load(&mut conn)?,
            GroupField::Source => transactions::table
                .filter(predicate(filter))
                .group_by(transactions::source)
                .select((transactions::source, count_star()))
                .load(&mut conn)?,
        };
        Ok(rows
            .into_iter()
            .map(|(value, count)| (value, u64::try_from(count).unwrap_or_default()))
            .collect())
    }

    async fn sum_by_type(&self, filter: &LedgerFilter) -> Result<BTreeMap<TransactionType, Decimal>> {
        let mut conn = self.conn()?;
        // SUM() would go through REAL; amounts are exact text decimals.
        let rows: Vec<(String, String)> = transactions::table
            .filter(predicate(filter))
            .select((transactions::kind, transactions::amount))
            .load(&mut conn)?;

        let mut sums = BTreeMap::new();
        for (kind, amount) in rows {
            let kind: TransactionType = kind.parse()?;
            *sums.entry(kind).or_insert(Decimal::ZERO) += parse_decimal(&amount)?;
        }
        Ok(sums)
    }

    async fn append_transaction(&self, record: &TransactionRecord) -> Result<()> {
        let row = Self::to_row(record)?;
        let mut conn = self.conn()?;
        diesel::insert_into(transactions::table)
            .values(&row)
            .execute(&mut conn)?;
        Ok(())
    }

    async fn delete_transactions(&self, key: &AccountKey) -> Result<u64> {
        let mut conn = self.conn()?;
        let deleted = diesel::delete(
            transactions::table
                .filter(transactions::user_id.eq(key.user_id.as_str()))
                .filter(transactions::guild_id.eq(key.guild_id.as_str())),
        )
        .execute(&mut conn)?;
        Ok(deleted as u64)
    }
}

impl AccountStore for SqliteStore {
    async fn load_balance(&self, key: &AccountKey) -> Result<Option<BalanceAccount>> {
        let mut conn = self.conn()?;
        let row: Option<AccountRow> = accounts::table
            .find((key.user_id.as_str(), key.guild_id.as_str()))
            .select(AccountRow::as_select())
            .first(&mut conn)
            .optional()?;
        row.map(Self::account_from_row).transpose()
    }

    async fn list_accounts(&self, guild: &GuildId) -> Result<Vec<BalanceAccount>> {
        let mut conn = self.conn()?;
        let rows: Vec<AccountRow> = accounts::table
            .filter(accounts::guild_id.eq(guild.as_str()))
            .order(accounts::user_id.asc())
            .select(AccountRow::as_select())
            .load(&mut conn)?;
        rows.into_iter().map(Self::account_from_row).collect()
    }

    async fn create_account(&self, key: &AccountKey) -> Result<bool> {
        let now = timestamp(Utc::now());
        let row = AccountRow {
            user_id: key.user_id.as_str().to_string(),
            guild_id: key.guild_id.as_str().to_string(),
            balance: Decimal::ZERO.to_string(),
            created_at: now.clone(),
            updated_at: now,
        };
        let mut conn = self.conn()?;
        let inserted = diesel::insert_or_ignore_into(accounts::table)
            .values(&row)
            .execute(&mut conn)?;
        Ok(inserted > 0)
    }

    async fn delete_account(&self, key: &AccountKey) -> Result<bool> {
        let mut conn = self.conn()?;
        let deleted =
            diesel::delete(accounts::table.find((key.user_id.as_str(), key.guild_id.as_str())))
                .execute(&mut conn)?;
        Ok(deleted > 0)
    }

    async fn apply_entry(&self, key: &AccountKey, record: &TransactionRecord) -> Result<ApplyResult> {
        let row = Self::to_row(record)?;
        let delta = record.balance_delta();
        let mut conn = self.conn()?;

        conn.immediate_transaction::<_, Error, _>(|conn| {
            let account: Option<AccountRow> = accounts::table
                .find((key.user_id.as_str(), key.guild_id.as_str()))
                .select(AccountRow::as_select())
                .first(conn)
                .optional()?;
            let Some(account) = account else {
                return Ok(ApplyResult::NotFound);
            };

            let balance = parse_decimal(&account.balance)?;
            let new_balance = balance + delta;
            if new_balance < Decimal::ZERO {
                return Ok(ApplyResult::InsufficientFunds { balance });
            }

            diesel::update(accounts::table.find((key.user_id.as_str(), key.guild_id.as_str())))
                .set((
                    accounts::balance.eq(new_balance.to_string()),
                    accounts::updated_at.eq(timestamp(Utc::now())),
                ))
                .execute(conn)?;
            diesel::insert_into(transactions::table)
                .values(&row)
                .execute(conn)?;

            Ok(ApplyResult::Applied { new_balance })
        })
    }

    async fn reset_account(
        &self,
        key: &AccountKey,
        policy: ResetPolicy,
        operator: &UserId,
    ) -> Result<Option<ResetReceipt>> {
        let mut conn = self.conn()?;

        conn.immediate_transaction::<_, Error, _>(|conn| {
            let account: Option<AccountRow> = accounts::table
                .find((key.user_id.as_str(), key.guild_id.as_str()))
                .select(AccountRow::as_select())
                .first(conn)
                .optional()?;
            let Some(account) = account else {
                return Ok(None);
            };
            let previous_balance = parse_decimal(&account.balance)?;

            diesel::update(accounts::table.find((key.user_id.as_str(), key.guild_id.as_str())))
                .set((
                    accounts::balance.eq(Decimal::ZERO.to_string()),
                    accounts::updated_at.eq(timestamp(Utc::now())),
                ))
                .execute(conn)?;

            let (purged, adjustment) = match policy {
                ResetPolicy::Purge => {
                    let purged = diesel::delete(
                        transactions::table
                            .filter(transactions::user_id.eq(key.user_id.as_str()))
                            .filter(transactions::guild_id.eq(key.guild_id.as_str())),
                    )
                    .execute(conn)?;
                    (purged as u64, None)
                }
                ResetPolicy::Adjust => {
                    let adjustment =
                        TransactionRecord::reset_adjustment(key, previous_balance, operator);
                    if let Some(record) = &adjustment {
                        diesel::insert_into(transactions::table)
                            .values(&Self::to_row(record)?)
                            .execute(conn)?;
                    }
                    (0, adjustment)
                }
            };

            Ok(Some(ResetReceipt {
                previous_balance,
                purged,
                adjustment,
            }))
        })
    }
}
