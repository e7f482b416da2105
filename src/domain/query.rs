//! Ledger query model: caller criteria resolved into a filter, a sort
//! specification and a page window.
//!
//! Resolution is forgiving. A date or sort key that does not parse drops
//! that criterion instead of failing the whole query, since the consumer is
//! a reporting view.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc};
use tracing::debug;

use super::id::{GuildId, UserId};
use super::transaction::{TransactionRecord, TransactionSource, TransactionType};

/// Defaults applied when resolving criteria.
#[derive(Debug, Clone, Copy)]
pub struct QueryDefaults {
    pub default_page_size: u32,
    pub max_page_size: u32,
    /// Reference timezone for calendar-day date filters.
    pub utc_offset: FixedOffset,
}

impl Default for QueryDefaults {
    fn default() -> Self {
        Self {
            default_page_size: 50,
            max_page_size: 500,
            utc_offset: Utc.fix(),
        }
    }
}

/// Raw search criteria as a caller supplies them.
#[derive(Debug, Clone)]
pub struct LedgerCriteria {
    pub guild_id: GuildId,
    /// 1-indexed page number.
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    /// Substring of the user id.
    pub user_search: Option<String>,
    /// Substring of the handling operator id or the bet id.
    pub admin_search: Option<String>,
    pub types: Vec<TransactionType>,
    pub sources: Vec<TransactionSource>,
    /// `YYYY-MM-DD`, inclusive from the start of the day.
    pub date_from: Option<String>,
    /// `YYYY-MM-DD`, inclusive to the end of the day.
    pub date_to: Option<String>,
    /// Comma-separated `field:direction` pairs.
    pub sort: Option<String>,
}

impl LedgerCriteria {
    pub fn new(guild_id: impl Into<GuildId>) -> Self {
        Self {
            guild_id: guild_id.into(),
            page: None,
            page_size: None,
            user_search: None,
            admin_search: None,
            types: Vec::new(),
            sources: Vec::new(),
            date_from: None,
            date_to: None,
            sort: None,
        }
    }

    /// Resolve into an executable query.
    #[must_use]
    pub fn resolve(&self, defaults: &QueryDefaults) -> LedgerQuery {
        let created_from = self
            .date_from
            .as_deref()
            .and_then(|d| day_bound(d, DayBound::Start, defaults.utc_offset));
        let created_to = self
            .date_to
            .as_deref()
            .and_then(|d| day_bound(d, DayBound::End, defaults.utc_offset));

        let filter = LedgerFilter {
            guild_id: self.guild_id.clone(),
            user_search: normalize_search(self.user_search.as_deref()),
            admin_search: normalize_search(self.admin_search.as_deref()),
            types: dedup(&self.types),
            sources: dedup(&self.sources),
            created_from,
            created_to,
        };

        let page_size = self
            .page_size
            .filter(|size| *size > 0)
            .unwrap_or(defaults.default_page_size)
            .min(defaults.max_page_size)
            .max(1);
        let page = Page::numbered(self.page.unwrap_or(1), page_size);

        LedgerQuery {
            filter,
            sort: self.sort.as_deref().map(SortSpec::parse).unwrap_or_default(),
            page,
        }
    }
}

fn dedup<T: Copy + PartialEq>(values: &[T]) -> Vec<T> {
    let mut out = Vec::with_capacity(values.len());
    for value in values {
        if !out.contains(value) {
            out.push(*value);
        }
    }
    out
}

fn normalize_search(search: Option<&str>) -> Option<String> {
    search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_ascii_lowercase)
}

#[derive(Clone, Copy)]
enum DayBound {
    Start,
    End,
}

fn day_bound(date: &str, bound: DayBound, offset: FixedOffset) -> Option<DateTime<Utc>> {
    let Ok(day) = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d") else {
        debug!(date, "Ignoring unparsable date filter");
        return None;
    };
    let local: Option<NaiveDateTime> = match bound {
        DayBound::Start => day.and_hms_milli_opt(0, 0, 0, 0),
        DayBound::End => day.and_hms_milli_opt(23, 59, 59, 999),
    };
    local
        .and_then(|naive| offset.from_local_datetime(&naive).single())
        .map(|at| at.with_timezone(&Utc))
}

/// A resolved ledger query.
#[derive(Debug, Clone)]
pub struct LedgerQuery {
    pub filter: LedgerFilter,
    pub sort: SortSpec,
    pub page: Page,
}

/// Selection predicate over a guild's transactions.
///
/// Empty `types` or `sources` mean "any". Search needles are stored trimmed
/// and ASCII-lowercased.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerFilter {
    pub guild_id: GuildId,
    pub user_search: Option<String>,
    pub admin_search: Option<String>,
    pub types: Vec<TransactionType>,
    pub sources: Vec<TransactionSource>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
}

impl LedgerFilter {
    /// Every transaction of a guild.
    pub fn guild(guild_id: impl Into<GuildId>) -> Self {
        Self {
            guild_id: guild_id.into(),
            user_search: None,
            admin_search: None,
            types: Vec::new(),
            sources: Vec::new(),
            created_from: None,
            created_to: None,
        }
    }

    #[must_use]
    pub fn with_types(mut self, types: &[TransactionType]) -> Self {
        self.types = dedup(types);
        self
    }

    /// Whether a record is selected. The in-process reference semantics
    /// every store must reproduce.
    #[must_use]
    pub fn matches(&self, record: &TransactionRecord) -> bool {
        if record.guild_id != self.guild_id {
            return false;
        }
        if !self.types.is_empty() && !self.types.contains(&record.kind) {
            return false;
        }
        if !self.sources.is_empty() && !self.sources.contains(&record.source) {
            return false;
        }
        if self.created_from.is_some_and(|from| record.created_at < from) {
            return false;
        }
        if self.created_to.is_some_and(|to| record.created_at > to) {
            return false;
        }
        if let Some(needle) = &self.user_search {
            if !contains_folded(record.user_id.as_str(), needle) {
                return false;
            }
        }
        if let Some(needle) = &self.admin_search {
            let handled = record
                .handled_by
                .as_ref()
                .is_some_and(|op| contains_folded(op.as_str(), needle));
            let bet = record
                .bet_id
                .as_deref()
                .is_some_and(|bet| contains_folded(bet, needle));
            if !handled && !bet {
                return false;
            }
        }
        true
    }
}

fn contains_folded(haystack: &str, needle: &str) -> bool {
    haystack.to_ascii_lowercase().contains(needle)
}

/// Sortable transaction fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    CreatedAt,
    Amount,
    Type,
    Source,
    UserId,
    HandledBy,
    BetId,
}

impl SortField {
    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "createdat" | "created_at" | "date" => Some(SortField::CreatedAt),
            "amount" => Some(SortField::Amount),
            "type" => Some(SortField::Type),
            "source" => Some(SortField::Source),
            "userid" | "user_id" => Some(SortField::UserId),
            "handledby" | "handled_by" => Some(SortField::HandledBy),
            "betid" | "bet_id" => Some(SortField::BetId),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            SortField::CreatedAt => "createdAt",
            SortField::Amount => "amount",
            SortField::Type => "type",
            SortField::Source => "source",
            SortField::UserId => "userId",
            SortField::HandledBy => "handledBy",
            SortField::BetId => "betId",
        }
    }

    fn compare(self, a: &TransactionRecord, b: &TransactionRecord) -> Ordering {
        match self {
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::Amount => a.amount.cmp(&b.amount),
            SortField::Type => a.kind.as_str().cmp(b.kind.as_str()),
            SortField::Source => a.source.as_str().cmp(b.source.as_str()),
            SortField::UserId => a.user_id.as_str().cmp(b.user_id.as_str()),
            SortField::HandledBy => a
                .handled_by
                .as_ref()
                .map(UserId::as_str)
                .cmp(&b.handled_by.as_ref().map(UserId::as_str)),
            SortField::BetId => a.bet_id.as_deref().cmp(&b.bet_id.as_deref()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// One `field:direction` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub field: SortField,
    pub direction: SortDirection,
}

/// Ordered list of sort keys. Ties after the last key are broken by record
/// id ascending, which makes the order total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    keys: Vec<SortKey>,
}

impl SortSpec {
    /// Parse `field:direction,field:direction`. Unknown fields and repeated
    /// fields are skipped; a missing direction means ascending. An empty
    /// result falls back to the default order.
    #[must_use]
    pub fn parse(spec: &str) -> Self {
        let mut keys: Vec<SortKey> = Vec::new();
        for part in spec.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (field, direction) = part.split_once(':').unwrap_or((part, "asc"));
            let Some(field) = SortField::parse(field) else {
                debug!(field, "Ignoring unknown sort field");
                continue;
            };
            let direction = if direction.trim().eq_ignore_ascii_case("desc") {
                SortDirection::Desc
            } else {
                SortDirection::Asc
            };
            if keys.iter().all(|k| k.field != field) {
                keys.push(SortKey { field, direction });
            }
        }
        if keys.is_empty() {
            Self::default()
        } else {
            Self { keys }
        }
    }

    #[must_use]
    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }

    /// Compare two records under this spec.
    #[must_use]
    pub fn compare(&self, a: &TransactionRecord, b: &TransactionRecord) -> Ordering {
        self.keys
            .iter()
            .map(|key| {
                let ordering = key.field.compare(a, b);
                match key.direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                }
            })
            .find(|ordering| ordering.is_ne())
            .unwrap_or_else(|| a.id.cmp(&b.id))
    }
}

impl Default for SortSpec {
    fn default() -> Self {
        Self {
            keys: vec![SortKey {
                field: SortField::CreatedAt,
                direction: SortDirection::Desc,
            }],
        }
    }
}

impl fmt::Display for SortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .keys
            .iter()
            .map(|k| {
                let dir = match k.direction {
                    SortDirection::Asc => "asc",
                    SortDirection::Desc => "desc",
                };
                format!("{}:{dir}", k.field.as_str())
            })
            .collect();
        f.write_str(&parts.join(","))
    }
}

/// Window into an ordered selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub skip: u64,
    /// `None` selects everything after `skip`.
    pub limit: Option<u64>,
}

impl Page {
    /// 1-indexed page of `size` records. Page 0 is treated as page 1.
    #[must_use]
    pub fn numbered(page: u32, size: u32) -> Self {
        let page = u64::from(page.max(1));
        Self {
            skip: (page - 1) * u64::from(size),
            limit: Some(u64::from(size)),
        }
    }

    /// The whole selection.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            skip: 0,
            limit: None,
        }
    }

    /// Apply the window to an already ordered slice.
    #[must_use]
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = usize::try_from(self.skip).unwrap_or(usize::MAX).min(items.len());
        let end = match self.limit {
            Some(limit) => start.saturating_add(usize::try_from(limit).unwrap_or(usize::MAX)),
            None => items.len(),
        }
        .min(items.len());
        &items[start..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::id::AccountKey;
    use chrono::Timelike;
    use rust_decimal_macros::dec;

    fn record(user: &str, kind: TransactionType) -> TransactionRecord {
        TransactionRecord::builder(
            &AccountKey::new(user, "g1"),
            kind,
            TransactionSource::Web,
            dec!(10),
        )
        .build()
        .unwrap()
    }

    #[test]
    fn default_sort_is_created_at_desc() {
        assert_eq!(SortSpec::default().to_string(), "createdAt:desc");
        assert_eq!(SortSpec::parse("").to_string(), "createdAt:desc");
        assert_eq!(SortSpec::parse("bogus:asc").to_string(), "createdAt:desc");
    }

    #[test]
    fn parse_multi_key_spec() {
        let spec = SortSpec::parse("amount:desc, type , amount:asc");
        assert_eq!(spec.to_string(), "amount:desc,type:asc");
    }

    #[test]
    fn page_math_is_one_indexed() {
        assert_eq!(Page::numbered(1, 50).skip, 0);
        assert_eq!(Page::numbered(3, 20).skip, 40);
        assert_eq!(Page::numbered(0, 20).skip, 0);
    }

    #[test]
    fn page_slice_clamps() {
        let items: Vec<u32> = (0..7).collect();
        assert_eq!(Page::numbered(2, 5).slice(&items), &[5, 6]);
        assert!(Page::numbered(3, 5).slice(&items).is_empty());
        assert_eq!(Page::all().slice(&items).len(), 7);
    }

    #[test]
    fn resolve_clamps_page_size() {
        let mut criteria = LedgerCriteria::new("g1");
        criteria.page_size = Some(10_000);
        let query = criteria.resolve(&QueryDefaults::default());
        assert_eq!(query.page.limit, Some(500));

        criteria.page_size = Some(0);
        let query = criteria.resolve(&QueryDefaults::default());
        assert_eq!(query.page.limit, Some(50));
    }

    #[test]
    fn bad_dates_drop_the_criterion() {
        let mut criteria = LedgerCriteria::new("g1");
        criteria.date_from = Some("31/12/2025".into());
        criteria.date_to = Some("2025-12-31".into());
        let filter = criteria.resolve(&QueryDefaults::default()).filter;
        assert!(filter.created_from.is_none());
        let to = filter.created_to.unwrap();
        assert_eq!((to.hour(), to.minute(), to.second()), (23, 59, 59));
        assert_eq!(to.timestamp_subsec_millis(), 999);
    }

    #[test]
    fn date_bounds_follow_reference_offset() {
        let mut criteria = LedgerCriteria::new("g1");
        criteria.date_from = Some("2025-06-01".into());
        let defaults = QueryDefaults {
            utc_offset: FixedOffset::east_opt(2 * 3600).unwrap(),
            ..QueryDefaults::default()
        };
        let from = criteria.resolve(&defaults).filter.created_from.unwrap();
        assert_eq!(from.to_rfc3339(), "2025-05-31T22:00:00+00:00");
    }

    #[test]
    fn search_is_case_insensitive_and_literal() {
        let mut rec = record("User_42", TransactionType::Bet);
        rec.bet_id = Some("BET-%7".into());
        let mut filter = LedgerFilter::guild("g1");
        filter.user_search = Some("user_4".into());
        assert!(filter.matches(&rec));

        filter.user_search = None;
        filter.admin_search = Some("bet-%".into());
        assert!(filter.matches(&rec));

        filter.admin_search = Some(".*".into());
        assert!(!filter.matches(&rec));
    }

    #[test]
    fn admin_search_checks_handler_or_bet() {
        let rec = TransactionRecord::builder(
            &AccountKey::new("u1", "g1"),
            TransactionType::Deposit,
            TransactionSource::Web,
            dec!(5),
        )
        .handled_by("Manager9")
        .build()
        .unwrap();
        let mut filter = LedgerFilter::guild("g1");
        filter.admin_search = Some("manager".into());
        assert!(filter.matches(&rec));
        filter.admin_search = Some("nobody".into());
        assert!(!filter.matches(&rec));
    }

    #[test]
    fn type_filter_and_guild_scope() {
        let rec = record("u1", TransactionType::Win);
        assert!(LedgerFilter::guild("g1").with_types(&[TransactionType::Win]).matches(&rec));
        assert!(!LedgerFilter::guild("g1").with_types(&[TransactionType::Bet]).matches(&rec));
        assert!(!LedgerFilter::guild("g2").matches(&rec));
    }

    #[test]
    fn ties_break_by_id() {
        let a = record("u1", TransactionType::Bet);
        let mut b = a.clone();
        b.id = crate::domain::id::TransactionId::generate();
        let spec = SortSpec::parse("type:asc");
        assert_eq!(spec.compare(&a, &b), a.id.cmp(&b.id));
    }
}
