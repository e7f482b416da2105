//! Builders for domain primitives used across tests.
//!
//! Concise factories for [`TransactionRecord`] and [`AccountKey`] so tests
//! focus on assertions rather than construction boilerplate.

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;

use crate::domain::{AccountKey, TransactionRecord, TransactionSource, TransactionType};

/// Account key for `user` in `guild`.
pub fn account(user: &str, guild: &str) -> AccountKey {
    AccountKey::new(user, guild)
}

/// A valid record stamped now.
///
/// # Panics
/// Panics if `amount` is not positive.
pub fn record(
    user: &str,
    guild: &str,
    kind: TransactionType,
    source: TransactionSource,
    amount: Decimal,
) -> TransactionRecord {
    TransactionRecord::builder(&account(user, guild), kind, source, amount)
        .build()
        .expect("testkit records need a positive amount")
}

/// A valid record stamped at `at`.
///
/// # Panics
/// Panics if `amount` is not positive.
pub fn record_at(
    user: &str,
    guild: &str,
    kind: TransactionType,
    source: TransactionSource,
    amount: Decimal,
    at: DateTime<Utc>,
) -> TransactionRecord {
    TransactionRecord::builder(&account(user, guild), kind, source, amount)
        .created_at(at)
        .build()
        .expect("testkit records need a positive amount")
}

/// UTC instant from calendar parts.
///
/// # Panics
/// Panics on an invalid date or time.
pub fn utc(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, 0)
        .single()
        .expect("valid test timestamp")
}
