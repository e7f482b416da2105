//! Ledger query and reset configuration.

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

use crate::domain::query::QueryDefaults;
use crate::domain::ResetPolicy;

/// Ledger paging, date and reset settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LedgerConfig {
    /// Page size when the caller gives none.
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,
    /// Upper bound on any requested page size.
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,
    /// Offset from UTC, in minutes, that calendar-day date filters use.
    #[serde(default)]
    pub utc_offset_minutes: i32,
    /// History handling on balance reset.
    #[serde(default)]
    pub reset_policy: ResetPolicy,
}

const fn default_page_size() -> u32 {
    50
}

const fn default_max_page_size() -> u32 {
    500
}

/// Largest offset chrono accepts, in minutes (just under 24h).
pub const MAX_UTC_OFFSET_MINUTES: i32 = 24 * 60 - 1;

impl LedgerConfig {
    /// Reference offset for date filters. Out-of-range values fall back to
    /// UTC.
    #[must_use]
    pub fn utc_offset(&self) -> FixedOffset {
        self.utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| QueryDefaults::default().utc_offset)
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            utc_offset_minutes: 0,
            reset_policy: ResetPolicy::default(),
        }
    }
}

impl From<&LedgerConfig> for QueryDefaults {
    fn from(config: &LedgerConfig) -> Self {
        Self {
            default_page_size: config.default_page_size,
            max_page_size: config.max_page_size,
            utc_offset: config.utc_offset(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_converts_minutes() {
        let config = LedgerConfig {
            utc_offset_minutes: -300,
            ..LedgerConfig::default()
        };
        assert_eq!(config.utc_offset().local_minus_utc(), -300 * 60);
        let defaults = QueryDefaults::from(&config);
        assert_eq!(defaults.default_page_size, 50);
        assert_eq!(defaults.max_page_size, 500);
    }

    #[test]
    fn out_of_range_offset_falls_back_to_utc() {
        let config = LedgerConfig {
            utc_offset_minutes: MAX_UTC_OFFSET_MINUTES + 1,
            ..LedgerConfig::default()
        };
        assert_eq!(config.utc_offset().local_minus_utc(), 0);
    }
}
