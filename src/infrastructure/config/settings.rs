//! Application configuration loading and validation.
//!
//! Provides the main [`Config`] struct that aggregates all application settings.
//! Configuration is loaded from a TOML file; `CROUPIER_DATABASE` overrides the
//! database location.
//!
//! # Example
//!
//! ```no_run
//! use croupier::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("croupier.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::casino::CasinoConfig;
use super::ledger::{LedgerConfig, MAX_UTC_OFFSET_MINUTES};
use super::logging::LoggingConfig;
use crate::error::{ConfigError, Result};

/// Environment variable overriding [`Config::database`].
pub const DATABASE_ENV: &str = "CROUPIER_DATABASE";

/// Audit notification settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotificationConfig {
    /// Write audit events to the log. When false, events are skipped.
    #[serde(default = "default_audit_log")]
    pub audit_log: bool,
}

const fn default_audit_log() -> bool {
    true
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            audit_log: default_audit_log(),
        }
    }
}

/// Main application configuration.
///
/// Load from a TOML file using [`Config::load`] or parse directly with
/// [`Config::parse_toml`]. Every section is optional.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Logging and tracing configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Path to SQLite database file.
    ///
    /// Defaults to "croupier.db" in the current directory.
    #[serde(default = "default_database_path")]
    pub database: String,

    /// RTP reporting thresholds.
    #[serde(default)]
    pub casino: CasinoConfig,

    /// Ledger paging, date filter and reset settings.
    #[serde(default)]
    pub ledger: LedgerConfig,

    /// Audit notifications.
    #[serde(default)]
    pub notifications: NotificationConfig,
}

fn default_database_path() -> String {
    "croupier.db".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            database: default_database_path(),
            casino: CasinoConfig::default(),
            ledger: LedgerConfig::default(),
            notifications: NotificationConfig::default(),
        }
    }
}

impl Config {
    /// Parse configuration from TOML content.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The TOML content is malformed
    /// - Validation fails (e.g., a zero page size)
    pub fn parse_toml(content: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The TOML content is malformed
    /// - Validation fails
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// Built-in defaults with environment overrides applied.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Initialize tracing from the `logging` section.
    pub fn init_logging(&self) {
        self.logging.init();
    }

    fn apply_env(&mut self) {
        if let Ok(database) = std::env::var(DATABASE_ENV) {
            if !database.trim().is_empty() {
                self.database = database;
            }
        }
    }

    /// Validate configuration values.
    ///
    /// # Errors
    /// Returns [`ConfigError`] describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if self.database.trim().is_empty() {
            return Err(ConfigError::MissingField { field: "database" }.into());
        }
        if !self.casino.rtp_ceiling.is_finite() || self.casino.rtp_ceiling <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "rtp_ceiling",
                reason: "must be a positive number".to_string(),
            }
            .into());
        }
        if self.ledger.default_page_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "default_page_size",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.ledger.max_page_size < self.ledger.default_page_size {
            return Err(ConfigError::InvalidValue {
                field: "max_page_size",
                reason: "must be >= default_page_size".to_string(),
            }
            .into());
        }
        if self.ledger.utc_offset_minutes.abs() > MAX_UTC_OFFSET_MINUTES {
            return Err(ConfigError::InvalidValue {
                field: "utc_offset_minutes",
                reason: format!("must be within ±{MAX_UTC_OFFSET_MINUTES}"),
            }
            .into());
        }
        Ok(())
    }
}
