//! Wiring shared by CLI handlers: effective config, store and services.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::adapter::outbound::sqlite::SqliteStore;
use crate::application::{CasinoService, TreasuryService};
use crate::domain::query::QueryDefaults;
use crate::error::Result;
use crate::infrastructure::config::settings::Config;
use crate::port::{LogNotifier, NotifierRegistry};

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "croupier.toml";

/// Resolve the configuration: an explicit path must load; otherwise the
/// default file is used when present, and built-in defaults when not.
///
/// # Errors
/// Returns an error if the chosen file cannot be read, parsed or validated.
pub fn load_config(path: Option<&Path>) -> Result<(Config, Option<PathBuf>)> {
    if let Some(path) = path {
        return Ok((Config::load(path)?, Some(path.to_path_buf())));
    }
    let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
    if fallback.is_file() {
        return Ok((Config::load(&fallback)?, Some(fallback)));
    }
    Ok((Config::from_env(), None))
}

/// Store and services for one CLI invocation.
pub struct Context {
    pub config: Config,
    pub store: Arc<SqliteStore>,
}

impl Context {
    /// Open the configured database.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(config: Config) -> Result<Self> {
        let store = Arc::new(SqliteStore::open(&config.database)?);
        debug!(database = %config.database, "CLI context ready");
        Ok(Self { config, store })
    }

    #[must_use]
    pub fn casino(&self) -> CasinoService<SqliteStore> {
        CasinoService::new(self.store.clone(), self.config.casino.rtp_ceiling)
    }

    #[must_use]
    pub fn treasury(&self) -> TreasuryService<SqliteStore> {
        let mut notifiers = NotifierRegistry::new();
        if self.config.notifications.audit_log {
            notifiers.register(Box::new(LogNotifier));
        }
        debug!(notifiers = notifiers.len(), "audit channels registered");
        TreasuryService::new(
            self.store.clone(),
            Arc::new(notifiers),
            self.config.ledger.reset_policy,
        )
    }

    #[must_use]
    pub fn query_defaults(&self) -> QueryDefaults {
        QueryDefaults::from(&self.config.ledger)
    }
}
