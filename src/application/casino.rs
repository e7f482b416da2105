//! Casino configuration service.
//!
//! Computes return-to-player figures for a guild's games, flags results
//! above the operator ceiling, previews unsaved form edits and persists
//! validated configurations.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::domain::game::{CasinoSettings, GameConfig, GameKind};
use crate::domain::rtp::{self, RtpResult};
use crate::domain::GuildId;
use crate::error::Result;
use crate::port::GameConfigStore;

/// RTP of one game, ready for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RtpReport {
    pub game: GameKind,
    pub name: &'static str,
    /// Fractions; use [`RtpResult::percent`] for display.
    pub rtp: RtpResult,
    /// Set when the result is above the configured ceiling.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl RtpReport {
    fn build(kind: GameKind, rtp: RtpResult, ceiling: f64) -> Self {
        let warning = rtp.exceeds(ceiling).then(|| {
            format!(
                "{} RTP {:.2}% is above the {:.2}% ceiling",
                kind.display_name(),
                rtp.peak() * 100.0,
                ceiling * 100.0
            )
        });
        Self {
            game: kind,
            name: kind.display_name(),
            rtp,
            warning,
        }
    }
}

/// RTP reporting and game configuration use cases.
pub struct CasinoService<S> {
    store: Arc<S>,
    rtp_ceiling: f64,
}

impl<S: GameConfigStore> CasinoService<S> {
    /// Create a service flagging results above `rtp_ceiling` (a fraction).
    pub fn new(store: Arc<S>, rtp_ceiling: f64) -> Self {
        Self { store, rtp_ceiling }
    }

    /// RTP of a configuration. Never fails; malformed input yields zero.
    #[must_use]
    pub fn compute_rtp(config: &GameConfig) -> RtpResult {
        rtp::compute_rtp(config)
    }

    #[must_use]
    pub fn rtp_report(&self, config: &GameConfig) -> RtpReport {
        RtpReport::build(config.kind(), rtp::compute_rtp(config), self.rtp_ceiling)
    }

    /// Saved configuration of a guild, with defaults for unsaved games.
    ///
    /// # Errors
    /// Returns a storage error.
    pub async fn settings(&self, guild: &GuildId) -> Result<CasinoSettings> {
        self.store.load_config(guild).await
    }

    /// Reports for the built-in default configurations.
    #[must_use]
    pub fn default_report(&self) -> Vec<RtpReport> {
        self.report_all(&CasinoSettings::default())
    }

    /// Reports for every game of a guild, in display order.
    ///
    /// # Errors
    /// Returns an error if the configuration cannot be loaded.
    pub async fn guild_report(&self, guild: &GuildId) -> Result<Vec<RtpReport>> {
        let settings = self.store.load_config(guild).await?;
        let reports = self.report_all(&settings);
        let flagged = reports.iter().filter(|r| r.warning.is_some()).count();
        if flagged > 0 {
            warn!(guild = %guild, flagged, "Games above RTP ceiling");
        }
        Ok(reports)
    }

    fn report_all(&self, settings: &CasinoSettings) -> Vec<RtpReport> {
        GameKind::ALL
            .into_iter()
            .map(|kind| self.rtp_report(settings.get(kind)))
            .collect()
    }

    /// Report for the guild's saved config of `kind` with form `edits`
    /// applied. Nothing is persisted.
    ///
    /// # Errors
    /// Returns an error if the base configuration cannot be loaded.
    pub async fn preview_config_change(
        &self,
        guild: &GuildId,
        kind: GameKind,
        edits: &Value,
    ) -> Result<RtpReport> {
        let settings = self.store.load_config(guild).await?;
        let result = rtp::preview_config_change(settings.get(kind), edits);
        Ok(RtpReport::build(kind, result, self.rtp_ceiling))
    }

    /// Validate and persist a configuration, returning its report.
    ///
    /// # Errors
    /// Returns [`crate::error::Error::Domain`] for an invalid configuration,
    /// or a storage error.
    pub async fn save_config(&self, guild: &GuildId, config: &GameConfig) -> Result<RtpReport> {
        config.validate()?;
        self.store.save_config(guild, config).await?;
        let report = self.rtp_report(config);
        info!(
            guild = %guild,
            game = %config.kind(),
            rtp = report.rtp.peak(),
            "Saved game config"
        );
        Ok(report)
    }
}
