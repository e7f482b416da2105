//! Casino economics configuration.

use serde::{Deserialize, Serialize};

/// Operator-facing RTP settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CasinoConfig {
    /// RTP fraction above which a game is flagged (e.g. 0.95 = 95%).
    #[serde(default = "default_rtp_ceiling")]
    pub rtp_ceiling: f64,
}

const fn default_rtp_ceiling() -> f64 {
    0.95
}

impl Default for CasinoConfig {
    fn default() -> Self {
        Self {
            rtp_ceiling: default_rtp_ceiling(),
        }
    }
}
