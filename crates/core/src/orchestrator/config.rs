//! Orchestrator configuration.

use crate::config::{Config, PacingConfig};
use crate::ranking::Locale;

/// Settings the search orchestrator needs from the loaded configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorConfig {
    /// Delays between group queries.
    pub pacing: PacingConfig,
    /// Audio candidates below this size (MB) are discarded.
    pub audio_min_size_mb: u64,
    /// Text candidates above this size (MB) are discarded.
    pub text_max_size_mb: u64,
    /// Ebook format requested from the archive when the request names none.
    pub default_text_format: String,
    /// Locale used to derive the search query from a title.
    pub locale: Locale,
}

impl OrchestratorConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            pacing: config.pacing.clone(),
            audio_min_size_mb: config.ranking.audio_min_size_mb,
            text_max_size_mb: config.ranking.text_max_size_mb,
            default_text_format: config.ranking.default_text_format.clone(),
            locale: config.ranking.locale,
        }
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}
