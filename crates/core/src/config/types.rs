use serde::{Deserialize, Serialize};

use crate::ranking::Locale;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub prowlarr: Option<ProwlarrConfig>,
    #[serde(default)]
    pub indexers: Vec<IndexerConfig>,
    #[serde(default)]
    pub flag_bonuses: Vec<FlagBonusConfig>,
    #[serde(default)]
    pub ranking: RankingConfig,
    #[serde(default)]
    pub pacing: PacingConfig,
    #[serde(default)]
    pub scraper: ScraperConfig,
    #[serde(default)]
    pub runtime_lookup: Option<RuntimeLookupConfig>,
}

/// Prowlarr search backend configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProwlarrConfig {
    /// Prowlarr server URL (e.g., "http://localhost:9696")
    pub url: String,
    /// Prowlarr API key
    pub api_key: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

fn default_timeout() -> u32 {
    30
}

/// A configured indexer as exposed by the aggregator.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct IndexerConfig {
    /// Aggregator-side indexer ID.
    pub id: u32,
    /// Display name.
    pub name: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Source priority, 1 (lowest) to 25 (highest).
    #[serde(default = "default_priority")]
    pub priority: u8,
    /// Category IDs used for audiobook searches.
    #[serde(default)]
    pub audio_categories: Vec<u32>,
    /// Category IDs used for ebook searches.
    #[serde(default)]
    pub text_categories: Vec<u32>,
}

fn default_enabled() -> bool {
    true
}

pub(crate) fn default_priority() -> u8 {
    10
}

/// Bonus (or penalty) applied when a candidate carries a named indexer flag.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct FlagBonusConfig {
    /// Flag name, compared case- and whitespace-insensitively.
    pub name: String,
    /// Percent of the base score to add. Negative values penalize.
    pub modifier: f64,
}

/// Scoring and selection policy.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RankingConfig {
    /// Fraction of significant title words a candidate must contain.
    #[serde(default = "default_coverage")]
    pub word_coverage_threshold: f64,
    /// Minimum base score for automatic selection.
    #[serde(default = "default_min_score")]
    pub min_base_score: f64,
    /// Minimum final score for automatic selection.
    #[serde(default = "default_min_score")]
    pub min_final_score: f64,
    /// Audio candidates below this size are discarded before scoring.
    #[serde(default = "default_size_bound_mb")]
    pub audio_min_size_mb: u64,
    /// Text candidates above this size are discarded before scoring.
    #[serde(default = "default_size_bound_mb")]
    pub text_max_size_mb: u64,
    /// MB per minute of runtime at which the audio size score is full.
    #[serde(default = "default_quality_mb_per_min")]
    pub audio_quality_mb_per_min: f64,
    #[serde(default)]
    pub locale: Locale,
    /// Ebook format assumed when a request does not name one.
    #[serde(default = "default_text_format")]
    pub default_text_format: String,
}

fn default_coverage() -> f64 {
    0.8
}

fn default_min_score() -> f64 {
    50.0
}

fn default_size_bound_mb() -> u64 {
    20
}

fn default_quality_mb_per_min() -> f64 {
    1.0
}

fn default_text_format() -> String {
    "epub".to_string()
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            word_coverage_threshold: default_coverage(),
            min_base_score: default_min_score(),
            min_final_score: default_min_score(),
            audio_min_size_mb: default_size_bound_mb(),
            text_max_size_mb: default_size_bound_mb(),
            audio_quality_mb_per_min: default_quality_mb_per_min(),
            locale: Locale::default(),
            default_text_format: default_text_format(),
        }
    }
}

/// Request pacing and retry behavior for outbound scraping.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct PacingConfig {
    #[serde(default = "default_base_min")]
    pub base_delay_min_ms: u64,
    #[serde(default = "default_base_max")]
    pub base_delay_max_ms: u64,
    #[serde(default = "default_cooldown_min")]
    pub cooldown_min_ms: u64,
    #[serde(default = "default_cooldown_max")]
    pub cooldown_max_ms: u64,
    /// Consecutive retried pages that trip the cooldown.
    #[serde(default = "default_cooldown_after")]
    pub cooldown_after: u32,
    /// Base delay fed to the jittered exponential backoff.
    #[serde(default = "default_retry_base")]
    pub retry_base_delay_ms: u64,
    /// Total attempts per fetch, the first one included.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_base_min() -> u64 {
    2000
}

fn default_base_max() -> u64 {
    4000
}

fn default_cooldown_min() -> u64 {
    45_000
}

fn default_cooldown_max() -> u64 {
    60_000
}

fn default_cooldown_after() -> u32 {
    3
}

fn default_retry_base() -> u64 {
    1000
}

fn default_max_retries() -> u32 {
    5
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            base_delay_min_ms: default_base_min(),
            base_delay_max_ms: default_base_max(),
            cooldown_min_ms: default_cooldown_min(),
            cooldown_max_ms: default_cooldown_max(),
            cooldown_after: default_cooldown_after(),
            retry_base_delay_ms: default_retry_base(),
            max_retries: default_max_retries(),
        }
    }
}

/// Catalog scraping session configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ScraperConfig {
    /// Catalog region code (us, uk, de, ...).
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
    #[serde(default = "default_accept_language")]
    pub accept_language: String,
}

fn default_region() -> String {
    "us".to_string()
}

fn default_accept_language() -> String {
    "en-US,en;q=0.9".to_string()
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
            timeout_secs: default_timeout(),
            accept_language: default_accept_language(),
        }
    }
}

/// Runtime metadata API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RuntimeLookupConfig {
    /// Base URL (e.g., "https://api.audnex.us")
    pub url: String,
    #[serde(default = "default_lookup_timeout")]
    pub timeout_secs: u32,
}

fn default_lookup_timeout() -> u32 {
    10
}

/// Sanitized config for display (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prowlarr: Option<SanitizedProwlarrConfig>,
    pub indexers: Vec<IndexerConfig>,
    pub flag_bonuses: Vec<FlagBonusConfig>,
    pub ranking: RankingConfig,
    pub pacing: PacingConfig,
    pub scraper: ScraperConfig,
}

/// Sanitized Prowlarr config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedProwlarrConfig {
    pub url: String,
    pub api_key_configured: bool,
    pub timeout_secs: u32,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            prowlarr: config.prowlarr.as_ref().map(|p| SanitizedProwlarrConfig {
                url: p.url.clone(),
                api_key_configured: !p.api_key.is_empty(),
                timeout_secs: p.timeout_secs,
            }),
            indexers: config.indexers.clone(),
            flag_bonuses: config.flag_bonuses.clone(),
            ranking: config.ranking.clone(),
            pacing: config.pacing.clone(),
            scraper: config.scraper.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.prowlarr.is_none());
        assert!(config.indexers.is_empty());
        assert_eq!(config.ranking.word_coverage_threshold, 0.8);
        assert_eq!(config.ranking.min_base_score, 50.0);
        assert_eq!(config.ranking.min_final_score, 50.0);
        assert_eq!(config.ranking.audio_min_size_mb, 20);
        assert_eq!(config.ranking.text_max_size_mb, 20);
        assert_eq!(config.pacing.cooldown_after, 3);
        assert_eq!(config.pacing.max_retries, 5);
        assert_eq!(config.scraper.region, "us");
    }

    #[test]
    fn test_deserialize_indexers_with_defaults() {
        let toml = r#"
[[indexers]]
id = 1
name = "MyAnonamouse"
audio_categories = [13]

[[indexers]]
id = 2
name = "AudioBookBay"
enabled = false
priority = 25
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.indexers.len(), 2);
        assert!(config.indexers[0].enabled);
        assert_eq!(config.indexers[0].priority, 10);
        assert_eq!(config.indexers[0].audio_categories, vec![13]);
        assert!(config.indexers[0].text_categories.is_empty());
        assert!(!config.indexers[1].enabled);
        assert_eq!(config.indexers[1].priority, 25);
    }

    #[test]
    fn test_deserialize_flag_bonuses() {
        let toml = r#"
[[flag_bonuses]]
name = "Freeleech"
modifier = 50

[[flag_bonuses]]
name = "Unwanted"
modifier = -100
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.flag_bonuses.len(), 2);
        assert_eq!(config.flag_bonuses[0].modifier, 50.0);
        assert_eq!(config.flag_bonuses[1].modifier, -100.0);
    }

    #[test]
    fn test_deserialize_with_prowlarr_config() {
        let toml = r#"
[prowlarr]
url = "http://localhost:9696"
api_key = "test-api-key"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let prowlarr = config.prowlarr.as_ref().unwrap();
        assert_eq!(prowlarr.url, "http://localhost:9696");
        assert_eq!(prowlarr.api_key, "test-api-key");
        assert_eq!(prowlarr.timeout_secs, 30); // default
    }

    #[test]
    fn test_deserialize_german_locale() {
        let toml = r#"
[ranking]
locale = "de"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.ranking.locale, Locale::German);
    }

    #[test]
    fn test_sanitized_config_hides_api_key() {
        let config = Config {
            prowlarr: Some(ProwlarrConfig {
                url: "http://localhost:9696".to_string(),
                api_key: "secret-key".to_string(),
                timeout_secs: 60,
            }),
            ..Default::default()
        };

        let sanitized = SanitizedConfig::from(&config);
        let prowlarr = sanitized.prowlarr.as_ref().unwrap();
        assert_eq!(prowlarr.url, "http://localhost:9696");
        assert!(prowlarr.api_key_configured);
        assert_eq!(prowlarr.timeout_secs, 60);

        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("secret-key"));
    }
}
