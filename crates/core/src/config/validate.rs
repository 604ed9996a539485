use std::collections::HashSet;

use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Indexer priorities are within 1-25 and IDs are unique
/// - Ranking thresholds are within range
/// - Pacing ranges are ordered
/// - Prowlarr URL and API key are present when the section exists
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if let Some(prowlarr) = &config.prowlarr {
        if prowlarr.url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "prowlarr.url cannot be empty".to_string(),
            ));
        }
        if prowlarr.api_key.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "prowlarr.api_key cannot be empty".to_string(),
            ));
        }
    }

    let mut seen = HashSet::new();
    for indexer in &config.indexers {
        if !(1..=25).contains(&indexer.priority) {
            return Err(ConfigError::ValidationError(format!(
                "indexer {} priority {} is outside 1-25",
                indexer.name, indexer.priority
            )));
        }
        if !seen.insert(indexer.id) {
            return Err(ConfigError::ValidationError(format!(
                "duplicate indexer id {}",
                indexer.id
            )));
        }
    }

    let ranking = &config.ranking;
    if !(ranking.word_coverage_threshold > 0.0 && ranking.word_coverage_threshold <= 1.0) {
        return Err(ConfigError::ValidationError(
            "ranking.word_coverage_threshold must be in (0, 1]".to_string(),
        ));
    }
    for (name, value) in [
        ("min_base_score", ranking.min_base_score),
        ("min_final_score", ranking.min_final_score),
    ] {
        if !(0.0..=100.0).contains(&value) {
            return Err(ConfigError::ValidationError(format!(
                "ranking.{} must be between 0 and 100",
                name
            )));
        }
    }
    if ranking.audio_quality_mb_per_min <= 0.0 {
        return Err(ConfigError::ValidationError(
            "ranking.audio_quality_mb_per_min must be positive".to_string(),
        ));
    }

    let pacing = &config.pacing;
    if pacing.base_delay_min_ms > pacing.base_delay_max_ms {
        return Err(ConfigError::ValidationError(
            "pacing.base_delay_min_ms cannot exceed base_delay_max_ms".to_string(),
        ));
    }
    if pacing.cooldown_min_ms > pacing.cooldown_max_ms {
        return Err(ConfigError::ValidationError(
            "pacing.cooldown_min_ms cannot exceed cooldown_max_ms".to_string(),
        ));
    }
    if pacing.cooldown_after == 0 {
        return Err(ConfigError::ValidationError(
            "pacing.cooldown_after cannot be 0".to_string(),
        ));
    }

    Ok(())
}
