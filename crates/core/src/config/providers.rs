//! Configuration provider seams.
//!
//! Source and flag-bonus settings are read through these traits so callers
//! can back them with a config file, a settings table, or test fixtures.

use crate::ranking::FlagBonus;

use super::{Config, IndexerConfig};

/// Supplies the currently configured indexers.
pub trait SourceProvider: Send + Sync {
    fn sources(&self) -> Vec<IndexerConfig>;
}

/// Supplies the configured per-flag score modifiers.
pub trait FlagBonusProvider: Send + Sync {
    fn flag_bonuses(&self) -> Vec<FlagBonus>;
}

impl SourceProvider for Config {
    fn sources(&self) -> Vec<IndexerConfig> {
        self.indexers.clone()
    }
}

impl FlagBonusProvider for Config {
    fn flag_bonuses(&self) -> Vec<FlagBonus> {
        self.flag_bonuses
            .iter()
            .map(|f| FlagBonus::new(&f.name, f.modifier))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FlagBonusConfig;

    #[test]
    fn test_config_provides_flag_bonuses() {
        let config = Config {
            flag_bonuses: vec![FlagBonusConfig {
                name: " FreeLeech ".to_string(),
                modifier: 25.0,
            }],
            ..Default::default()
        };
        let bonuses = config.flag_bonuses();
        assert_eq!(bonuses.len(), 1);
        assert!(bonuses[0].matches("freeleech"));
        assert_eq!(bonuses[0].percent, 25.0);
    }

    #[test]
    fn test_config_provides_sources() {
        let config: Config = toml::from_str(
            r#"
[[indexers]]
id = 1
name = "A"
audio_categories = [3030]
"#,
        )
        .unwrap();
        assert_eq!(config.sources().len(), 1);
        assert_eq!(config.sources()[0].id, 1);
    }
}
