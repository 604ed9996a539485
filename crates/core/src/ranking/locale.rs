//! Per-locale text rules injected into the ranking engine.

use serde::{Deserialize, Serialize};

const ENGLISH_STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "of", "in", "on", "at", "to", "for", "with", "by", "from",
    "is",
];

const GERMAN_STOP_WORDS: &[&str] = &[
    "der", "die", "das", "den", "dem", "des", "ein", "eine", "einer", "eines", "einem", "und",
    "oder", "von", "vom", "zu", "zum", "zur", "mit", "im", "am", "an", "auf", "fur", "aus",
];

const ENGLISH_LABELS: &[&str] = &["book", "volume", "vol", "part"];

const GERMAN_LABELS: &[&str] = &["band", "teil", "folge", "buch"];

/// Built-in locale selector used in configuration.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum Locale {
    #[default]
    #[serde(rename = "en")]
    English,
    #[serde(rename = "de")]
    German,
}

impl Locale {
    pub fn profile(&self) -> LocaleProfile {
        match self {
            Locale::English => LocaleProfile::english(),
            Locale::German => LocaleProfile::german(),
        }
    }
}

/// Text rules for one catalog language.
///
/// Stop words and label prefixes are stored in normalized form (lowercase,
/// no diacritics). Substitutions are applied to lowercased text before
/// diacritics are stripped.
#[derive(Debug, Clone, PartialEq)]
pub struct LocaleProfile {
    /// Words ignored when measuring title word coverage.
    pub stop_words: Vec<String>,
    /// Character sequence replacements, e.g. `ß` to `ss`.
    pub substitutions: Vec<(String, String)>,
    /// Series labels whose trailing `<label> <number>` is optional in a title.
    pub label_prefixes: Vec<String>,
}

impl LocaleProfile {
    pub fn english() -> Self {
        Self {
            stop_words: to_strings(ENGLISH_STOP_WORDS),
            substitutions: Vec::new(),
            label_prefixes: to_strings(ENGLISH_LABELS),
        }
    }

    /// German rules. English stop words and labels are included because
    /// German catalogs carry many English-titled releases.
    pub fn german() -> Self {
        let mut stop_words = to_strings(GERMAN_STOP_WORDS);
        stop_words.extend(to_strings(ENGLISH_STOP_WORDS));
        let mut label_prefixes = to_strings(GERMAN_LABELS);
        label_prefixes.extend(to_strings(ENGLISH_LABELS));
        Self {
            stop_words,
            substitutions: vec![("ß".to_string(), "ss".to_string())],
            label_prefixes,
        }
    }

    pub fn is_stop_word(&self, word: &str) -> bool {
        self.stop_words.iter().any(|w| w == word)
    }

    /// Apply substitutions to already-lowercased text.
    pub fn substitute(&self, text: &str) -> String {
        self.substitutions
            .iter()
            .fold(text.to_string(), |acc, (from, to)| acc.replace(from.as_str(), to))
    }
}

impl Default for LocaleProfile {
    fn default() -> Self {
        Self::english()
    }
}

fn to_strings(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_english_profile() {
        let profile = Locale::English.profile();
        assert!(profile.is_stop_word("the"));
        assert!(!profile.is_stop_word("mistborn"));
        assert!(profile.substitutions.is_empty());
        assert!(profile.label_prefixes.contains(&"book".to_string()));
    }

    #[test]
    fn test_german_profile() {
        let profile = Locale::German.profile();
        assert!(profile.is_stop_word("der"));
        assert!(profile.is_stop_word("the"));
        assert_eq!(profile.substitute("straße"), "strasse");
        assert!(profile.label_prefixes.contains(&"band".to_string()));
    }

    #[test]
    fn test_locale_serialization() {
        assert_eq!(serde_json::to_string(&Locale::German).unwrap(), "\"de\"");
        let parsed: Locale = serde_json::from_str("\"en\"").unwrap();
        assert_eq!(parsed, Locale::English);
    }
}
