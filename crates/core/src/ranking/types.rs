//! Types for candidate ranking.

use serde::{Deserialize, Serialize};

use crate::config::RankingConfig;
use crate::searcher::{CandidateResult, ContentType};

use super::locale::LocaleProfile;

/// Default priority for candidates whose source carries none.
pub const DEFAULT_PRIORITY: u8 = 10;

/// Highest source priority; a source at this priority doubles the base score.
pub const MAX_PRIORITY: u8 = 25;

/// What the user asked for.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RequestContext {
    pub title: String,
    /// Raw author field; may list several authors and contributors.
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrator: Option<String>,
    /// Catalog identifier (ASIN, ISBN) used for runtime and archive lookups.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    /// Known audiobook runtime in minutes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime_minutes: Option<u32>,
    /// Requested ebook format (epub, pdf, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_format: Option<String>,
}

impl RequestContext {
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            ..Default::default()
        }
    }
}

/// A named flag that adds a percentage of base score when present.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlagBonus {
    /// Flag name, stored trimmed and lowercased.
    pub name: String,
    /// Percentage of base score; negative values penalize.
    pub percent: f64,
}

impl FlagBonus {
    pub fn new(name: &str, percent: f64) -> Self {
        Self {
            name: normalize_flag(name),
            percent,
        }
    }

    /// Case- and whitespace-insensitive comparison with a candidate flag.
    pub fn matches(&self, flag: &str) -> bool {
        normalize_flag(flag) == self.name
    }
}

pub(crate) fn normalize_flag(flag: &str) -> String {
    flag.trim().to_lowercase()
}

/// Options for one ranking call.
#[derive(Debug, Clone)]
pub struct RankingOptions {
    pub content_type: ContentType,
    /// Reject candidates that name none of the requested authors.
    pub require_author: bool,
    pub flag_bonuses: Vec<FlagBonus>,
    /// Fraction of significant title words a candidate must contain.
    pub word_coverage_threshold: f64,
    /// MB per minute at or above which audio size earns full points.
    pub audio_quality_mb_per_min: f64,
    /// Upper size bound for text candidates, in MB.
    pub text_max_size_mb: u64,
    /// Ebook format wanted when the request names none.
    pub default_text_format: String,
    pub locale: LocaleProfile,
}

impl RankingOptions {
    /// Options for a content type built from ranking configuration.
    pub fn from_config(
        config: &RankingConfig,
        content_type: ContentType,
        flag_bonuses: Vec<FlagBonus>,
    ) -> Self {
        Self {
            content_type,
            require_author: true,
            flag_bonuses,
            word_coverage_threshold: config.word_coverage_threshold,
            audio_quality_mb_per_min: config.audio_quality_mb_per_min,
            text_max_size_mb: config.text_max_size_mb,
            default_text_format: config.default_text_format.clone(),
            locale: config.locale.profile(),
        }
    }

    pub fn audio() -> Self {
        Self::from_config(&RankingConfig::default(), ContentType::Audio, Vec::new())
    }

    pub fn text() -> Self {
        Self::from_config(&RankingConfig::default(), ContentType::Text, Vec::new())
    }

    pub fn with_flag_bonuses(mut self, bonuses: Vec<FlagBonus>) -> Self {
        self.flag_bonuses = bonuses;
        self
    }

    pub fn with_require_author(mut self, require: bool) -> Self {
        self.require_author = require;
        self
    }
}

/// Where a bonus modifier came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ModifierKind {
    Priority,
    Flag,
}

/// One multiplicative bonus applied on top of base score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BonusModifier {
    pub kind: ModifierKind,
    pub name: String,
    /// Fraction of base score (0.4 means +40%).
    pub fraction: f64,
    /// Resulting points: `base_score * fraction`.
    pub points: f64,
}

/// Why a candidate's match dimension was forced to zero.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "gate", rename_all = "snake_case")]
pub enum GateFailure {
    /// Too few significant title words present.
    WordCoverage { found: usize, required: usize },
    /// None of the requested authors appear in the title.
    AuthorMissing,
}

/// Per-dimension scores and human-readable notes.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ScoreBreakdown {
    /// Format tier, 0-10.
    pub format_score: f64,
    /// Size quality, 0-15.
    pub size_score: f64,
    /// Availability, 0-15.
    pub availability_score: f64,
    /// Title plus author match, 0-60.
    pub match_score: f64,
    pub title_score: f64,
    pub author_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gate_failure: Option<GateFailure>,
    pub notes: Vec<String>,
}

/// A scored candidate with its position in the ranking.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankedResult {
    pub candidate: CandidateResult,
    /// Sum of the four dimensions, 0-100. Zero when a gate failed.
    pub base_score: f64,
    pub bonus_modifiers: Vec<BonusModifier>,
    pub bonus_points: f64,
    pub final_score: f64,
    /// 1-based position after sorting.
    pub rank: usize,
    pub breakdown: ScoreBreakdown,
}

/// Dual-threshold eligibility for automatic selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionPolicy {
    pub min_base_score: f64,
    pub min_final_score: f64,
}

impl SelectionPolicy {
    pub fn from_config(config: &RankingConfig) -> Self {
        Self {
            min_base_score: config.min_base_score,
            min_final_score: config.min_final_score,
        }
    }

    pub fn is_eligible(&self, result: &RankedResult) -> bool {
        result.base_score >= self.min_base_score && result.final_score >= self.min_final_score
    }

    /// Highest-ranked eligible result, if any.
    pub fn select<'a>(&self, ranked: &'a [RankedResult]) -> Option<&'a RankedResult> {
        ranked.iter().find(|r| self.is_eligible(r))
    }
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self::from_config(&RankingConfig::default())
    }
}
