//! Candidate matching and scoring.
//!
//! Every candidate gets a base score out of 100 from four dimensions:
//! format (10), size (15), availability (15), and title/author match (60).
//! Two gates force the base score to zero: too few significant title words
//! present, and none of the requested authors named. Source priority and
//! configured indexer flags then add percentages of the base score.

mod engine;
mod locale;
mod matching;
mod normalize;
mod quality;
mod types;

pub use engine::{rank, score_candidate};
pub use locale::{Locale, LocaleProfile};
pub use matching::{
    author_present, best_window_similarity, is_complete_title_match, match_candidate,
    similarity, CandidateText, MatchOutcome, PreparedRequest,
};
pub use normalize::{
    normalize, parse_authors, significant_words, split_camel_case, split_title,
    structural_normalize, TitleParts,
};
pub use quality::{detect_bitrate, detect_chapters, detect_format};
pub use types::{
    BonusModifier, FlagBonus, GateFailure, ModifierKind, RankedResult, RankingOptions,
    RequestContext, ScoreBreakdown, SelectionPolicy, DEFAULT_PRIORITY, MAX_PRIORITY,
};
