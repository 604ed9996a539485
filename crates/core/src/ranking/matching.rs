//! Title and author matching with rejection gates.

use rapidfuzz::distance::levenshtein;
use std::collections::HashSet;

use super::locale::LocaleProfile;
use super::normalize::{
    collapse_initials, contains_whole_word, find_whole_word, normalize, parse_authors,
    significant_words, split_title, structural_normalize, TitleParts,
};
use super::types::GateFailure;

pub const TITLE_MAX: f64 = 45.0;
pub const AUTHOR_MAX: f64 = 15.0;

/// Minimum similarity for a fuzzy author hit in the author gate.
const AUTHOR_FUZZY_THRESHOLD: f64 = 0.85;

/// Maximum characters between an author's first and last name.
const NAME_PROXIMITY_CHARS: usize = 30;

/// Separator tokens emitted by structural normalization.
const SEPARATOR_TOKENS: &[char] = &['-', ':', '(', '[', ','];

/// Separators that may precede a complete title. Dashes are already folded to `-`.
const PREFIX_SEPARATORS: &[char] = &['-', ':'];

/// Normalized similarity in `0.0..=1.0`.
pub fn similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    levenshtein::normalized_similarity(a.chars(), b.chars())
}

/// Best similarity of `needle` against equally long word windows of `haystack`.
pub fn best_window_similarity(needle: &str, haystack: &str) -> f64 {
    let needle_len = needle.split_whitespace().count();
    let words: Vec<&str> = haystack.split_whitespace().collect();
    if needle_len == 0 || words.is_empty() {
        return 0.0;
    }
    if words.len() <= needle_len {
        return similarity(needle, haystack);
    }
    words
        .windows(needle_len)
        .map(|w| similarity(needle, &w.join(" ")))
        .fold(0.0, f64::max)
}

/// Request fields prepared once per ranking call.
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub title: TitleParts,
    pub full_title: String,
    pub required_title: String,
    /// Significant words of the required title that each release must carry.
    /// Empty when the title is all stop words, which disables the coverage gate.
    pub significant_words: Vec<String>,
    /// Normalized author names.
    pub authors: Vec<String>,
}

impl PreparedRequest {
    pub fn new(title: &str, author: &str, locale: &LocaleProfile) -> Self {
        let parts = split_title(title, locale);
        let required_title = normalize(&parts.required, locale);
        let words = significant_words(&parts.required, locale);

        let mut seen = HashSet::new();
        let authors = parse_authors(author)
            .iter()
            .map(|a| normalize(a, locale))
            .filter(|a| !a.is_empty() && seen.insert(a.clone()))
            .collect();

        Self {
            full_title: normalize(&parts.full, locale),
            required_title,
            title: parts,
            significant_words: words,
            authors,
        }
    }
}

/// A candidate title in the forms matching works on.
#[derive(Debug, Clone)]
pub struct CandidateText {
    pub normalized: String,
    pub structural: String,
    words: HashSet<String>,
}

impl CandidateText {
    pub fn new(title: &str, locale: &LocaleProfile) -> Self {
        let normalized = normalize(title, locale);
        let words = normalized.split_whitespace().map(str::to_string).collect();
        Self {
            structural: structural_normalize(title, locale),
            normalized,
            words,
        }
    }

    pub fn has_word(&self, word: &str) -> bool {
        self.words.contains(word)
    }
}

/// Outcome of title/author matching for one candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchOutcome {
    pub title_score: f64,
    pub author_score: f64,
    pub complete_title: bool,
    pub exact_authors: usize,
    pub words_found: usize,
    pub gate_failure: Option<GateFailure>,
}

impl MatchOutcome {
    /// Match points; zero when a gate failed.
    pub fn score(&self) -> f64 {
        if self.gate_failure.is_some() {
            0.0
        } else {
            self.title_score + self.author_score
        }
    }
}

/// Match a candidate against the request.
pub fn match_candidate(
    request: &PreparedRequest,
    candidate: &CandidateText,
    coverage_threshold: f64,
    require_author: bool,
) -> MatchOutcome {
    let words_found = request
        .significant_words
        .iter()
        .filter(|w| candidate.has_word(w))
        .count();
    let total = request.significant_words.len();

    let mut gate_failure = None;
    if total > 0 && (words_found as f64 / total as f64) < coverage_threshold {
        gate_failure = Some(GateFailure::WordCoverage {
            found: words_found,
            required: total,
        });
    } else if require_author
        && !request.authors.is_empty()
        && !request.authors.iter().any(|a| author_present(a, candidate))
    {
        gate_failure = Some(GateFailure::AuthorMissing);
    }

    let complete_title = [&request.required_title, &request.full_title]
        .iter()
        .any(|needle| is_complete_title_match(needle, &candidate.structural, &request.authors));
    let title_score = if complete_title {
        TITLE_MAX
    } else {
        fuzzy_title_similarity(request, candidate) * TITLE_MAX
    };

    let exact_authors = request
        .authors
        .iter()
        .filter(|a| author_exact(a, candidate))
        .count();
    let author_score = if request.authors.is_empty() {
        0.0
    } else if exact_authors > 0 {
        AUTHOR_MAX * exact_authors as f64 / request.authors.len() as f64
    } else {
        best_window_similarity(&request.authors.join(" "), &candidate.normalized) * AUTHOR_MAX
    };

    MatchOutcome {
        title_score,
        author_score,
        complete_title,
        exact_authors,
        words_found,
        gate_failure,
    }
}

fn author_exact(author: &str, candidate: &CandidateText) -> bool {
    contains_whole_word(&candidate.normalized, author)
        || contains_whole_word(
            &collapse_initials(&candidate.normalized),
            &collapse_initials(author),
        )
}

/// Whether an author is named in the candidate: exact, fuzzy, or by first
/// and last name close together.
pub fn author_present(author: &str, candidate: &CandidateText) -> bool {
    if author_exact(author, candidate) {
        return true;
    }
    if best_window_similarity(author, &candidate.normalized) >= AUTHOR_FUZZY_THRESHOLD {
        return true;
    }
    let names: Vec<&str> = author.split_whitespace().collect();
    match (names.first(), names.last()) {
        (Some(first), Some(last)) if names.len() >= 2 => {
            names_within(&candidate.normalized, first, last, NAME_PROXIMITY_CHARS)
        }
        _ => false,
    }
}

fn names_within(haystack: &str, first: &str, last: &str, max_gap: usize) -> bool {
    let firsts = find_whole_word(haystack, first);
    let lasts = find_whole_word(haystack, last);
    firsts.iter().any(|&f| {
        lasts.iter().any(|&l| {
            if f == l {
                return false;
            }
            let gap = if f < l {
                l.saturating_sub(f + first.len())
            } else {
                f.saturating_sub(l + last.len())
            };
            gap <= max_gap
        })
    })
}

/// Whether `needle` appears in the structural title as the whole title.
///
/// The text before it must be empty, end with a dash or colon, or end with
/// an author name. The text after it must be empty, start with a separator,
/// start with "by", or start with an author name.
pub fn is_complete_title_match(needle: &str, structural: &str, authors: &[String]) -> bool {
    if needle.is_empty() {
        return false;
    }
    find_whole_word(structural, needle).into_iter().any(|start| {
        let before = structural[..start].trim_end();
        let after = structural[start + needle.len()..].trim_start();
        prefix_ok(before, authors) && suffix_ok(after, authors)
    })
}

fn prefix_ok(before: &str, authors: &[String]) -> bool {
    before.is_empty()
        || before.ends_with(PREFIX_SEPARATORS)
        || authors
            .iter()
            .any(|a| before == a || before.ends_with(&format!(" {}", a)))
}

fn suffix_ok(after: &str, authors: &[String]) -> bool {
    after.is_empty()
        || after.starts_with(SEPARATOR_TOKENS)
        || after == "by"
        || after.starts_with("by ")
        || authors
            .iter()
            .any(|a| after == a || after.starts_with(&format!("{} ", a)))
}

/// Best fuzzy similarity of the requested title against the candidate as a
/// whole and against each separator-delimited segment.
fn fuzzy_title_similarity(request: &PreparedRequest, candidate: &CandidateText) -> f64 {
    let segments = candidate
        .structural
        .split(SEPARATOR_TOKENS)
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let comparisons: Vec<&str> = std::iter::once(candidate.normalized.as_str())
        .chain(segments)
        .collect();

    [&request.full_title, &request.required_title]
        .iter()
        .filter(|needle| !needle.is_empty())
        .flat_map(|needle| comparisons.iter().map(move |c| similarity(needle, c)))
        .fold(0.0, f64::max)
}
