//! Text normalization and title/author parsing.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use super::locale::LocaleProfile;

static CAMEL_LOWER_UPPER: Lazy<Regex> = Lazy::new(|| Regex::new(r"([a-z])([A-Z])").unwrap());
static CAMEL_ACRONYM: Lazy<Regex> = Lazy::new(|| Regex::new(r"([A-Z]+)([A-Z][a-z])").unwrap());
static BRACKETED: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(([^)]*)\)|\[([^\]]*)\]").unwrap());
static AUTHOR_SEPARATORS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s*(?:,|&|;|\band\b)\s*").unwrap());

/// Author entries carrying one of these words are contributors, not authors.
const ROLE_WORDS: &[&str] = &[
    "translator",
    "translated",
    "narrator",
    "narrated",
    "editor",
    "edited",
    "foreword",
    "introduction",
    "illustrator",
    "illustrated",
    "contributor",
];

/// Separators retained by [`structural_normalize`].
const STRUCTURAL_SEPARATORS: &[char] = &['-', ':', '(', '[', ','];

/// Split CamelCase runs so `BrandonSanderson` compares like `Brandon Sanderson`.
pub fn split_camel_case(text: &str) -> String {
    let pass = CAMEL_LOWER_UPPER.replace_all(text, "$1 $2");
    CAMEL_ACRONYM.replace_all(&pass, "$1 $2").into_owned()
}

fn fold(text: &str, locale: &LocaleProfile) -> String {
    let lowered = split_camel_case(text).to_lowercase();
    locale
        .substitute(&lowered)
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .map(|c| if c == '\u{2019}' || c == '`' { '\'' } else { c })
        .collect()
}

/// Canonical comparison form: CamelCase split, lowercased, locale
/// substitutions applied, diacritics stripped, punctuation other than
/// apostrophes turned into spaces, whitespace collapsed.
pub fn normalize(text: &str, locale: &LocaleProfile) -> String {
    let folded: String = fold(text, locale)
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '\'' { c } else { ' ' })
        .collect();
    collapse_whitespace(&folded)
}

/// Like [`normalize`] but keeps title/author separators as standalone tokens.
///
/// Dashes between word characters are treated as part of a word and become
/// spaces; free-standing dashes (including en/em dashes) stay as `-`.
pub fn structural_normalize(text: &str, locale: &LocaleProfile) -> String {
    let chars: Vec<char> = fold(text, locale)
        .chars()
        .map(|c| match c {
            '\u{2013}' | '\u{2014}' => '-',
            other => other,
        })
        .collect();

    let mut out = String::with_capacity(chars.len() + 8);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_alphanumeric() || c == '\'' {
            out.push(c);
        } else if c == '-' && is_intra_word(&chars, i) {
            out.push(' ');
        } else if STRUCTURAL_SEPARATORS.contains(&c) {
            out.push(' ');
            out.push(c);
            out.push(' ');
        } else {
            out.push(' ');
        }
    }
    collapse_whitespace(&out)
}

fn is_intra_word(chars: &[char], i: usize) -> bool {
    let before = i.checked_sub(1).and_then(|p| chars.get(p));
    let after = chars.get(i + 1);
    matches!((before, after), (Some(b), Some(a)) if b.is_alphanumeric() && a.is_alphanumeric())
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Join runs of single-letter words: `j r r tolkien` becomes `jrr tolkien`.
pub fn collapse_initials(normalized: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut run = String::new();
    for word in normalized.split_whitespace() {
        if word.chars().count() == 1 {
            run.push_str(word);
            continue;
        }
        if !run.is_empty() {
            words.push(std::mem::take(&mut run));
        }
        words.push(word.to_string());
    }
    if !run.is_empty() {
        words.push(run);
    }
    words.join(" ")
}

/// A requested title split into the part every release must carry and
/// the parts releases commonly omit.
#[derive(Debug, Clone, PartialEq)]
pub struct TitleParts {
    pub full: String,
    pub required: String,
    pub optional: Vec<String>,
}

/// Split a requested title into required and optional parts.
///
/// Parenthesized or bracketed text, everything after the first colon, and
/// a trailing series label such as `Book 3` are optional.
pub fn split_title(title: &str, locale: &LocaleProfile) -> TitleParts {
    let mut optional = Vec::new();

    for caps in BRACKETED.captures_iter(title) {
        if let Some(inner) = caps.get(1).or_else(|| caps.get(2)) {
            let inner = inner.as_str().trim();
            if !inner.is_empty() {
                optional.push(inner.to_string());
            }
        }
    }
    let mut required = BRACKETED.replace_all(title, " ").into_owned();

    if let Some((head, tail)) = required.split_once(':') {
        let tail = tail.trim();
        if !tail.is_empty() {
            optional.push(tail.to_string());
        }
        required = head.to_string();
    }

    if let Some(re) = series_label_pattern(locale) {
        if let Some(m) = re.find(&required) {
            optional.push(m.as_str().trim_matches(|c: char| c == ',' || c.is_whitespace()).to_string());
            required.truncate(m.start());
        }
    }

    let required = collapse_whitespace(required.trim_matches(|c: char| c == ',' || c == '-' || c.is_whitespace()));
    let required = if required.is_empty() {
        collapse_whitespace(title)
    } else {
        required
    };

    TitleParts {
        full: collapse_whitespace(title),
        required,
        optional,
    }
}

fn series_label_pattern(locale: &LocaleProfile) -> Option<Regex> {
    if locale.label_prefixes.is_empty() {
        return None;
    }
    let labels: Vec<String> = locale
        .label_prefixes
        .iter()
        .map(|l| regex_lite::escape(l))
        .collect();
    Regex::new(&format!(
        r"(?i)[,\s-]+(?:{})\.?\s*\d+\s*$",
        labels.join("|")
    ))
    .ok()
}

/// Significant words of a title: normalized words minus stop words.
pub fn significant_words(title: &str, locale: &LocaleProfile) -> Vec<String> {
    normalize(title, locale)
        .split_whitespace()
        .filter(|w| !locale.is_stop_word(w))
        .map(str::to_string)
        .collect()
}

/// Parse a raw author field into individual author names.
///
/// Splits on commas, ampersands, semicolons, and the word "and"; drops
/// contributor entries such as translators and narrators.
pub fn parse_authors(raw: &str) -> Vec<String> {
    let mut authors = Vec::new();
    for piece in AUTHOR_SEPARATORS.split(raw) {
        for name in piece.split(" - ") {
            if is_role_entry(name) {
                continue;
            }
            let name = collapse_whitespace(&BRACKETED.replace_all(name, " "));
            if !name.is_empty() {
                authors.push(name);
            }
        }
    }
    authors
}

fn is_role_entry(piece: &str) -> bool {
    let lowered = piece.to_lowercase();
    lowered
        .split(|c: char| !c.is_alphanumeric())
        .any(|w| ROLE_WORDS.contains(&w))
}

/// Byte offsets of whole-word occurrences of `needle` in `haystack`.
///
/// Both inputs are expected in normalized, space-separated form.
pub fn find_whole_word(haystack: &str, needle: &str) -> Vec<usize> {
    if needle.is_empty() {
        return Vec::new();
    }
    let bytes = haystack.as_bytes();
    haystack
        .match_indices(needle)
        .map(|(start, _)| start)
        .filter(|&start| {
            let end = start + needle.len();
            let before_ok = start == 0 || bytes[start - 1] == b' ';
            let after_ok = end == bytes.len() || bytes[end] == b' ';
            before_ok && after_ok
        })
        .collect()
}

pub fn contains_whole_word(haystack: &str, needle: &str) -> bool {
    !find_whole_word(haystack, needle).is_empty()
}
