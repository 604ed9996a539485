//! Format, size, and availability dimensions.

use once_cell::sync::Lazy;
use regex_lite::Regex;

use crate::searcher::{CandidateResult, ContentType};

static BITRATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(\d{2,3})\s*kbps\b").unwrap());

const AUDIO_FORMATS: &[&str] = &["m4b", "flac", "mp3", "m4a", "aac", "opus", "ogg", "wma"];
const TEXT_FORMATS: &[&str] = &["epub", "pdf", "mobi", "azw3", "azw", "djvu", "fb2", "cbz", "txt"];
const CHAPTER_MARKERS: &[&str] = &["chapterized", "chaptered", "chapters"];

pub const FORMAT_MAX: f64 = 10.0;
pub const SIZE_MAX: f64 = 15.0;
pub const AVAILABILITY_MAX: f64 = 15.0;

/// Seeder curve steepness: `log10(seeders + 1) * SEEDER_SCALE`.
const SEEDER_SCALE: f64 = 6.0;

/// Text size bands in MB and their scores, checked in order.
const TEXT_SIZE_BANDS: &[(f64, f64)] = &[(5.0, 15.0), (10.0, 10.0)];
const TEXT_SIZE_WITHIN_BOUND: f64 = 5.0;
const TEXT_SIZE_OVER_BOUND: f64 = 2.0;

/// Format tag of a candidate, from its metadata or its title.
pub fn detect_format(candidate: &CandidateResult, normalized_title: &str, content_type: ContentType) -> Option<String> {
    if let Some(format) = candidate.format.as_deref() {
        let format = format.trim().trim_start_matches('.').to_lowercase();
        if !format.is_empty() {
            return Some(format);
        }
    }
    let known = match content_type {
        ContentType::Audio => AUDIO_FORMATS,
        ContentType::Text => TEXT_FORMATS,
    };
    let words: Vec<&str> = normalized_title.split_whitespace().collect();
    known
        .iter()
        .find(|f| words.contains(*f))
        .map(|f| f.to_string())
}

/// Chapter information from metadata, falling back to title markers.
pub fn detect_chapters(candidate: &CandidateResult, normalized_title: &str) -> Option<bool> {
    candidate.has_chapters.or_else(|| {
        normalized_title
            .split_whitespace()
            .any(|w| CHAPTER_MARKERS.contains(&w))
            .then_some(true)
    })
}

/// Bitrate from metadata or a `NNN kbps` title marker.
pub fn detect_bitrate(candidate: &CandidateResult) -> Option<String> {
    candidate.bitrate.clone().or_else(|| {
        BITRATE
            .captures(&candidate.title)
            .and_then(|c| c.get(1))
            .map(|m| format!("{}kbps", m.as_str()))
    })
}

/// Audio format tier, best first.
pub fn audio_format_score(format: Option<&str>, chapters: Option<bool>) -> (f64, String) {
    match format {
        Some("m4b") if chapters == Some(true) => (10.0, "M4B with chapters".to_string()),
        Some("m4b") => (9.0, "M4B".to_string()),
        Some("flac") => (7.0, "lossless FLAC".to_string()),
        Some("mp3") => (5.0, "MP3".to_string()),
        Some(f @ ("m4a" | "aac" | "opus" | "ogg" | "wma")) => {
            (3.0, format!("compressed {}", f.to_uppercase()))
        }
        Some(other) => (1.0, format!("unrecognized format {}", other)),
        None => (1.0, "format unknown".to_string()),
    }
}

/// Text format: full points only for the requested format.
pub fn text_format_score(format: Option<&str>, wanted: &str) -> (f64, String) {
    let wanted = wanted.trim().to_lowercase();
    match format {
        Some(f) if f == wanted => (FORMAT_MAX, format!("{} (requested)", f.to_uppercase())),
        Some(f) => (0.0, format!("{} (wanted {})", f.to_uppercase(), wanted)),
        None => (0.0, "format unknown".to_string()),
    }
}

/// Audio size relative to runtime. Unknown runtime scores zero.
pub fn audio_size_score(size_mb: f64, runtime_minutes: Option<u32>, full_mb_per_min: f64) -> (f64, String) {
    let Some(runtime) = runtime_minutes.filter(|m| *m > 0) else {
        return (0.0, "runtime unknown, size not scored".to_string());
    };
    if size_mb <= 0.0 || full_mb_per_min <= 0.0 {
        return (0.0, "size unknown".to_string());
    }

    let mb_per_min = size_mb / runtime as f64;
    let score = (mb_per_min / full_mb_per_min).min(1.0) * SIZE_MAX;
    let label = if score >= SIZE_MAX {
        "high bitrate"
    } else if score >= 10.0 {
        "good bitrate"
    } else if score >= 5.0 {
        "low bitrate"
    } else {
        "very low bitrate"
    };
    (score, format!("{} ({:.2} MB/min)", label, mb_per_min))
}

/// Text size in bands; smaller files score higher.
pub fn text_size_score(size_mb: f64, max_size_mb: u64) -> (f64, String) {
    let score = TEXT_SIZE_BANDS
        .iter()
        .find(|(limit, _)| size_mb <= *limit)
        .map(|(_, score)| *score)
        .unwrap_or(if size_mb <= max_size_mb as f64 {
            TEXT_SIZE_WITHIN_BOUND
        } else {
            TEXT_SIZE_OVER_BOUND
        });
    (score, format!("{:.1} MB", size_mb))
}

/// Seeder-based availability; centralized sources always get full points.
pub fn availability_score(candidate: &CandidateResult) -> (f64, String) {
    if candidate.is_centralized() {
        return (AVAILABILITY_MAX, "centralized source, always available".to_string());
    }
    let seeders = candidate.seeders.unwrap_or(0);
    if seeders == 0 {
        return (0.0, "dead (0 seeders)".to_string());
    }

    let score = ((seeders as f64 + 1.0).log10() * SEEDER_SCALE).min(AVAILABILITY_MAX);
    let note = if score >= 12.0 {
        format!("well seeded ({})", seeders)
    } else if score >= 6.0 {
        format!("{} seeders", seeders)
    } else {
        format!("low seeders ({})", seeders)
    };
    (score, note)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[test]
    fn test_detect_format_prefers_metadata() {
        let mut c = fixtures::candidate("Book [MP3]", 1, "g");
        c.format = Some(".M4B".to_string());
        assert_eq!(detect_format(&c, "book mp3", ContentType::Audio).as_deref(), Some("m4b"));
    }

    #[test]
    fn test_detect_format_from_title() {
        let c = fixtures::candidate("Book", 1, "g");
        assert_eq!(detect_format(&c, "book flac", ContentType::Audio).as_deref(), Some("flac"));
        assert_eq!(detect_format(&c, "book epub", ContentType::Text).as_deref(), Some("epub"));
        assert_eq!(detect_format(&c, "book epub", ContentType::Audio), None);
        assert_eq!(detect_format(&c, "book", ContentType::Audio), None);
    }

    #[test]
    fn test_detect_chapters() {
        let c = fixtures::candidate("Book", 1, "g");
        assert_eq!(detect_chapters(&c, "book m4b chapterized"), Some(true));
        assert_eq!(detect_chapters(&c, "book m4b"), None);

        let mut explicit = fixtures::candidate("Book", 1, "g");
        explicit.has_chapters = Some(false);
        assert_eq!(detect_chapters(&explicit, "book chapters"), Some(false));
    }

    #[test]
    fn test_detect_bitrate() {
        let c = fixtures::candidate("Book [MP3 64 kbps]", 1, "g");
        assert_eq!(detect_bitrate(&c).as_deref(), Some("64kbps"));
        assert_eq!(detect_bitrate(&fixtures::candidate("Book", 1, "g")), None);
    }

    #[test]
    fn test_audio_format_tiers() {
        assert_eq!(audio_format_score(Some("m4b"), Some(true)).0, 10.0);
        assert_eq!(audio_format_score(Some("m4b"), None).0, 9.0);
        assert_eq!(audio_format_score(Some("m4b"), Some(false)).0, 9.0);
        assert_eq!(audio_format_score(Some("flac"), None).0, 7.0);
        assert_eq!(audio_format_score(Some("mp3"), None).0, 5.0);
        assert_eq!(audio_format_score(Some("opus"), None).0, 3.0);
        assert_eq!(audio_format_score(None, None).0, 1.0);
    }

    #[test]
    fn test_text_format_exact_match_only() {
        assert_eq!(text_format_score(Some("epub"), "EPUB").0, 10.0);
        assert_eq!(text_format_score(Some("pdf"), "epub").0, 0.0);
        assert_eq!(text_format_score(None, "epub").0, 0.0);
    }

    #[test]
    fn test_audio_size_score() {
        let (score, _) = audio_size_score(600.0, Some(720), 1.0);
        assert!((score - 12.5).abs() < 1e-9);
        assert_eq!(audio_size_score(2000.0, Some(720), 1.0).0, 15.0);
        assert_eq!(audio_size_score(600.0, None, 1.0).0, 0.0);
        assert_eq!(audio_size_score(600.0, Some(0), 1.0).0, 0.0);
    }

    #[test]
    fn test_text_size_bands() {
        assert_eq!(text_size_score(2.0, 20).0, 15.0);
        assert_eq!(text_size_score(7.5, 20).0, 10.0);
        assert_eq!(text_size_score(15.0, 20).0, 5.0);
        assert_eq!(text_size_score(35.0, 20).0, 2.0);
    }

    #[test]
    fn test_availability_score() {
        let mut c = fixtures::candidate("Book", 1, "g");
        c.seeders = Some(40);
        let (score, note) = availability_score(&c);
        assert!((score - 41f64.log10() * 6.0).abs() < 1e-9);
        assert!(note.contains("40"));

        c.seeders = Some(10_000);
        assert_eq!(availability_score(&c).0, 15.0);

        c.seeders = Some(0);
        assert_eq!(availability_score(&c).0, 0.0);

        c.seeders = None;
        assert_eq!(availability_score(&c).0, 15.0);
    }

    #[test]
    fn test_availability_is_monotonic() {
        let mut previous = -1.0;
        for seeders in [0u32, 1, 2, 5, 10, 50, 100, 500, 1000] {
            let mut c = fixtures::candidate("Book", 1, "g");
            c.seeders = Some(seeders);
            let (score, _) = availability_score(&c);
            assert!(score >= previous);
            previous = score;
        }
    }
}
