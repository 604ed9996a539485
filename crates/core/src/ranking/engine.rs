//! Candidate scoring and ordering.

use std::cmp::Ordering;

use crate::searcher::{CandidateResult, ContentType};

use super::matching::{match_candidate, CandidateText, MatchOutcome, PreparedRequest};
use super::normalize::{contains_whole_word, normalize};
use super::quality::{
    audio_format_score, audio_size_score, availability_score, detect_bitrate, detect_chapters,
    detect_format, text_format_score, text_size_score,
};
use super::types::{
    normalize_flag, BonusModifier, GateFailure, ModifierKind, RankedResult, RankingOptions,
    RequestContext, ScoreBreakdown, DEFAULT_PRIORITY, MAX_PRIORITY,
};

/// Score and order candidates for a request.
///
/// Results are sorted by final score, highest first; ties go to the more
/// recently published release, and candidates without a publish date sort
/// after dated ones. The sort is stable. Ranks are 1-based.
pub fn rank(
    candidates: &[CandidateResult],
    context: &RequestContext,
    options: &RankingOptions,
) -> Vec<RankedResult> {
    let request = PreparedRequest::new(&context.title, &context.author, &options.locale);

    let mut results: Vec<RankedResult> = candidates
        .iter()
        .map(|candidate| score_candidate(candidate, &request, context, options))
        .collect();

    results.sort_by(compare_results);
    for (i, result) in results.iter_mut().enumerate() {
        result.rank = i + 1;
    }
    results
}

fn compare_results(a: &RankedResult, b: &RankedResult) -> Ordering {
    b.final_score
        .partial_cmp(&a.final_score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| match (a.candidate.publish_date, b.candidate.publish_date) {
            (Some(da), Some(db)) => db.cmp(&da),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
}

/// Score one candidate; `rank` is left at 0.
pub fn score_candidate(
    candidate: &CandidateResult,
    request: &PreparedRequest,
    context: &RequestContext,
    options: &RankingOptions,
) -> RankedResult {
    let locale = &options.locale;
    let text = CandidateText::new(&candidate.title, locale);
    let mut notes = Vec::new();

    let format = detect_format(candidate, &text.normalized, options.content_type);
    let (format_score, format_note) = match options.content_type {
        ContentType::Audio => {
            audio_format_score(format.as_deref(), detect_chapters(candidate, &text.normalized))
        }
        ContentType::Text => {
            let wanted = context
                .preferred_format
                .as_deref()
                .unwrap_or(options.default_text_format.as_str());
            text_format_score(format.as_deref(), wanted)
        }
    };
    notes.push(format_note);
    if options.content_type == ContentType::Audio {
        if let Some(bitrate) = detect_bitrate(candidate) {
            notes.push(bitrate);
        }
    }

    let (size_score, size_note) = match options.content_type {
        ContentType::Audio => audio_size_score(
            candidate.size_mb(),
            context.runtime_minutes,
            options.audio_quality_mb_per_min,
        ),
        ContentType::Text => text_size_score(candidate.size_mb(), options.text_max_size_mb),
    };
    notes.push(size_note);

    let (availability_score, availability_note) = availability_score(candidate);
    notes.push(availability_note);

    let outcome = match_candidate(
        request,
        &text,
        options.word_coverage_threshold,
        options.require_author,
    );
    notes.push(match_note(&outcome));

    if let Some(narrator) = context.narrator.as_deref() {
        let narrator = normalize(narrator, locale);
        if !narrator.is_empty() && contains_whole_word(&text.normalized, &narrator) {
            notes.push("narrator named".to_string());
        }
    }

    let base_score = if outcome.gate_failure.is_some() {
        0.0
    } else {
        sanitize(format_score + size_score + availability_score + outcome.score())
    };

    let bonus_modifiers = bonus_modifiers(candidate, base_score, options);
    let bonus_points: f64 = bonus_modifiers.iter().map(|m| m.points).sum();
    let final_score = sanitize(base_score + bonus_points);
    notes.push(overall_note(base_score).to_string());

    RankedResult {
        candidate: candidate.clone(),
        base_score,
        bonus_modifiers,
        bonus_points,
        final_score,
        rank: 0,
        breakdown: ScoreBreakdown {
            format_score,
            size_score,
            availability_score,
            match_score: outcome.score(),
            title_score: outcome.title_score,
            author_score: outcome.author_score,
            gate_failure: outcome.gate_failure,
            notes,
        },
    }
}

/// Priority bonus plus one modifier per distinct matching flag.
fn bonus_modifiers(
    candidate: &CandidateResult,
    base_score: f64,
    options: &RankingOptions,
) -> Vec<BonusModifier> {
    let priority = candidate
        .indexer_priority
        .unwrap_or(DEFAULT_PRIORITY)
        .clamp(1, MAX_PRIORITY);
    let fraction = priority as f64 / MAX_PRIORITY as f64;
    let mut modifiers = vec![BonusModifier {
        kind: ModifierKind::Priority,
        name: format!("priority {}", priority),
        fraction,
        points: base_score * fraction,
    }];

    let mut seen: Vec<String> = Vec::new();
    for flag in &candidate.flags {
        let flag = normalize_flag(flag);
        if flag.is_empty() || seen.contains(&flag) {
            continue;
        }
        if let Some(bonus) = options.flag_bonuses.iter().find(|b| b.matches(&flag)) {
            let fraction = bonus.percent / 100.0;
            modifiers.push(BonusModifier {
                kind: ModifierKind::Flag,
                name: bonus.name.clone(),
                fraction,
                points: base_score * fraction,
            });
        }
        seen.push(flag);
    }

    modifiers
}

fn sanitize(score: f64) -> f64 {
    if score.is_finite() {
        score
    } else {
        0.0
    }
}

fn match_note(outcome: &MatchOutcome) -> String {
    match &outcome.gate_failure {
        Some(GateFailure::WordCoverage { found, required }) => {
            format!("rejected: {}/{} title words present", found, required)
        }
        Some(GateFailure::AuthorMissing) => "rejected: author not found".to_string(),
        None => {
            let quality = match outcome.score() {
                s if s >= 55.0 => "excellent match",
                s if s >= 40.0 => "good match",
                s if s >= 25.0 => "partial match",
                _ => "weak match",
            };
            if outcome.complete_title {
                format!("{} (complete title)", quality)
            } else {
                quality.to_string()
            }
        }
    }
}

fn overall_note(base_score: f64) -> &'static str {
    match base_score {
        s if s >= 80.0 => "excellent candidate",
        s if s >= 60.0 => "good candidate",
        s if s >= 50.0 => "acceptable candidate",
        _ => "poor candidate",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranking::FlagBonus;
    use crate::testing::fixtures;
    use chrono::{TimeZone, Utc};

    const MB: u64 = 1024 * 1024;

    fn mistborn() -> CandidateResult {
        let mut c = fixtures::candidate("Mistborn - Brandon Sanderson - [M4B]", 1, "mistborn");
        c.size_bytes = 600 * MB;
        c.seeders = Some(40);
        c.indexer_priority = Some(10);
        c
    }

    fn context() -> RequestContext {
        RequestContext {
            runtime_minutes: Some(720),
            ..RequestContext::new("Mistborn", "Brandon Sanderson")
        }
    }

    #[test]
    fn test_strong_audio_match() {
        let ranked = rank(&[mistborn()], &context(), &RankingOptions::audio());
        let r = &ranked[0];
        assert_eq!(r.rank, 1);
        assert_eq!(r.breakdown.match_score, 60.0);
        assert_eq!(r.breakdown.format_score, 9.0);
        assert!((r.breakdown.size_score - 12.5).abs() < 1e-9);
        assert!(r.base_score >= 90.0);
        assert!((r.final_score - r.base_score * 1.4).abs() < 1e-9);
        assert!(r.breakdown.notes.iter().any(|n| n == "excellent candidate"));
    }

    #[test]
    fn test_author_mismatch_scores_zero() {
        let mut c = fixtures::candidate("The Other Book - John Smith", 1, "other");
        c.seeders = Some(100);
        let ranked = rank(&[c], &RequestContext::new("The Other Book", "Jane Doe"), &RankingOptions::audio());
        assert_eq!(ranked[0].base_score, 0.0);
        assert_eq!(ranked[0].final_score, 0.0);
        assert_eq!(ranked[0].breakdown.gate_failure, Some(GateFailure::AuthorMissing));
    }

    #[test]
    fn test_disabling_author_requirement_never_lifts_coverage_gate() {
        let c = fixtures::candidate("Words of Radiance - Brandon Sanderson", 1, "w");
        let ctx = RequestContext::new("The Way of Kings", "Brandon Sanderson");
        let strict = rank(&[c.clone()], &ctx, &RankingOptions::audio());
        let relaxed = rank(&[c], &ctx, &RankingOptions::audio().with_require_author(false));
        assert_eq!(strict[0].base_score, 0.0);
        assert_eq!(relaxed[0].base_score, 0.0);
    }

    #[test]
    fn test_ties_break_on_publish_date() {
        let mut older = fixtures::candidate("Tie - Author Name", 1, "old");
        older.publish_date = Some(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap());
        let mut newer = fixtures::candidate("Tie - Author Name", 1, "new");
        newer.publish_date = Some(Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap());
        let undated = fixtures::candidate("Tie - Author Name", 1, "undated");

        let ranked = rank(
            &[undated, older, newer],
            &RequestContext::new("Tie", "Author Name"),
            &RankingOptions::audio(),
        );
        assert_eq!(ranked[0].final_score, ranked[1].final_score);
        let guids: Vec<_> = ranked.iter().map(|r| r.candidate.guid.as_str()).collect();
        assert_eq!(guids, vec!["new", "old", "undated"]);
        let ranks: Vec<_> = ranked.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
    }

    #[test]
    fn test_priority_bonus() {
        let mut max = mistborn();
        max.indexer_priority = Some(25);
        let mut none = mistborn();
        none.indexer_priority = None;
        let mut over = mistborn();
        over.indexer_priority = Some(200);

        let options = RankingOptions::audio();
        let request = PreparedRequest::new("Mistborn", "Brandon Sanderson", &options.locale);
        let max = score_candidate(&max, &request, &context(), &options);
        let none = score_candidate(&none, &request, &context(), &options);
        let over = score_candidate(&over, &request, &context(), &options);

        assert!((max.final_score - max.base_score * 2.0).abs() < 1e-9);
        assert!((none.final_score - none.base_score * 1.4).abs() < 1e-9);
        assert_eq!(over.final_score, max.final_score);
    }

    #[test]
    fn test_flag_bonuses_apply_once_per_flag() {
        let mut c = mistborn();
        c.flags = vec!["FreeLeech".into(), " freeleech ".into(), "Internal".into()];
        let options = RankingOptions::audio().with_flag_bonuses(vec![
            FlagBonus::new("freeleech", 20.0),
            FlagBonus::new("internal", -10.0),
        ]);
        let r = &rank(&[c], &context(), &options)[0];

        assert_eq!(r.bonus_modifiers.len(), 3);
        let expected = r.base_score * (0.4 + 0.2 - 0.1);
        assert!((r.bonus_points - expected).abs() < 1e-9);
        assert!((r.final_score - (r.base_score + expected)).abs() < 1e-9);
    }

    #[test]
    fn test_gated_candidate_gets_no_bonus() {
        let mut c = fixtures::candidate("Unrelated - Someone Else", 1, "u");
        c.flags = vec!["freeleech".into()];
        c.indexer_priority = Some(25);
        let options = RankingOptions::audio().with_flag_bonuses(vec![FlagBonus::new("freeleech", 50.0)]);
        let r = &rank(&[c], &context(), &options)[0];
        assert_eq!(r.base_score, 0.0);
        assert_eq!(r.bonus_points, 0.0);
        assert_eq!(r.final_score, 0.0);
    }

    #[test]
    fn test_text_ranking_prefers_requested_format() {
        let mut epub = fixtures::candidate("Dune - Frank Herbert (epub)", 1, "e");
        epub.size_bytes = 2 * MB;
        let mut pdf = fixtures::candidate("Dune - Frank Herbert (pdf)", 1, "p");
        pdf.size_bytes = 2 * MB;

        let ranked = rank(&[pdf, epub], &RequestContext::new("Dune", "Frank Herbert"), &RankingOptions::text());
        assert_eq!(ranked[0].candidate.guid, "e");
        assert_eq!(ranked[0].breakdown.format_score, 10.0);
        assert_eq!(ranked[1].breakdown.format_score, 0.0);
        assert_eq!(ranked[0].breakdown.size_score, 15.0);
    }

    #[test]
    fn test_runtime_unknown_scores_no_size() {
        let ctx = RequestContext::new("Mistborn", "Brandon Sanderson");
        let r = &rank(&[mistborn()], &ctx, &RankingOptions::audio())[0];
        assert_eq!(r.breakdown.size_score, 0.0);
    }

    #[test]
    fn test_rank_empty() {
        assert!(rank(&[], &context(), &RankingOptions::audio()).is_empty());
    }

    #[test]
    fn test_scores_stay_in_bounds() {
        let mut c = mistborn();
        c.seeders = Some(u32::MAX);
        c.size_bytes = u64::MAX;
        c.has_chapters = Some(true);
        let r = &rank(&[c], &context(), &RankingOptions::audio())[0];
        assert!(r.base_score <= 100.0);
        assert!(r.breakdown.format_score <= 10.0);
        assert!(r.breakdown.size_score <= 15.0);
        assert!(r.breakdown.availability_score <= 15.0);
    }
}
