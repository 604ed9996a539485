//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Request searches (outcomes, candidates, best scores)
//! - Indexer group searches (failures)
//! - Outbound request resilience (retries, pacer cooldowns)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Request searches
// =============================================================================

/// Search attempts total by outcome.
pub static SEARCH_ATTEMPTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("rmab_search_attempts_total", "Total request search attempts"),
        &["content_type", "outcome"], // outcome: "handed_off", "awaiting_search", "failed"
    )
    .unwrap()
});

/// Candidates surviving the size pre-filter per search.
pub static CANDIDATES_FOUND: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "rmab_candidates_found",
            "Number of candidates found per search after size filtering",
        )
        .buckets(vec![0.0, 1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0]),
        &["content_type"],
    )
    .unwrap()
});

/// Final score of the top-ranked candidate.
pub static BEST_FINAL_SCORE: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "rmab_best_final_score",
            "Distribution of the top-ranked candidate's final score",
        )
        .buckets(vec![0.0, 25.0, 50.0, 75.0, 100.0, 125.0, 150.0, 200.0]),
        &["content_type"],
    )
    .unwrap()
});

// =============================================================================
// Indexer groups
// =============================================================================

/// Indexer group searches that failed and were skipped.
pub static GROUP_FAILURES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "rmab_indexer_group_failures_total",
        "Indexer group searches that failed after retries",
    )
    .unwrap()
});

// =============================================================================
// Resilience
// =============================================================================

/// Retries issued by the fetch layer.
pub static FETCH_RETRIES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("rmab_fetch_retries_total", "Retries issued for outbound fetches").unwrap()
});

/// Circuit-breaker cooldowns recommended by the pacer.
pub static PACER_COOLDOWNS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "rmab_pacer_cooldowns_total",
        "Cooldowns triggered by sustained retry pressure",
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(SEARCH_ATTEMPTS.clone()),
        Box::new(CANDIDATES_FOUND.clone()),
        Box::new(BEST_FINAL_SCORE.clone()),
        Box::new(GROUP_FAILURES.clone()),
        Box::new(FETCH_RETRIES.clone()),
        Box::new(PACER_COOLDOWNS.clone()),
    ]
}
