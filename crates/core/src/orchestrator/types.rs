//! Types for the search orchestrator.

use serde::Serialize;
use thiserror::Error;

use crate::searcher::{CandidateResult, IndexerGroup, SkippedIndexer};

/// Orchestrator-level failures. Both are configuration problems and fatal
/// for the request; group and candidate failures never surface here.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// No sources are enabled at all.
    #[error("no search sources configured")]
    NoSourcesConfigured,

    /// Every enabled source lacks categories for the content type.
    #[error("no usable search sources: {} indexer(s) have no categories", skipped.len())]
    NoUsableSources { skipped: Vec<SkippedIndexer> },
}

/// A group query that failed after retries and was skipped.
#[derive(Debug, Clone, Serialize)]
pub struct GroupFailure {
    pub group: IndexerGroup,
    pub error: String,
}

/// Where the candidates of a search came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateOrigin {
    #[default]
    Indexers,
    Archive,
}

/// Aggregated, filtered candidates for one request.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchOutcome {
    /// Deduplicated candidates that survived the size pre-filter.
    pub candidates: Vec<CandidateResult>,
    pub origin: CandidateOrigin,
    /// Number of group queries issued.
    pub groups_searched: usize,
    pub group_failures: Vec<GroupFailure>,
    pub skipped_indexers: Vec<SkippedIndexer>,
    /// Candidates removed as duplicates.
    pub duplicates_removed: usize,
    /// Candidates removed by the size pre-filter.
    pub filtered_out: usize,
    /// Runtime used for audio size scoring, from the request or a lookup.
    pub runtime_minutes: Option<u32>,
}

impl SearchOutcome {
    /// No candidates remain. A normal, retry-eligible outcome.
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Every group query that was issued failed.
    pub fn all_groups_failed(&self) -> bool {
        self.groups_searched > 0 && self.group_failures.len() == self.groups_searched
    }
}
