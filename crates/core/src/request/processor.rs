//! Search-and-rank entry point driving the request state machine.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{FlagBonusProvider, RankingConfig};
use crate::metrics;
use crate::orchestrator::{GroupFailure, SearchOrchestrator, SearchOutcome};
use crate::ranking::{rank, RankedResult, RankingOptions, RequestContext, SelectionPolicy};
use crate::searcher::{ContentType, SkippedIndexer};

use super::dispatch::DownloadDispatcher;
use super::store::RequestStore;
use super::types::{RequestError, RequestStatus, SelectedCandidate};

/// Result of one search attempt.
#[derive(Debug, Clone, Serialize)]
pub struct SearchReport {
    pub request_id: String,
    pub status: RequestStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected: Option<RankedResult>,
    pub ranked: Vec<RankedResult>,
    pub skipped_sources: Vec<SkippedIndexer>,
    pub group_failures: Vec<GroupFailure>,
}

/// Runs one search attempt per call and records the outcome.
pub struct RequestProcessor {
    orchestrator: Arc<SearchOrchestrator>,
    store: Arc<dyn RequestStore>,
    dispatcher: Arc<dyn DownloadDispatcher>,
    flag_bonuses: Arc<dyn FlagBonusProvider>,
    ranking: RankingConfig,
    policy: SelectionPolicy,
    require_author: bool,
}

impl RequestProcessor {
    pub fn new(
        orchestrator: Arc<SearchOrchestrator>,
        store: Arc<dyn RequestStore>,
        dispatcher: Arc<dyn DownloadDispatcher>,
        flag_bonuses: Arc<dyn FlagBonusProvider>,
        ranking: RankingConfig,
    ) -> Self {
        Self {
            orchestrator,
            store,
            dispatcher,
            flag_bonuses,
            policy: SelectionPolicy::from_config(&ranking),
            ranking,
            require_author: true,
        }
    }

    /// Relax the author gate for interactive searches, where the user
    /// reviews the ranked list.
    pub fn with_require_author(mut self, require: bool) -> Self {
        self.require_author = require;
        self
    }

    pub async fn search_audiobook(
        &self,
        request_id: &str,
        context: &RequestContext,
    ) -> Result<SearchReport, RequestError> {
        self.search_and_rank(request_id, ContentType::Audio, context).await
    }

    pub async fn search_ebook(
        &self,
        request_id: &str,
        context: &RequestContext,
    ) -> Result<SearchReport, RequestError> {
        self.search_and_rank(request_id, ContentType::Text, context).await
    }

    /// Run one search attempt: `searching`, then `handed_off`,
    /// `awaiting_search`, or `failed`.
    ///
    /// Errors are returned only for store problems; search and dispatch
    /// failures are recorded in the returned status.
    pub async fn search_and_rank(
        &self,
        request_id: &str,
        content_type: ContentType,
        context: &RequestContext,
    ) -> Result<SearchReport, RequestError> {
        let record = self
            .store
            .get(request_id)?
            .ok_or_else(|| RequestError::NotFound(request_id.to_string()))?;

        let record = self.store.update_status(
            request_id,
            RequestStatus::Searching {
                started_at: Utc::now(),
                attempt: record.attempts + 1,
            },
        )?;
        info!(
            request_id,
            content_type = %content_type,
            attempt = record.attempts,
            "Search attempt started"
        );

        let outcome = match self.orchestrator.search(content_type, context).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(request_id, error = %e, "Search failed");
                let status = RequestStatus::Failed {
                    failed_at: Utc::now(),
                    error: e.to_string(),
                };
                return self.finish(
                    request_id,
                    content_type,
                    status,
                    None,
                    Vec::new(),
                    SearchOutcome::default(),
                );
            }
        };

        let ranked = self.rank_outcome(&outcome, content_type, context);
        metrics::CANDIDATES_FOUND
            .with_label_values(&[content_type.as_str()])
            .observe(ranked.len() as f64);
        if let Some(top) = ranked.first() {
            metrics::BEST_FINAL_SCORE
                .with_label_values(&[content_type.as_str()])
                .observe(top.final_score);
        }

        let Some(selected) = self.policy.select(&ranked).cloned() else {
            let reason = awaiting_reason(&outcome, &ranked);
            info!(request_id, reason = %reason, "No eligible candidate, will retry");
            let status = RequestStatus::AwaitingSearch {
                since: Utc::now(),
                reason,
            };
            return self.finish(request_id, content_type, status, None, ranked, outcome);
        };

        debug!(
            request_id,
            title = %selected.candidate.title,
            base_score = selected.base_score,
            final_score = selected.final_score,
            "Selected candidate"
        );

        let status = match self.dispatcher.dispatch(request_id, &selected).await {
            Ok(()) => RequestStatus::HandedOff {
                handed_off_at: Utc::now(),
                selected: SelectedCandidate::from(&selected),
            },
            Err(e) => {
                warn!(request_id, dispatcher = self.dispatcher.name(), error = %e, "Dispatch failed");
                RequestStatus::Failed {
                    failed_at: Utc::now(),
                    error: e.to_string(),
                }
            }
        };
        self.finish(request_id, content_type, status, Some(selected), ranked, outcome)
    }

    fn rank_outcome(
        &self,
        outcome: &SearchOutcome,
        content_type: ContentType,
        context: &RequestContext,
    ) -> Vec<RankedResult> {
        let mut context = context.clone();
        if context.runtime_minutes.is_none() {
            context.runtime_minutes = outcome.runtime_minutes;
        }
        let options = RankingOptions::from_config(
            &self.ranking,
            content_type,
            self.flag_bonuses.flag_bonuses(),
        )
        .with_require_author(self.require_author);
        rank(&outcome.candidates, &context, &options)
    }

    fn finish(
        &self,
        request_id: &str,
        content_type: ContentType,
        status: RequestStatus,
        selected: Option<RankedResult>,
        ranked: Vec<RankedResult>,
        outcome: SearchOutcome,
    ) -> Result<SearchReport, RequestError> {
        let record = self.store.update_status(request_id, status)?;
        metrics::SEARCH_ATTEMPTS
            .with_label_values(&[content_type.as_str(), record.status.state_type()])
            .inc();
        info!(
            request_id,
            status = record.status.state_type(),
            candidates = ranked.len(),
            "Search attempt finished"
        );

        Ok(SearchReport {
            request_id: request_id.to_string(),
            status: record.status,
            selected,
            ranked,
            skipped_sources: outcome.skipped_indexers,
            group_failures: outcome.group_failures,
        })
    }
}

fn awaiting_reason(outcome: &SearchOutcome, ranked: &[RankedResult]) -> String {
    if ranked.is_empty() && outcome.all_groups_failed() {
        "all indexer groups failed".to_string()
    } else if ranked.is_empty() {
        "no candidates found".to_string()
    } else {
        format!("{} candidate(s) below selection thresholds", ranked.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::searcher::IndexerGroup;

    #[test]
    fn test_awaiting_reason() {
        let mut outcome = SearchOutcome::default();
        assert_eq!(awaiting_reason(&outcome, &[]), "no candidates found");

        outcome.groups_searched = 1;
        outcome.group_failures.push(GroupFailure {
            group: IndexerGroup {
                categories: vec![3030],
                indexer_ids: vec![1],
            },
            error: "timeout".to_string(),
        });
        assert_eq!(awaiting_reason(&outcome, &[]), "all indexer groups failed");
    }
}
