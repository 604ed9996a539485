//! Search orchestrator implementation.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::{IndexerConfig, SourceProvider};
use crate::metrics;
use crate::ranking::{split_title, RequestContext};
use crate::resilience::{AdaptivePacer, FetchMeta};
use crate::searcher::{
    deduplicate_candidates, group_indexers_by_categories, ArchiveSource, CandidateResult,
    ContentType, IndexerGrouping, RuntimeLookup, SearchTransport,
};

use super::config::OrchestratorConfig;
use super::types::{CandidateOrigin, GroupFailure, OrchestratorError, SearchOutcome};

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Produces the combined candidate list for one request.
///
/// Each search call owns its own [`AdaptivePacer`]; the orchestrator itself
/// holds no mutable state and can serve concurrent requests.
pub struct SearchOrchestrator {
    config: OrchestratorConfig,
    transport: Arc<dyn SearchTransport>,
    sources: Arc<dyn SourceProvider>,
    archive: Option<Arc<dyn ArchiveSource>>,
    runtime_lookup: Option<Arc<dyn RuntimeLookup>>,
}

impl SearchOrchestrator {
    pub fn new(
        config: OrchestratorConfig,
        transport: Arc<dyn SearchTransport>,
        sources: Arc<dyn SourceProvider>,
    ) -> Self {
        Self {
            config,
            transport,
            sources,
            archive: None,
            runtime_lookup: None,
        }
    }

    /// Consult a direct-download archive before indexers for text requests.
    pub fn with_archive(mut self, archive: Arc<dyn ArchiveSource>) -> Self {
        self.archive = Some(archive);
        self
    }

    /// Resolve audio runtimes that the request does not carry.
    pub fn with_runtime_lookup(mut self, lookup: Arc<dyn RuntimeLookup>) -> Self {
        self.runtime_lookup = Some(lookup);
        self
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Search for a content type.
    pub async fn search(
        &self,
        content_type: ContentType,
        context: &RequestContext,
    ) -> Result<SearchOutcome, OrchestratorError> {
        match content_type {
            ContentType::Audio => self.search_audio(context).await,
            ContentType::Text => self.search_text(context).await,
        }
    }

    /// Query every audio group in turn, skipping groups that fail.
    pub async fn search_audio(
        &self,
        context: &RequestContext,
    ) -> Result<SearchOutcome, OrchestratorError> {
        let sources = self.sources.sources();
        let grouping = usable_grouping(&sources, ContentType::Audio)?;

        let query = self.query_for(context);
        let mut outcome = self.search_groups(&query, &grouping, &sources).await;
        outcome.runtime_minutes = self.resolve_runtime(context).await;

        Ok(self.finish(outcome, ContentType::Audio))
    }

    /// Try the archive by identifier, then by title and author; fall back to
    /// text-category indexer groups only when the archive yields nothing.
    pub async fn search_text(
        &self,
        context: &RequestContext,
    ) -> Result<SearchOutcome, OrchestratorError> {
        let sources = self.sources.sources();
        let grouping = match usable_grouping(&sources, ContentType::Text) {
            Ok(grouping) => Some(grouping),
            Err(e) if self.archive.is_none() => return Err(e),
            Err(e) => {
                debug!(error = %e, "No usable text indexers, archive only");
                None
            }
        };

        let archived = self.search_archive(context).await;
        if !archived.is_empty() {
            let outcome = SearchOutcome {
                candidates: archived,
                origin: CandidateOrigin::Archive,
                skipped_indexers: grouping
                    .as_ref()
                    .map(|g| g.skipped_indexers.clone())
                    .unwrap_or_default(),
                ..Default::default()
            };
            let outcome = self.finish(outcome, ContentType::Text);
            if !outcome.is_empty() {
                return Ok(outcome);
            }
            debug!("Archive results filtered out, falling back to indexers");
        }

        let Some(grouping) = grouping else {
            return Ok(SearchOutcome::default());
        };
        let query = self.query_for(context);
        let outcome = self.search_groups(&query, &grouping, &sources).await;
        Ok(self.finish(outcome, ContentType::Text))
    }

    /// Search query for indexers: the required part of the title.
    fn query_for(&self, context: &RequestContext) -> String {
        split_title(&context.title, &self.config.locale.profile()).required
    }

    async fn search_groups(
        &self,
        query: &str,
        grouping: &IndexerGrouping,
        sources: &[IndexerConfig],
    ) -> SearchOutcome {
        let priorities: HashMap<u32, (u8, &str)> = sources
            .iter()
            .map(|s| (s.id, (s.priority, s.name.as_str())))
            .collect();

        let mut pacer = AdaptivePacer::new(self.config.pacing.clone());
        let mut outcome = SearchOutcome {
            skipped_indexers: grouping.skipped_indexers.clone(),
            ..Default::default()
        };
        let mut delay = Duration::ZERO;

        for group in &grouping.groups {
            if !delay.is_zero() {
                debug!(delay_ms = delay.as_millis() as u64, "Pacing before next group");
                tokio::time::sleep(delay).await;
            }
            outcome.groups_searched += 1;

            match self
                .transport
                .search(query, &group.categories, &group.indexer_ids)
                .await
            {
                Ok(response) => {
                    debug!(
                        group = %group.label(),
                        indexers = ?group.indexer_ids,
                        results = response.candidates.len(),
                        "Group search complete"
                    );
                    delay = pacer.report_page_result(&response.meta);
                    outcome.candidates.extend(
                        response
                            .candidates
                            .into_iter()
                            .map(|c| attach_source_info(c, &priorities)),
                    );
                }
                Err(e) => {
                    warn!(
                        group = %group.label(),
                        indexers = ?group.indexer_ids,
                        transport = self.transport.name(),
                        error = %e,
                        "Group search failed, skipping"
                    );
                    metrics::GROUP_FAILURES.inc();
                    delay = pacer
                        .report_page_result(&FetchMeta::exhausted(self.config.pacing.max_retries));
                    outcome.group_failures.push(GroupFailure {
                        group: group.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        outcome
    }

    async fn search_archive(&self, context: &RequestContext) -> Vec<CandidateResult> {
        let Some(archive) = &self.archive else {
            return Vec::new();
        };
        let format = context
            .preferred_format
            .as_deref()
            .unwrap_or(self.config.default_text_format.as_str());

        if let Some(identifier) = context.identifier.as_deref() {
            match archive.find_by_identifier(identifier, format).await {
                Ok(results) if !results.is_empty() => {
                    debug!(archive = archive.name(), identifier, results = results.len(), "Archive hit by identifier");
                    return results;
                }
                Ok(_) => debug!(archive = archive.name(), identifier, "No archive results by identifier"),
                Err(e) => warn!(archive = archive.name(), error = %e, "Archive identifier lookup failed"),
            }
        }

        match archive
            .find_by_title(&context.title, &context.author, format)
            .await
        {
            Ok(results) => {
                debug!(archive = archive.name(), results = results.len(), "Archive title lookup complete");
                results
            }
            Err(e) => {
                warn!(archive = archive.name(), error = %e, "Archive title lookup failed");
                Vec::new()
            }
        }
    }

    async fn resolve_runtime(&self, context: &RequestContext) -> Option<u32> {
        if context.runtime_minutes.is_some() {
            return context.runtime_minutes;
        }
        let identifier = context.identifier.as_deref()?;
        let lookup = self.runtime_lookup.as_ref()?;
        let runtime = lookup.runtime_minutes(identifier).await;
        debug!(identifier, runtime = ?runtime, "Runtime lookup");
        runtime
    }

    /// Deduplicate and apply the size pre-filter.
    fn finish(&self, mut outcome: SearchOutcome, content_type: ContentType) -> SearchOutcome {
        let raw = outcome.candidates.len();
        let deduped = deduplicate_candidates(std::mem::take(&mut outcome.candidates));
        outcome.duplicates_removed = raw - deduped.len();

        let before = deduped.len();
        outcome.candidates = filter_by_size(deduped, content_type, &self.config);
        outcome.filtered_out = before - outcome.candidates.len();

        info!(
            content_type = %content_type,
            groups = outcome.groups_searched,
            failed_groups = outcome.group_failures.len(),
            raw,
            kept = outcome.candidates.len(),
            filtered = outcome.filtered_out,
            "Search aggregation complete"
        );
        outcome
    }
}

/// Group enabled sources, failing when nothing can be queried.
fn usable_grouping(
    sources: &[IndexerConfig],
    content_type: ContentType,
) -> Result<IndexerGrouping, OrchestratorError> {
    if !sources.iter().any(|s| s.enabled) {
        return Err(OrchestratorError::NoSourcesConfigured);
    }
    let grouping = group_indexers_by_categories(sources, content_type);
    if grouping.is_empty() {
        return Err(OrchestratorError::NoUsableSources {
            skipped: grouping.skipped_indexers,
        });
    }
    for skipped in &grouping.skipped_indexers {
        debug!(indexer = skipped.id, name = %skipped.name, "Indexer has no categories, skipped");
    }
    Ok(grouping)
}

fn attach_source_info(
    mut candidate: CandidateResult,
    sources: &HashMap<u32, (u8, &str)>,
) -> CandidateResult {
    if let Some((priority, name)) = sources.get(&candidate.indexer_id) {
        if candidate.indexer_priority.is_none() {
            candidate.indexer_priority = Some(*priority);
        }
        if candidate.indexer.is_empty() {
            candidate.indexer = name.to_string();
        }
    }
    candidate
}

/// Hard size elimination before scoring: audio below the minimum is too
/// small to be a real audiobook, text above the maximum is too large to be
/// an ebook.
pub fn filter_by_size(
    candidates: Vec<CandidateResult>,
    content_type: ContentType,
    config: &OrchestratorConfig,
) -> Vec<CandidateResult> {
    candidates
        .into_iter()
        .filter(|c| {
            let keep = match content_type {
                ContentType::Audio => c.size_bytes >= config.audio_min_size_mb * BYTES_PER_MB,
                ContentType::Text => c.size_bytes <= config.text_max_size_mb * BYTES_PER_MB,
            };
            if !keep {
                debug!(title = %c.title, size_bytes = c.size_bytes, "Dropped by size filter");
            }
            keep
        })
        .collect()
}
