//! Prowlarr search backend implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::config::ProwlarrConfig;
use crate::resilience::{fetch_with_retry, FetchError, RetryPolicy};

use super::{CandidateResult, GroupSearchResponse, Protocol, SearchError, SearchTransport};

/// Maximum results requested per group query.
const RESULT_LIMIT: u32 = 100;

/// Prowlarr search backend: one aggregated API call per indexer group.
pub struct ProwlarrSearcher {
    client: Client,
    config: ProwlarrConfig,
    retry: RetryPolicy,
}

impl ProwlarrSearcher {
    /// Create a new ProwlarrSearcher with the given configuration.
    pub fn new(config: ProwlarrConfig, retry: RetryPolicy) -> Result<Self, SearchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .map_err(|e| {
                SearchError::Fetch(FetchError::Connection(format!(
                    "Failed to create HTTP client: {}",
                    e
                )))
            })?;

        Ok(Self {
            client,
            config,
            retry,
        })
    }

    /// Build the Prowlarr API URL for a search.
    fn build_search_url(&self, query: &str, categories: &[u32], indexer_ids: &[u32]) -> String {
        let mut url = format!(
            "{}/api/v1/search?query={}&type=search&limit={}",
            self.config.url.trim_end_matches('/'),
            urlencoding::encode(query),
            RESULT_LIMIT
        );

        for id in indexer_ids {
            url.push_str(&format!("&indexerIds={}", id));
        }
        for cat in categories {
            url.push_str(&format!("&categories={}", cat));
        }

        url
    }
}

#[async_trait]
impl SearchTransport for ProwlarrSearcher {
    fn name(&self) -> &str {
        "prowlarr"
    }

    async fn search(
        &self,
        query: &str,
        categories: &[u32],
        indexer_ids: &[u32],
    ) -> Result<GroupSearchResponse, SearchError> {
        let url = self.build_search_url(query, categories, indexer_ids);
        debug!(indexers = ?indexer_ids, categories = ?categories, "Searching Prowlarr");

        let client = &self.client;
        let api_key = self.config.api_key.as_str();
        let url = url.as_str();
        let fetched = fetch_with_retry(&self.retry, || async move {
            let response = client
                .get(url)
                .header("X-Api-Key", api_key)
                .send()
                .await
                .map_err(FetchError::from_reqwest)?;
            let response = FetchError::check_response(response).await?;
            response
                .json::<Vec<serde_json::Value>>()
                .await
                .map_err(|e| FetchError::Decode(e.to_string()))
        })
        .await?;

        let total = fetched.data.len();
        let candidates = parse_results(fetched.data);

        debug!(
            results = total,
            kept = candidates.len(),
            retries = fetched.meta.retries_used,
            "Prowlarr search complete"
        );

        Ok(GroupSearchResponse {
            candidates,
            meta: fetched.meta,
        })
    }
}

/// Decode raw search records one by one, dropping the unusable ones.
fn parse_results(records: Vec<serde_json::Value>) -> Vec<CandidateResult> {
    records
        .into_iter()
        .filter_map(|record| match serde_json::from_value::<ProwlarrResult>(record) {
            Ok(result) => result.into_candidate(),
            Err(e) => {
                debug!(error = %e, "Dropping malformed result");
                None
            }
        })
        .collect()
}

/// Parse Prowlarr's date format.
fn parse_prowlarr_date(date_str: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(date_str)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|| {
            chrono::NaiveDateTime::parse_from_str(date_str, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|ndt| ndt.and_utc())
        })
}

// Prowlarr API response types
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProwlarrResult {
    guid: Option<String>,
    indexer_id: Option<u32>,
    indexer: Option<String>,
    title: Option<String>,
    size: Option<i64>,
    seeders: Option<i64>,
    leechers: Option<i64>,
    publish_date: Option<String>,
    download_url: Option<String>,
    magnet_url: Option<String>,
    info_hash: Option<String>,
    protocol: Option<String>,
    #[serde(default)]
    indexer_flags: Vec<serde_json::Value>,
}

impl ProwlarrResult {
    /// Convert to a candidate, dropping records that cannot be used.
    fn into_candidate(self) -> Option<CandidateResult> {
        let title = match self.title {
            Some(t) if !t.trim().is_empty() => t,
            _ => {
                debug!(guid = ?self.guid, "Dropping result without title");
                return None;
            }
        };
        let Some(download_url) = self.download_url.or(self.magnet_url) else {
            debug!(title = %title, "Dropping result without download locator");
            return None;
        };
        let size_bytes = match self.size {
            Some(s) if s >= 0 => s as u64,
            _ => {
                debug!(title = %title, size = ?self.size, "Dropping result with invalid size");
                return None;
            }
        };
        let Some(indexer_id) = self.indexer_id else {
            debug!(title = %title, "Dropping result without indexer");
            return None;
        };

        let protocol = match self.protocol.as_deref() {
            Some("torrent") => Some(Protocol::Torrent),
            Some("usenet") => Some(Protocol::Usenet),
            _ => None,
        };
        let (seeders, leechers) = match protocol {
            Some(Protocol::Torrent) | None => (
                self.seeders.map(|s| s.max(0) as u32),
                self.leechers.map(|l| l.max(0) as u32),
            ),
            Some(_) => (None, None),
        };

        Some(CandidateResult {
            indexer_id,
            indexer: self.indexer.unwrap_or_default(),
            guid: self.guid.unwrap_or_default(),
            indexer_priority: None,
            title,
            size_bytes,
            seeders,
            leechers,
            publish_date: self.publish_date.as_deref().and_then(parse_prowlarr_date),
            download_url,
            info_hash: self.info_hash.map(|h| h.to_lowercase()),
            format: None,
            bitrate: None,
            has_chapters: None,
            flags: self
                .indexer_flags
                .into_iter()
                .filter_map(|f| f.as_str().map(str::to_string))
                .collect(),
            protocol,
        })
    }
}
