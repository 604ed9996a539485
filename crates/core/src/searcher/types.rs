//! Types for the release search system.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::resilience::{FetchError, FetchMeta};

/// Kind of content a request wants.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    /// Audiobooks.
    Audio,
    /// Ebooks.
    Text,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Audio => "audio",
            ContentType::Text => "text",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a release is delivered.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Protocol {
    /// Peer swarm; availability depends on seeders.
    Torrent,
    /// Centralized server; always available.
    Usenet,
    /// Direct HTTP download from an archive.
    Direct,
}

impl Protocol {
    /// Whether availability is independent of peers.
    pub fn is_centralized(&self) -> bool {
        !matches!(self, Protocol::Torrent)
    }
}

/// One release discovered by a source, before scoring.
///
/// `seeders` and `leechers` are absent for centralized-server sources; the
/// scorer treats absent seeders as guaranteed availability.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CandidateResult {
    /// Source (indexer) that returned this release.
    pub indexer_id: u32,
    /// Source display name.
    pub indexer: String,
    /// Source-provided unique token.
    pub guid: String,
    /// Priority of the source (1-25), filled in from source configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indexer_priority: Option<u8>,
    /// Release title as published. Untrusted free text.
    pub title: String,
    /// Size in bytes.
    pub size_bytes: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seeders: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leechers: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish_date: Option<DateTime<Utc>>,
    /// Download locator (.torrent/.nzb URL, magnet URI, or direct link).
    pub download_url: String,
    /// Content hash (lowercase hex) when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info_hash: Option<String>,
    /// Detected container/file format tag (m4b, mp3, epub, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bitrate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_chapters: Option<bool>,
    /// Source-specific flags (freeleech, internal, ...).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<Protocol>,
}

impl CandidateResult {
    /// Identity of this release: source plus the source's unique token.
    ///
    /// Falls back to the download locator when the source gave no token.
    pub fn identity(&self) -> (u32, &str) {
        if self.guid.is_empty() {
            (self.indexer_id, &self.download_url)
        } else {
            (self.indexer_id, &self.guid)
        }
    }

    /// Whether availability of this release does not depend on peers.
    pub fn is_centralized(&self) -> bool {
        self.seeders.is_none() || self.protocol.map(|p| p.is_centralized()).unwrap_or(false)
    }

    /// Size in binary megabytes.
    pub fn size_mb(&self) -> f64 {
        self.size_bytes as f64 / (1024.0 * 1024.0)
    }
}

/// Candidates returned by one group query, with retry bookkeeping.
#[derive(Debug, Clone, Default)]
pub struct GroupSearchResponse {
    pub candidates: Vec<CandidateResult>,
    pub meta: FetchMeta,
}

/// Errors that can occur during search operations.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Invalid search response: {0}")]
    InvalidResponse(String),

    #[error("Search backend not configured")]
    NotConfigured,
}

impl SearchError {
    /// Whether the underlying failure was transient.
    pub fn is_transient(&self) -> bool {
        match self {
            SearchError::Fetch(e) => e.is_retryable(),
            _ => false,
        }
    }
}

/// Raw search transport: one call per indexer group.
#[async_trait]
pub trait SearchTransport: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Search the given indexers with the given categories.
    ///
    /// Returns an error only when the whole call failed.
    async fn search(
        &self,
        query: &str,
        categories: &[u32],
        indexer_ids: &[u32],
    ) -> Result<GroupSearchResponse, SearchError>;
}

/// Direct-download archive consulted for ebooks before indexers.
///
/// Provided by the embedding application; without one, text searches go
/// straight to the indexers.
#[async_trait]
pub trait ArchiveSource: Send + Sync {
    fn name(&self) -> &str;

    /// Look up releases by content identifier (ASIN, ISBN).
    async fn find_by_identifier(
        &self,
        identifier: &str,
        format: &str,
    ) -> Result<Vec<CandidateResult>, SearchError>;

    /// Look up releases by title and author.
    async fn find_by_title(
        &self,
        title: &str,
        author: &str,
        format: &str,
    ) -> Result<Vec<CandidateResult>, SearchError>;
}

/// Known-runtime lookup for audiobooks.
#[async_trait]
pub trait RuntimeLookup: Send + Sync {
    /// Runtime in minutes, if known. Failures yield `None`.
    async fn runtime_minutes(&self, identifier: &str) -> Option<u32>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate() -> CandidateResult {
        CandidateResult {
            indexer_id: 1,
            indexer: "test".to_string(),
            guid: "guid-1".to_string(),
            indexer_priority: None,
            title: "Test".to_string(),
            size_bytes: 1024 * 1024 * 300,
            seeders: Some(10),
            leechers: Some(1),
            publish_date: None,
            download_url: "http://example/1.torrent".to_string(),
            info_hash: None,
            format: None,
            bitrate: None,
            has_chapters: None,
            flags: vec![],
            protocol: Some(Protocol::Torrent),
        }
    }

    #[test]
    fn test_identity_prefers_guid() {
        let c = candidate();
        assert_eq!(c.identity(), (1, "guid-1"));

        let mut no_guid = candidate();
        no_guid.guid = String::new();
        assert_eq!(no_guid.identity(), (1, "http://example/1.torrent"));
    }

    #[test]
    fn test_is_centralized() {
        let mut c = candidate();
        assert!(!c.is_centralized());

        c.seeders = None;
        assert!(c.is_centralized());

        let mut usenet = candidate();
        usenet.protocol = Some(Protocol::Usenet);
        assert!(usenet.is_centralized());
    }

    #[test]
    fn test_size_mb() {
        assert_eq!(candidate().size_mb(), 300.0);
    }

    #[test]
    fn test_content_type_serialization() {
        assert_eq!(serde_json::to_string(&ContentType::Audio).unwrap(), "\"audio\"");
        assert_eq!(serde_json::to_string(&ContentType::Text).unwrap(), "\"text\"");
        assert_eq!(ContentType::Text.to_string(), "text");
    }

    #[test]
    fn test_candidate_serialization_skips_absent_fields() {
        let mut c = candidate();
        c.seeders = None;
        c.leechers = None;
        let json = serde_json::to_string(&c).unwrap();
        assert!(!json.contains("seeders"));
        assert!(!json.contains("flags"));

        let parsed: CandidateResult = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, c);
    }

    #[test]
    fn test_search_error_transient() {
        let err = SearchError::from(FetchError::Timeout);
        assert!(err.is_transient());
        assert!(!SearchError::InvalidResponse("x".into()).is_transient());
    }
}
