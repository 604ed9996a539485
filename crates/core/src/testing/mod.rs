//! Testing utilities and mock implementations.
//!
//! Mocks for every collaborator seam (search transport, archive, runtime
//! lookup, download dispatch) plus static providers, so the full
//! orchestrator, ranking, and request lifecycle can run without a network.
//!
//! # Example
//!
//! ```rust,ignore
//! use rmab_core::testing::{fixtures, MockTransport, StaticSources};
//!
//! let transport = Arc::new(MockTransport::new());
//! transport.set_candidates(vec![fixtures::candidate("Dune", 1, "a")]).await;
//! let sources = Arc::new(StaticSources(vec![fixtures::audio_indexer(1, &[3030])]));
//! ```

mod mock_archive;
mod mock_dispatcher;
mod mock_runtime;
mod mock_transport;

pub use mock_archive::MockArchive;
pub use mock_dispatcher::{RecordedDispatch, RecordingDispatcher};
pub use mock_runtime::MockRuntimeLookup;
pub use mock_transport::{MockTransport, RecordedCall};

use crate::config::{FlagBonusProvider, IndexerConfig, SourceProvider};
use crate::ranking::FlagBonus;

/// Fixed source list.
#[derive(Debug, Clone, Default)]
pub struct StaticSources(pub Vec<IndexerConfig>);

impl SourceProvider for StaticSources {
    fn sources(&self) -> Vec<IndexerConfig> {
        self.0.clone()
    }
}

/// Fixed flag-bonus list.
#[derive(Debug, Clone, Default)]
pub struct StaticFlagBonuses(pub Vec<FlagBonus>);

impl FlagBonusProvider for StaticFlagBonuses {
    fn flag_bonuses(&self) -> Vec<FlagBonus> {
        self.0.clone()
    }
}

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::config::{IndexerConfig, PacingConfig};
    use crate::orchestrator::OrchestratorConfig;
    use crate::ranking::RequestContext;
    use crate::searcher::{CandidateResult, Protocol};

    /// Create a torrent candidate with reasonable defaults.
    pub fn candidate(title: &str, indexer_id: u32, guid: &str) -> CandidateResult {
        CandidateResult {
            indexer_id,
            indexer: "mock-indexer".to_string(),
            guid: guid.to_string(),
            indexer_priority: None,
            title: title.to_string(),
            size_bytes: 1024 * 1024 * 300, // 300 MB
            seeders: Some(10),
            leechers: Some(1),
            publish_date: None,
            download_url: format!("http://indexer/{}/{}.torrent", indexer_id, guid),
            info_hash: None,
            format: None,
            bitrate: None,
            has_chapters: None,
            flags: Vec::new(),
            protocol: Some(Protocol::Torrent),
        }
    }

    /// Create a direct-download ebook from the archive.
    pub fn archive_candidate(title: &str, guid: &str) -> CandidateResult {
        CandidateResult {
            indexer_id: 0,
            indexer: "archive".to_string(),
            size_bytes: 1024 * 1024 * 2, // 2 MB
            seeders: None,
            leechers: None,
            download_url: format!("https://archive/{}", guid),
            format: Some("epub".to_string()),
            protocol: Some(Protocol::Direct),
            ..candidate(title, 0, guid)
        }
    }

    /// Create an enabled indexer with audio categories.
    pub fn audio_indexer(id: u32, categories: &[u32]) -> IndexerConfig {
        IndexerConfig {
            id,
            name: format!("indexer-{}", id),
            enabled: true,
            priority: 10,
            audio_categories: categories.to_vec(),
            text_categories: Vec::new(),
        }
    }

    /// Create an enabled indexer with text categories.
    pub fn text_indexer(id: u32, categories: &[u32]) -> IndexerConfig {
        IndexerConfig {
            audio_categories: Vec::new(),
            text_categories: categories.to_vec(),
            ..audio_indexer(id, &[])
        }
    }

    /// Pacing with no delays so tests run instantly.
    pub fn fast_pacing() -> PacingConfig {
        PacingConfig {
            base_delay_min_ms: 0,
            base_delay_max_ms: 0,
            cooldown_min_ms: 0,
            cooldown_max_ms: 0,
            cooldown_after: 3,
            retry_base_delay_ms: 0,
            max_retries: 5,
        }
    }

    pub fn orchestrator_config() -> OrchestratorConfig {
        OrchestratorConfig {
            pacing: fast_pacing(),
            ..OrchestratorConfig::default()
        }
    }

    pub fn context(title: &str, author: &str) -> RequestContext {
        RequestContext::new(title, author)
    }
}
