//! Multi-source search orchestration.
//!
//! Audio requests query every indexer group sequentially with paced delays,
//! skipping groups that fail. Text requests try the archive first and fall
//! back to text-category groups. Aggregated results are deduplicated and
//! size-filtered before they reach the ranking engine.

mod config;
mod runner;
mod types;

pub use config::OrchestratorConfig;
pub use runner::{filter_by_size, SearchOrchestrator};
pub use types::{CandidateOrigin, GroupFailure, OrchestratorError, SearchOutcome};
