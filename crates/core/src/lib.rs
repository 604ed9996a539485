pub mod config;
pub mod metrics;
pub mod orchestrator;
pub mod ranking;
pub mod request;
pub mod resilience;
pub mod searcher;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use orchestrator::{OrchestratorConfig, OrchestratorError, SearchOrchestrator, SearchOutcome};
pub use ranking::{rank, RankedResult, RankingOptions, RequestContext, SelectionPolicy};
pub use request::{
    DownloadDispatcher, MemoryRequestStore, RequestProcessor, RequestRecord, RequestStatus,
    RequestStore, SearchReport,
};
pub use searcher::{CandidateResult, ContentType};
