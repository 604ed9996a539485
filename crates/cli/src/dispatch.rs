//! Dispatcher that reports the selection instead of downloading.

use async_trait::async_trait;
use tracing::info;

use rmab_core::ranking::RankedResult;
use rmab_core::request::{DispatchError, DownloadDispatcher};

/// Logs the winning candidate. The CLI has no download subsystem.
pub struct LoggingDispatcher;

#[async_trait]
impl DownloadDispatcher for LoggingDispatcher {
    fn name(&self) -> &str {
        "log"
    }

    async fn dispatch(&self, request_id: &str, selected: &RankedResult) -> Result<(), DispatchError> {
        info!(
            request_id,
            title = %selected.candidate.title,
            indexer = %selected.candidate.indexer,
            final_score = selected.final_score,
            download_url = %selected.candidate.download_url,
            "Selected release"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rmab_core::ranking::ScoreBreakdown;
    use rmab_core::testing::fixtures;

    #[test]
    fn test_logging_dispatcher_accepts() {
        let selected = RankedResult {
            candidate: fixtures::candidate("Dune", 1, "a"),
            base_score: 80.0,
            bonus_modifiers: vec![],
            bonus_points: 0.0,
            final_score: 80.0,
            rank: 1,
            breakdown: ScoreBreakdown::default(),
        };
        let result = tokio_test::block_on(LoggingDispatcher.dispatch("req", &selected));
        assert!(result.is_ok());
        assert_eq!(LoggingDispatcher.name(), "log");
    }
}
