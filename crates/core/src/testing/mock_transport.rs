//! Mock search transport for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::resilience::{FetchError, FetchMeta};
use crate::searcher::{CandidateResult, GroupSearchResponse, SearchError, SearchTransport};

/// A recorded group query for test assertions.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub query: String,
    pub categories: Vec<u32>,
    pub indexer_ids: Vec<u32>,
}

/// Mock implementation of the SearchTransport trait.
///
/// Each group query returns the configured candidates whose `indexer_id` is
/// one of the group's indexers. A group containing a failing indexer fails
/// as a whole.
///
/// # Example
///
/// ```rust,ignore
/// let transport = MockTransport::new();
/// transport.set_candidates(vec![fixtures::candidate("Dune", 1, "a")]).await;
/// transport.fail_indexer(2, FetchError::Timeout).await;
/// ```
#[derive(Debug, Default)]
pub struct MockTransport {
    candidates: Arc<RwLock<Vec<CandidateResult>>>,
    failures: Arc<RwLock<HashMap<u32, FetchError>>>,
    retries: Arc<RwLock<HashMap<u32, u32>>>,
    calls: Arc<RwLock<Vec<RecordedCall>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the candidates the mock indexers hold.
    pub async fn set_candidates(&self, candidates: Vec<CandidateResult>) {
        *self.candidates.write().await = candidates;
    }

    /// Make every group containing this indexer fail.
    pub async fn fail_indexer(&self, indexer_id: u32, error: FetchError) {
        self.failures.write().await.insert(indexer_id, error);
    }

    /// Report this many retries for groups containing the indexer.
    pub async fn set_retries(&self, indexer_id: u32, retries: u32) {
        self.retries.write().await.insert(indexer_id, retries);
    }

    pub async fn recorded_calls(&self) -> Vec<RecordedCall> {
        self.calls.read().await.clone()
    }

    pub async fn clear(&self) {
        self.candidates.write().await.clear();
        self.failures.write().await.clear();
        self.retries.write().await.clear();
        self.calls.write().await.clear();
    }
}

#[async_trait]
impl SearchTransport for MockTransport {
    fn name(&self) -> &str {
        "mock"
    }

    async fn search(
        &self,
        query: &str,
        categories: &[u32],
        indexer_ids: &[u32],
    ) -> Result<GroupSearchResponse, SearchError> {
        self.calls.write().await.push(RecordedCall {
            query: query.to_string(),
            categories: categories.to_vec(),
            indexer_ids: indexer_ids.to_vec(),
        });

        let failures = self.failures.read().await;
        if let Some(error) = indexer_ids.iter().find_map(|id| failures.get(id)) {
            return Err(SearchError::Fetch(error.clone()));
        }

        let retries = self.retries.read().await;
        let retries_used = indexer_ids
            .iter()
            .filter_map(|id| retries.get(id))
            .copied()
            .max()
            .unwrap_or(0);

        let candidates = self
            .candidates
            .read()
            .await
            .iter()
            .filter(|c| indexer_ids.contains(&c.indexer_id))
            .cloned()
            .collect();

        Ok(GroupSearchResponse {
            candidates,
            meta: FetchMeta {
                retries_used,
                encountered_503: false,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[tokio::test]
    async fn test_returns_group_members_only() {
        let transport = MockTransport::new();
        transport
            .set_candidates(vec![
                fixtures::candidate("A", 1, "a"),
                fixtures::candidate("B", 2, "b"),
            ])
            .await;

        let response = transport.search("q", &[3030], &[2]).await.unwrap();
        assert_eq!(response.candidates.len(), 1);
        assert_eq!(response.candidates[0].title, "B");
        assert_eq!(transport.recorded_calls().await[0].query, "q");
    }

    #[tokio::test]
    async fn test_failure_and_retries() {
        let transport = MockTransport::new();
        transport.fail_indexer(1, FetchError::Timeout).await;
        transport.set_retries(2, 3).await;

        assert!(transport.search("q", &[1], &[1, 2]).await.is_err());
        let response = transport.search("q", &[1], &[2]).await.unwrap();
        assert_eq!(response.meta.retries_used, 3);

        transport.clear().await;
        assert!(transport.recorded_calls().await.is_empty());
    }
}
