//! Mock ebook archive for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::searcher::{ArchiveSource, CandidateResult, SearchError};

/// Mock implementation of the ArchiveSource trait.
///
/// Identifier lookups return the results registered for that identifier;
/// title lookups return one shared result list.
#[derive(Debug, Default)]
pub struct MockArchive {
    by_identifier: Arc<RwLock<HashMap<String, Vec<CandidateResult>>>>,
    by_title: Arc<RwLock<Vec<CandidateResult>>>,
    next_error: Arc<RwLock<Option<SearchError>>>,
    identifier_lookups: Arc<RwLock<usize>>,
    title_lookups: Arc<RwLock<usize>>,
}

impl MockArchive {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_identifier_results(&self, identifier: &str, results: Vec<CandidateResult>) {
        self.by_identifier
            .write()
            .await
            .insert(identifier.to_string(), results);
    }

    pub async fn set_title_results(&self, results: Vec<CandidateResult>) {
        *self.by_title.write().await = results;
    }

    /// Fail the next lookup with this error.
    pub async fn set_next_error(&self, error: SearchError) {
        *self.next_error.write().await = Some(error);
    }

    pub async fn identifier_lookups(&self) -> usize {
        *self.identifier_lookups.read().await
    }

    pub async fn title_lookups(&self) -> usize {
        *self.title_lookups.read().await
    }
}

#[async_trait]
impl ArchiveSource for MockArchive {
    fn name(&self) -> &str {
        "mock-archive"
    }

    async fn find_by_identifier(
        &self,
        identifier: &str,
        _format: &str,
    ) -> Result<Vec<CandidateResult>, SearchError> {
        *self.identifier_lookups.write().await += 1;
        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }
        Ok(self
            .by_identifier
            .read()
            .await
            .get(identifier)
            .cloned()
            .unwrap_or_default())
    }

    async fn find_by_title(
        &self,
        _title: &str,
        _author: &str,
        _format: &str,
    ) -> Result<Vec<CandidateResult>, SearchError> {
        *self.title_lookups.write().await += 1;
        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }
        Ok(self.by_title.read().await.clone())
    }
}
