//! Mock runtime lookup for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::searcher::RuntimeLookup;

/// Mock implementation of the RuntimeLookup trait.
#[derive(Debug, Default)]
pub struct MockRuntimeLookup {
    runtimes: Arc<RwLock<HashMap<String, u32>>>,
    lookups: Arc<RwLock<usize>>,
}

impl MockRuntimeLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_runtime(&self, identifier: &str, minutes: u32) {
        self.runtimes
            .write()
            .await
            .insert(identifier.to_string(), minutes);
    }

    pub async fn lookup_count(&self) -> usize {
        *self.lookups.read().await
    }
}

#[async_trait]
impl RuntimeLookup for MockRuntimeLookup {
    async fn runtime_minutes(&self, identifier: &str) -> Option<u32> {
        *self.lookups.write().await += 1;
        self.runtimes.read().await.get(identifier).copied()
    }
}
