//! Recording download dispatcher for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::ranking::RankedResult;
use crate::request::{DispatchError, DownloadDispatcher};

/// A dispatch recorded for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedDispatch {
    pub request_id: String,
    pub selected: RankedResult,
}

/// Download dispatcher that records every call and can be told to fail.
#[derive(Debug, Default)]
pub struct RecordingDispatcher {
    dispatched: Arc<RwLock<Vec<RecordedDispatch>>>,
    failure: Arc<RwLock<Option<String>>>,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every dispatch with this message.
    pub async fn fail_with(&self, message: &str) {
        *self.failure.write().await = Some(message.to_string());
    }

    pub async fn dispatched(&self) -> Vec<RecordedDispatch> {
        self.dispatched.read().await.clone()
    }
}

#[async_trait]
impl DownloadDispatcher for RecordingDispatcher {
    fn name(&self) -> &str {
        "recording"
    }

    async fn dispatch(&self, request_id: &str, selected: &RankedResult) -> Result<(), DispatchError> {
        if let Some(message) = self.failure.read().await.clone() {
            return Err(DispatchError(message));
        }
        self.dispatched.write().await.push(RecordedDispatch {
            request_id: request_id.to_string(),
            selected: selected.clone(),
        });
        Ok(())
    }
}
