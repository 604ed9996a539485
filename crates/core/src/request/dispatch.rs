//! Download dispatch seam.

use async_trait::async_trait;
use thiserror::Error;

use crate::ranking::RankedResult;

/// Failure reported by the download subsystem.
#[derive(Debug, Error)]
#[error("download dispatch failed: {0}")]
pub struct DispatchError(pub String);

/// Hands the winning candidate to the download subsystem.
///
/// Invoked exactly once per successful search.
#[async_trait]
pub trait DownloadDispatcher: Send + Sync {
    fn name(&self) -> &str;

    async fn dispatch(&self, request_id: &str, selected: &RankedResult) -> Result<(), DispatchError>;
}
