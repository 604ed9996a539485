//! Request record and status types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ranking::{RankedResult, ScoreBreakdown};
use crate::searcher::ContentType;

/// Lifecycle status of a request's search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RequestStatus {
    /// Created, never searched.
    Pending,

    /// A search attempt is running.
    Searching {
        started_at: DateTime<Utc>,
        attempt: u32,
    },

    /// Nothing usable found; eligible for another attempt later.
    AwaitingSearch {
        since: DateTime<Utc>,
        reason: String,
    },

    /// Unrecoverable failure (configuration or dispatch).
    Failed {
        failed_at: DateTime<Utc>,
        error: String,
    },

    /// A candidate was selected and handed to the download subsystem.
    HandedOff {
        handed_off_at: DateTime<Utc>,
        selected: SelectedCandidate,
    },
}

impl RequestStatus {
    /// Returns the state type name for filtering and metrics.
    pub fn state_type(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Searching { .. } => "searching",
            RequestStatus::AwaitingSearch { .. } => "awaiting_search",
            RequestStatus::Failed { .. } => "failed",
            RequestStatus::HandedOff { .. } => "handed_off",
        }
    }

    /// Returns true once the request has left the search lifecycle.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestStatus::HandedOff { .. })
    }

    /// Returns true if a new search attempt may start from this status.
    pub fn can_search(&self) -> bool {
        matches!(
            self,
            RequestStatus::Pending
                | RequestStatus::AwaitingSearch { .. }
                | RequestStatus::Failed { .. }
        )
    }

    /// Whether moving to `next` is a valid transition.
    pub fn can_transition_to(&self, next: &RequestStatus) -> bool {
        match next {
            RequestStatus::Searching { .. } => self.can_search(),
            RequestStatus::AwaitingSearch { .. }
            | RequestStatus::Failed { .. }
            | RequestStatus::HandedOff { .. } => matches!(self, RequestStatus::Searching { .. }),
            RequestStatus::Pending => false,
        }
    }
}

/// The winning candidate as written back to the request record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SelectedCandidate {
    pub title: String,
    pub indexer: String,
    pub guid: String,
    pub download_url: String,
    pub base_score: f64,
    pub final_score: f64,
    pub breakdown: ScoreBreakdown,
}

impl From<&RankedResult> for SelectedCandidate {
    fn from(result: &RankedResult) -> Self {
        Self {
            title: result.candidate.title.clone(),
            indexer: result.candidate.indexer.clone(),
            guid: result.candidate.guid.clone(),
            download_url: result.candidate.download_url.clone(),
            base_score: result.base_score,
            final_score: result.final_score,
            breakdown: result.breakdown.clone(),
        }
    }
}

/// A user request as tracked by the search lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RequestRecord {
    pub id: String,
    pub content_type: ContentType,
    pub status: RequestStatus,
    /// Number of search attempts started.
    pub attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_search_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RequestRecord {
    pub fn new(id: impl Into<String>, content_type: ContentType) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            content_type,
            status: RequestStatus::Pending,
            attempts: 0,
            last_search_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a status change, validating the transition.
    ///
    /// Entering `Searching` counts an attempt and stamps `last_search_at`.
    pub fn transition(&mut self, next: RequestStatus) -> Result<(), RequestError> {
        if !self.status.can_transition_to(&next) {
            return Err(RequestError::InvalidTransition {
                id: self.id.clone(),
                from: self.status.state_type().to_string(),
                to: next.state_type().to_string(),
            });
        }
        let now = Utc::now();
        if matches!(next, RequestStatus::Searching { .. }) {
            self.attempts += 1;
            self.last_search_at = Some(now);
        }
        self.status = next;
        self.updated_at = now;
        Ok(())
    }

    /// Error message attached to a failed request.
    pub fn error_message(&self) -> Option<&str> {
        match &self.status {
            RequestStatus::Failed { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// Errors from the request lifecycle.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("request not found: {0}")]
    NotFound(String),

    #[error("invalid transition for request {id}: {from} -> {to}")]
    InvalidTransition { id: String, from: String, to: String },

    #[error("request store error: {0}")]
    Store(String),
}
