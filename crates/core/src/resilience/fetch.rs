//! Bounded retry around a single outbound request.

use serde::{Deserialize, Serialize};
use std::future::Future;
use thiserror::Error;
use tracing::{debug, warn};

use crate::metrics;

use super::RetryPolicy;

/// Errors from a single outbound request.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FetchError {
    #[error("Request timed out")]
    Timeout,

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl FetchError {
    /// HTTP status of the failed response, if one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether another attempt may succeed.
    ///
    /// No response at all (timeout, connection failure), 429, 503 and any
    /// other 5xx are transient. Everything else, 403 and 404 included, is
    /// terminal.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Timeout | FetchError::Connection(_) => true,
            FetchError::Http { status, .. } => *status == 429 || *status >= 500,
            FetchError::Decode(_) => false,
        }
    }

    /// Map a reqwest transport error.
    pub fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else if e.is_decode() {
            FetchError::Decode(e.to_string())
        } else if let Some(status) = e.status() {
            FetchError::Http {
                status: status.as_u16(),
                body: String::new(),
            }
        } else {
            FetchError::Connection(e.to_string())
        }
    }

    /// Turn a non-success response into an `Http` error, passing successes through.
    pub async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, Self> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(FetchError::Http {
            status: status.as_u16(),
            body: body.chars().take(200).collect(),
        })
    }
}

/// Retry bookkeeping from a completed fetch, consumed by the pacer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchMeta {
    /// Retries needed before the request succeeded.
    pub retries_used: u32,
    /// Whether any failed attempt returned exactly 503.
    pub encountered_503: bool,
}

impl FetchMeta {
    /// Meta describing a fetch that gave up after `max_attempts` attempts.
    pub fn exhausted(max_attempts: u32) -> Self {
        Self {
            retries_used: max_attempts.saturating_sub(1).max(1),
            encountered_503: false,
        }
    }
}

/// Payload plus retry bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched<T> {
    pub data: T,
    pub meta: FetchMeta,
}

/// Run `op` until it succeeds, fails terminally, or runs out of retries.
///
/// Terminal errors are returned immediately. Retryable errors sleep for the
/// policy's backoff and try again; once `policy.max_attempts` attempts have
/// been made, the last error is returned. A zero bound still makes one attempt.
pub async fn fetch_with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    mut op: F,
) -> Result<Fetched<T>, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let mut meta = FetchMeta::default();
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt: u32 = 0;

    loop {
        match op().await {
            Ok(data) => return Ok(Fetched { data, meta }),
            Err(e) if !e.is_retryable() => {
                debug!(error = %e, "Terminal fetch error, not retrying");
                return Err(e);
            }
            Err(e) if attempt + 1 >= max_attempts => {
                warn!(error = %e, attempts = attempt + 1, "Fetch attempts exhausted");
                return Err(e);
            }
            Err(e) => {
                meta.retries_used += 1;
                if e.status() == Some(503) {
                    meta.encountered_503 = true;
                }
                let delay = policy.delay_for(attempt);
                metrics::FETCH_RETRIES.inc();
                warn!(
                    error = %e,
                    attempt = attempt + 1,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    "Retryable fetch error, backing off"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

/// Retry wrapper for trusted, low-risk auxiliary lookups.
///
/// Three attempts in total with plain doubling backoff.
pub async fn external_fetch_with_retry<T, F, Fut>(op: F) -> Result<Fetched<T>, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    fetch_with_retry(&RetryPolicy::external(), op).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(1),
            jitter: true,
        }
    }

    fn http(status: u16) -> FetchError {
        FetchError::Http {
            status,
            body: String::new(),
        }
    }

    /// Fails with the scripted errors in order, then succeeds.
    fn scripted(
        errors: Vec<FetchError>,
    ) -> (Arc<AtomicU32>, impl FnMut() -> std::future::Ready<Result<&'static str, FetchError>>) {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let op = move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) as usize;
            std::future::ready(match errors.get(n) {
                Some(e) => Err(e.clone()),
                None => Ok("payload"),
            })
        };
        (calls, op)
    }

    #[test]
    fn test_error_classification() {
        assert!(FetchError::Timeout.is_retryable());
        assert!(FetchError::Connection("reset".into()).is_retryable());
        assert!(http(429).is_retryable());
        assert!(http(503).is_retryable());
        assert!(http(500).is_retryable());
        assert!(http(502).is_retryable());
        assert!(!http(404).is_retryable());
        assert!(!http(403).is_retryable());
        assert!(!http(400).is_retryable());
        assert!(!FetchError::Decode("bad json".into()).is_retryable());
    }

    #[test]
    fn test_status() {
        assert_eq!(http(503).status(), Some(503));
        assert_eq!(FetchError::Timeout.status(), None);
    }

    #[tokio::test]
    async fn test_success_first_try() {
        let (calls, op) = scripted(vec![]);
        let fetched = fetch_with_retry(&fast_policy(5), op).await.unwrap();
        assert_eq!(fetched.data, "payload");
        assert_eq!(fetched.meta, FetchMeta::default());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retries_transient_then_succeeds() {
        let (calls, op) = scripted(vec![http(503), FetchError::Timeout, http(429)]);
        let fetched = fetch_with_retry(&fast_policy(5), op).await.unwrap();
        assert_eq!(fetched.data, "payload");
        assert_eq!(fetched.meta.retries_used, 3);
        assert!(fetched.meta.encountered_503);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_503_flag_only_for_exact_status() {
        let (_, op) = scripted(vec![http(502)]);
        let fetched = fetch_with_retry(&fast_policy(5), op).await.unwrap();
        assert_eq!(fetched.meta.retries_used, 1);
        assert!(!fetched.meta.encountered_503);
    }

    #[tokio::test]
    async fn test_terminal_error_not_retried() {
        let (calls, op) = scripted(vec![http(404)]);
        let err = fetch_with_retry(&fast_policy(5), op).await.unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let (calls, op) = scripted(vec![http(503); 10]);
        let err = fetch_with_retry(&fast_policy(5), op).await.unwrap_err();
        assert_eq!(err.status(), Some(503));
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_last_attempt_can_succeed() {
        let (calls, op) = scripted(vec![http(503); 4]);
        let fetched = fetch_with_retry(&fast_policy(5), op).await.unwrap();
        assert_eq!(fetched.meta.retries_used, 4);
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_zero_bound_still_attempts_once() {
        let (calls, op) = scripted(vec![FetchError::Timeout]);
        assert!(fetch_with_retry(&fast_policy(0), op).await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_external_fetch_makes_three_attempts() {
        let (calls, op) = scripted(vec![FetchError::Connection("reset".into()); 2]);
        let fetched = external_fetch_with_retry(op).await.unwrap();
        assert_eq!(fetched.meta.retries_used, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_exhausted_meta_counts_as_pressure() {
        assert_eq!(FetchMeta::exhausted(5).retries_used, 4);
        assert_eq!(FetchMeta::exhausted(1).retries_used, 1);
        assert_eq!(FetchMeta::exhausted(0).retries_used, 1);
    }

    #[tokio::test]
    async fn test_external_fetch_terminal_error_returns_immediately() {
        let (calls, op) = scripted(vec![http(403)]);
        let err = external_fetch_with_retry(op).await.unwrap_err();
        assert_eq!(err.status(), Some(403));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
