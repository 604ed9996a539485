//! Outbound request resilience.
//!
//! Helpers for scraping an upstream that rate-limits and blocks aggressive
//! clients: a per-session user agent with browser-like headers, jittered
//! exponential backoff, bounded retry with error classification, and an
//! adaptive pacer that slows down under retry pressure and pauses entirely
//! (circuit breaker) when pressure is sustained.

mod backoff;
mod fetch;
mod headers;
mod pacer;
mod session;

pub use backoff::{jittered_backoff, RetryPolicy};
pub use fetch::{external_fetch_with_retry, fetch_with_retry, FetchError, FetchMeta, Fetched};
pub use headers::{browser_headers, pick_user_agent, USER_AGENTS};
pub use pacer::AdaptivePacer;
pub use session::ScrapeSession;
