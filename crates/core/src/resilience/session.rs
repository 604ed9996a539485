//! Explicit scraping session.

use reqwest::Client;
use sha2::{Digest, Sha256};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::{PacingConfig, ScraperConfig};

use super::{
    browser_headers, fetch_with_retry, pick_user_agent, AdaptivePacer, FetchError, FetchMeta,
    Fetched, RetryPolicy,
};

/// One scraping identity against the catalog site.
///
/// The user agent is chosen once when the session is built and kept for its
/// whole lifetime. The session owns its pacer, so a session must not be
/// shared between concurrent bulk operations; create one per operation or
/// per worker.
pub struct ScrapeSession {
    client: Client,
    config: ScraperConfig,
    version: String,
    user_agent: &'static str,
    retry: RetryPolicy,
    pacer: AdaptivePacer,
}

impl ScrapeSession {
    /// Build a session for the given region and pacing settings.
    pub fn new(config: ScraperConfig, pacing: PacingConfig) -> Result<Self, FetchError> {
        let user_agent = pick_user_agent();
        let client = build_client(&config, user_agent)?;
        let version = Self::config_version(&config);
        info!(region = %config.region, version = %&version[..12], "Scrape session initialized");

        Ok(Self {
            client,
            retry: RetryPolicy::from_pacing(&pacing),
            pacer: AdaptivePacer::new(pacing),
            config,
            version,
            user_agent,
        })
    }

    /// Fingerprint of a scraper configuration.
    pub fn config_version(config: &ScraperConfig) -> String {
        let json = serde_json::to_string(config).unwrap_or_default();
        format!("{:x}", Sha256::digest(json.as_bytes()))
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn user_agent(&self) -> &str {
        self.user_agent
    }

    pub fn region(&self) -> &str {
        &self.config.region
    }

    /// Catalog site root for the session's region.
    pub fn base_url(&self) -> String {
        format!("https://{}", region_host(&self.config.region))
    }

    /// Rebuild the session if `config` differs from the one it was built with.
    ///
    /// Returns true when the session was reinitialized. A reinitialized
    /// session keeps its user agent but starts with a fresh pacer.
    pub fn ensure_current(&mut self, config: &ScraperConfig) -> Result<bool, FetchError> {
        let version = Self::config_version(config);
        if version == self.version {
            return Ok(false);
        }

        info!(
            old_region = %self.config.region,
            new_region = %config.region,
            "Scraper configuration changed, reinitializing session"
        );
        self.client = build_client(config, self.user_agent)?;
        self.config = config.clone();
        self.version = version;
        self.pacer.reset();
        Ok(true)
    }

    /// Fetch one page with bounded retry.
    pub async fn fetch_page(&self, url: &str) -> Result<Fetched<String>, FetchError> {
        let client = &self.client;
        fetch_with_retry(&self.retry, || async move {
            let response = client
                .get(url)
                .send()
                .await
                .map_err(FetchError::from_reqwest)?;
            let response = FetchError::check_response(response).await?;
            response.text().await.map_err(FetchError::from_reqwest)
        })
        .await
    }

    /// Fetch a sequence of pages, pacing between them.
    ///
    /// Pressure from a previous operation is cleared first. A page that fails
    /// after its retries is logged and skipped; its slot in the result is the
    /// error, and it counts as retry pressure for the pacer.
    pub async fn fetch_pages(&mut self, urls: &[String]) -> Vec<Result<String, FetchError>> {
        self.pacer.reset();
        let mut pages = Vec::with_capacity(urls.len());

        for (i, url) in urls.iter().enumerate() {
            let (page, meta) = match self.fetch_page(url).await {
                Ok(fetched) => (Ok(fetched.data), fetched.meta),
                Err(e) => {
                    warn!(url = %url, error = %e, "Page fetch failed, skipping");
                    (Err(e), FetchMeta::exhausted(self.retry.max_attempts))
                }
            };
            pages.push(page);

            let delay = self.pacer.report_page_result(&meta);
            if i + 1 < urls.len() {
                debug!(page = i + 1, delay_ms = delay.as_millis() as u64, "Pacing before next page");
                tokio::time::sleep(delay).await;
            }
        }

        pages
    }
}

fn build_client(config: &ScraperConfig, user_agent: &str) -> Result<Client, FetchError> {
    Client::builder()
        .user_agent(user_agent)
        .default_headers(browser_headers(&config.accept_language))
        .cookie_store(true)
        .timeout(Duration::from_secs(config.timeout_secs as u64))
        .build()
        .map_err(|e| FetchError::Connection(format!("Failed to create HTTP client: {}", e)))
}

/// Catalog host for a region code. Unknown regions use the US site.
fn region_host(region: &str) -> &'static str {
    match region.to_ascii_lowercase().as_str() {
        "uk" | "gb" => "www.audible.co.uk",
        "ca" => "www.audible.ca",
        "au" => "www.audible.com.au",
        "de" => "www.audible.de",
        "fr" => "www.audible.fr",
        "it" => "www.audible.it",
        "es" => "www.audible.es",
        "in" => "www.audible.in",
        "jp" => "www.audible.co.jp",
        _ => "www.audible.com",
    }
}
