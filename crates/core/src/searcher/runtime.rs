//! Audiobook runtime lookup over a metadata API.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::config::RuntimeLookupConfig;
use crate::resilience::{external_fetch_with_retry, FetchError};

use super::RuntimeLookup;

/// Runtime lookup against an Audnexus-compatible API (`GET /books/{asin}`).
pub struct HttpRuntimeLookup {
    client: Client,
    base_url: String,
}

impl HttpRuntimeLookup {
    pub fn new(config: &RuntimeLookupConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .map_err(|e| FetchError::Connection(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
        })
    }

    fn book_url(&self, identifier: &str) -> String {
        format!("{}/books/{}", self.base_url, urlencoding::encode(identifier))
    }
}

#[async_trait]
impl RuntimeLookup for HttpRuntimeLookup {
    async fn runtime_minutes(&self, identifier: &str) -> Option<u32> {
        let client = &self.client;
        let url = self.book_url(identifier);
        let url = url.as_str();

        let result = external_fetch_with_retry(|| async move {
            let response = client
                .get(url)
                .send()
                .await
                .map_err(FetchError::from_reqwest)?;
            let response = FetchError::check_response(response).await?;
            response
                .json::<BookRuntime>()
                .await
                .map_err(|e| FetchError::Decode(e.to_string()))
        })
        .await;

        match result {
            Ok(fetched) => fetched.data.runtime_length_min.filter(|m| *m > 0),
            Err(e) => {
                debug!(identifier = identifier, error = %e, "Runtime lookup failed");
                None
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BookRuntime {
    runtime_length_min: Option<u32>,
}
