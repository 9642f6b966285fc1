//! Page fetching handle shared by the source adapters
//!
//! Adapters never build their own HTTP clients; they receive an
//! `Arc<dyn PageFetcher>` so a pass can run against live sites or against
//! captured pages.

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

/// Page fetch errors
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("Body read error: {0}")]
    Body(String),
}

/// Fetches the raw text of a page or API response
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// GET `url` with the given query parameters and return the body text
    async fn get_text(&self, url: &str, query: &[(&str, String)]) -> Result<String, FetchError>;
}

/// `reqwest`-backed fetcher
pub struct HttpPageFetcher {
    http_client: reqwest::Client,
}

impl HttpPageFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, FetchError> {
        let http_client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        Ok(Self { http_client })
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn get_text(&self, url: &str, query: &[(&str, String)]) -> Result<String, FetchError> {
        tracing::debug!(url = %url, params = query.len(), "Fetching page");

        let response = self
            .http_client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        response
            .text()
            .await
            .map_err(|e| FetchError::Body(e.to_string()))
    }
}

/// Fetcher serving fixed bodies by URL
///
/// Replays captured pages offline; unknown URLs answer 404. Query
/// parameters are ignored.
#[derive(Debug, Default, Clone)]
pub struct StaticPageFetcher {
    pages: HashMap<String, String>,
}

impl StaticPageFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.pages.insert(url.into(), body.into());
        self
    }
}

#[async_trait]
impl PageFetcher for StaticPageFetcher {
    async fn get_text(&self, url: &str, _query: &[(&str, String)]) -> Result<String, FetchError> {
        self.pages.get(url).cloned().ok_or(FetchError::Status(404))
    }
}
