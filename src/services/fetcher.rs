// src/services/fetcher.rs

//! Page fetcher.
//!
//! One outbound GET per call with a bounded timeout, so an unresponsive
//! remote cannot stall the polling loop past the configured limit. The
//! rendering of the page is a black box from here on: callers get the
//! final text and nothing else.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::error::{AppError, Result};
use crate::models::FetchConfig;

/// Source of raw page content.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch the current page content as text.
    async fn fetch(&self) -> Result<String>;
}

/// HTTP fetcher for the configured target page.
pub struct HttpFetcher {
    client: Client,
    url: String,
}

impl HttpFetcher {
    /// Create a fetcher with the configured user agent and timeout.
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            url: config.target_url.clone(),
        })
    }

    /// Target URL this fetcher polls.
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self) -> Result<String> {
        log::debug!("Fetching {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| AppError::fetch(&self.url, e))?;

        let response = response
            .error_for_status()
            .map_err(|e| AppError::fetch(&self.url, e))?;

        let text = response
            .text()
            .await
            .map_err(|e| AppError::fetch(&self.url, e))?;

        log::debug!("Fetched {} bytes from {}", text.len(), self.url);
        Ok(text)
    }
}
