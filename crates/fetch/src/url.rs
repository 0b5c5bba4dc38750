//! Web page fetcher.

use std::time::Duration;

use async_trait::async_trait;
use chathub_config::FetchConfig;
use chathub_core::error::FetchError;
use chathub_core::fetch::{DEFAULT_MAX_CHARS, FetchedContent, PageReader};
use tracing::{debug, warn};

use crate::html::html_to_text;

/// Fetches a page over HTTP and flattens it to bounded plain text.
pub struct UrlFetcher {
    client: reqwest::Client,
    user_agent: String,
    timeout_secs: u64,
    max_chars: usize,
}

impl UrlFetcher {
    pub fn new(user_agent: impl Into<String>, timeout_secs: u64, max_chars: usize) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_default();

        Self {
            client,
            user_agent: user_agent.into(),
            timeout_secs,
            max_chars,
        }
    }

    pub fn from_config(config: &FetchConfig) -> Self {
        Self::new(&config.user_agent, config.timeout_secs, config.max_chars)
    }

    fn map_error(&self, url: &str, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
                timeout_secs: self.timeout_secs,
            }
        } else if e.is_builder() {
            FetchError::InvalidUrl(url.to_string())
        } else {
            FetchError::Network(e.to_string())
        }
    }
}

impl Default for UrlFetcher {
    fn default() -> Self {
        Self::new("Mozilla/5.0", 10, DEFAULT_MAX_CHARS)
    }
}

#[async_trait]
impl PageReader for UrlFetcher {
    async fn read(&self, url: &str) -> Result<FetchedContent, FetchError> {
        let parsed =
            reqwest::Url::parse(url).map_err(|_| FetchError::InvalidUrl(url.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FetchError::InvalidUrl(url.to_string()));
        }

        debug!(url = %url, "Fetching page");

        let response = self
            .client
            .get(parsed)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .send()
            .await
            .map_err(|e| self.map_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %url, status = status.as_u16(), "Page fetch returned error status");
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let html = response.text().await.map_err(|e| {
            if e.is_timeout() {
                self.map_error(url, e)
            } else {
                FetchError::Body(e.to_string())
            }
        })?;

        let content = FetchedContent::bounded(html_to_text(&html), self.max_chars);
        debug!(url = %url, chars = content.char_count(), "Fetched page text");
        Ok(content)
    }
}
