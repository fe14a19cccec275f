//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with proper user agent strings and timeouts
//! - GET requests to fetch page content
//! - Error classification into [`FetchError`]
//!
//! A failed fetch is never retried; the coordinator logs it and moves on.

use crate::config::{CrawlerConfig, UserAgentConfig};
use crate::url::LocationId;
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use thiserror::Error;

/// Transport-level failure while fetching a page
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Network error for {url}: {message}")]
    Network { url: String, message: String },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Expected HTML from {url}, got '{content_type}'")]
    ContentMismatch { url: String, content_type: String },
}

/// Source of raw page content
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches the content stored at `location`
    async fn fetch(&self, location: &LocationId) -> Result<String, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - The user agent configuration
/// * `timeout` - Total time allowed for one request, body included
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use sumi_scribe::config::UserAgentConfig;
/// use sumi_scribe::crawler::build_http_client;
///
/// let config = UserAgentConfig {
///     crawler_name: "SumiScribe".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config, Duration::from_secs(30)).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetcher that issues one GET request per location
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a fetcher from the user agent and crawler settings
    pub fn from_config(
        user_agent: &UserAgentConfig,
        crawler: &CrawlerConfig,
    ) -> Result<Self, reqwest::Error> {
        let client = build_http_client(user_agent, Duration::from_secs(crawler.fetch_timeout))?;
        Ok(Self::new(client))
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, location: &LocationId) -> Result<String, FetchError> {
        let url = location.as_str();

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        if !is_html(&content_type) {
            return Err(FetchError::ContentMismatch {
                url: url.to_string(),
                content_type,
            });
        }

        response.text().await.map_err(|e| classify_error(url, e))
    }
}

fn is_html(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    mime == "text/html" || mime == "application/xhtml+xml"
}

fn classify_error(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else if error.is_connect() {
        FetchError::Network {
            url: url.to_string(),
            message: "Connection refused".to_string(),
        }
    } else {
        FetchError::Network {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}
