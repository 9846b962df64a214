//! HTTP poller for the upstream alert feed
//!
//! One GET per poll tick, reusing a single `reqwest::Client` for connection
//! pooling. Transport failures are classified into `FeedError` so the monitor
//! can decide between retrying on the next tick and stopping.

use crate::domain::error::FeedError;
use crate::infra::config::Config;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, REFERER, USER_AGENT};
use std::time::{Duration, Instant};
use tracing::debug;

/// Body substring the upstream CDN returns when the caller's origin is blocked
const ACCESS_DENIED_MARKER: &[u8] = b"Access Denied";

/// Source of raw feed bodies, one per poll tick
#[async_trait]
pub trait AlertFeed: Send + Sync {
    /// Fetch the current body. `Ok(None)` means the feed answered with no content.
    async fn fetch(&self) -> Result<Option<Bytes>, FeedError>;
}

pub struct HttpPoller {
    client: reqwest::Client,
    url: String,
}

impl HttpPoller {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(REFERER, HeaderValue::from_str(config.feed_referer())?);
        headers.insert("X-Requested-With", HeaderValue::from_static("XMLHttpRequest"));
        headers.insert(USER_AGENT, HeaderValue::from_str(config.feed_user_agent())?);

        // Create HTTP client once for reuse (connection pooling)
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(config.feed_timeout_ms()))
            .build()?;

        Ok(Self { client, url: config.feed_url().to_string() })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl AlertFeed for HttpPoller {
    async fn fetch(&self) -> Result<Option<Bytes>, FeedError> {
        let start = Instant::now();
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        debug!(
            status = %status.as_u16(),
            bytes = %body.len(),
            latency_us = %start.elapsed().as_micros(),
            "feed_fetched"
        );

        classify_response(status.as_u16(), body)
    }
}

/// Map a completed HTTP exchange onto the feed contract
fn classify_response(status: u16, body: Bytes) -> Result<Option<Bytes>, FeedError> {
    if contains(&body, ACCESS_DENIED_MARKER) {
        return Err(FeedError::AccessDenied);
    }
    if !(200..300).contains(&status) {
        return Err(FeedError::HttpStatus(status));
    }
    if body.is_empty() {
        return Ok(None);
    }
    Ok(Some(body))
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|window| window == needle)
}
