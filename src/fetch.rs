//! Fetching binary content from remote locators

use crate::error::{ContentError, PublishError};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// Default cap on a single fetched body (256 MiB)
pub const DEFAULT_MAX_BYTES: u64 = 256 * 1024 * 1024;

/// Source of content bytes for binary items
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    async fn fetch(&self, locator: &str) -> Result<Vec<u8>, PublishError>;
}

/// Fetcher for `http(s)://` and `file://` locators
pub struct HttpFetcher {
    client: Client,
    max_bytes: u64,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, PublishError> {
        Self::with_limits(Duration::from_secs(120), DEFAULT_MAX_BYTES)
    }

    pub fn with_limits(timeout: Duration, max_bytes: u64) -> Result<Self, PublishError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PublishError::Fetch(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, max_bytes })
    }

    async fn fetch_http(&self, locator: &str) -> Result<Vec<u8>, PublishError> {
        let response = self
            .client
            .get(locator)
            .send()
            .await
            .map_err(|e| PublishError::Fetch(format!("{}: {}", locator, e)))?
            .error_for_status()
            .map_err(|e| PublishError::Fetch(format!("{}: {}", locator, e)))?;

        let mut body = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| PublishError::Fetch(format!("{}: {}", locator, e)))?;
            body.extend_from_slice(&chunk);
            if body.len() as u64 > self.max_bytes {
                return Err(PublishError::Fetch(format!(
                    "{}: body exceeds {} bytes",
                    locator, self.max_bytes
                )));
            }
        }
        Ok(body)
    }
}

#[async_trait]
impl ContentFetcher for HttpFetcher {
    async fn fetch(&self, locator: &str) -> Result<Vec<u8>, PublishError> {
        debug!(locator, "Fetching content");
        if let Some(path) = locator.strip_prefix("file://") {
            return tokio::fs::read(path)
                .await
                .map_err(|e| PublishError::Fetch(format!("{}: {}", locator, e)));
        }
        if locator.starts_with("http://") || locator.starts_with("https://") {
            return self.fetch_http(locator).await;
        }
        Err(ContentError::UnsupportedLocator(locator.to_string()).into())
    }
}

/// Fixed locator → bytes map, for tests and offline runs
#[derive(Default)]
pub struct StaticFetcher {
    objects: HashMap<String, Vec<u8>>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, locator: &str, bytes: &[u8]) -> Self {
        self.objects.insert(locator.to_string(), bytes.to_vec());
        self
    }
}

#[async_trait]
impl ContentFetcher for StaticFetcher {
    async fn fetch(&self, locator: &str) -> Result<Vec<u8>, PublishError> {
        self.objects
            .get(locator)
            .cloned()
            .ok_or_else(|| PublishError::Fetch(format!("{}: unreachable", locator)))
    }
}
