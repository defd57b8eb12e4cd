// src/fetch/client.rs

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::error::FetchFailure;

/// Something that can turn a URL into a response body.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<Bytes, FetchFailure>;
}

/// Plain HTTP GET: one attempt, no retries, no auth, whole body in memory.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Build a client whose every request (connect + body) is bounded by `timeout`.
    pub fn new(timeout: Duration) -> reqwest::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<Bytes, FetchFailure> {
        debug!(%url, "GET");
        let resp = self.client.get(url.clone()).send().await?.error_for_status()?;
        let bytes = resp.bytes().await?;
        debug!(%url, bytes = bytes.len(), "body read");
        Ok(bytes)
    }
}
