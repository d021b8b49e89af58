//! Record source: the HTTP seam and decoding of the record document.

use async_trait::async_trait;
use bytes::Bytes;

use crate::config::SourceConfig;
use crate::error::{Error, Result};
use crate::record::ChemicalRecord;

/// A fetched response: status code plus body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: Bytes,
}

impl Response {
    #[must_use]
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// `true` for 2xx statuses.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Abstraction over GET requests, so the cache and tests can stand in for
/// the network.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Performs a GET. Non-2xx statuses are returned, not treated as errors;
    /// only transport failures are `Err`.
    async fn get(&self, url: &str) -> Result<Response>;
}

/// Network fetcher backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Builds a fetcher with the configured connect timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &SourceConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .pool_max_idle_per_host(4)
            .build()?;
        Ok(Self { client })
    }

    /// Wraps an existing client.
    #[must_use]
    pub const fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn get(&self, url: &str) -> Result<Response> {
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;
        log::debug!("GET {url} -> {status} ({} bytes)", body.len());
        Ok(Response { status, body })
    }
}

/// Fetches and decodes the record document at `url`.
///
/// # Errors
///
/// Returns [`Error::Status`] for a non-2xx response, [`Error::Http`] for a
/// transport failure, and [`Error::Json`] if the body is not a JSON array of
/// records.
pub async fn fetch_records(fetcher: &dyn Fetcher, url: &str) -> Result<Vec<ChemicalRecord>> {
    let response = fetcher.get(url).await?;
    if !response.is_success() {
        return Err(Error::Status {
            url: url.to_string(),
            status: response.status,
        });
    }
    Ok(serde_json::from_slice(&response.body)?)
}
