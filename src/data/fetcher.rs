//! Sheet endpoint client
//!
//! This module fetches the integration payload from the published sheet
//! endpoint, normalizes it, and keeps the result in a [`CacheManager`].
//! When the endpoint is unreachable the last good dataset is served instead.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::Duration;
use reqwest::Client;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use super::normalize::normalize_payload;
use super::raw::ApiPayload;
use super::Dataset;
use crate::cache::{CacheManager, CacheStatus, Clock, SystemClock, DEFAULT_TTL_SECS};

/// Errors that can occur when fetching the dataset
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request could not be sent or its body could not be read
    #[error("Request failed: {0}")]
    Transport(String),

    /// The endpoint answered with a non-success status
    #[error("HTTP {status}: {reason}")]
    Http { status: u16, reason: String },

    /// The endpoint answered 2xx but reported `status: "error"`
    #[error("Sheet endpoint reported an error: {0}")]
    Server(String),

    /// The body was not JSON or lacked the expected sheets
    #[error("Failed to parse response: {0}")]
    Parse(String),
}

impl FetchError {
    /// Whether serving a stale dataset is an acceptable answer to this error
    ///
    /// A malformed payload points at a schema mismatch and is surfaced.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, FetchError::Parse(_))
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Transport(err.to_string())
    }
}

/// Status line and body of an HTTP response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub reason: String,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs the single GET the fetcher needs
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> Result<HttpResponse, FetchError>;
}

/// [`Transport`] backed by a reqwest client
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transport with a custom HTTP client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Creates a transport with an optional overall request timeout
    pub fn with_timeout(timeout: Option<StdDuration>) -> Result<Self, FetchError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self::with_client(builder.build()?))
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse, FetchError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        Ok(HttpResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
            body,
        })
    }
}

/// Settings for a [`DataFetcher`]
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// URL of the published sheet endpoint
    pub endpoint: String,
    /// How long a fetched dataset is served without refetching
    pub ttl: Duration,
    /// Overall request timeout; `None` leaves the client default
    pub timeout: Option<StdDuration>,
}

impl FetchConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ttl: Duration::seconds(DEFAULT_TTL_SECS),
            timeout: None,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<StdDuration>) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Decodes a response body into the wire payload
///
/// The `status` field is checked before the shape so an error payload,
/// which carries no sheets, is reported as [`FetchError::Server`].
pub fn decode_payload(body: &str) -> Result<ApiPayload, FetchError> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| FetchError::Parse(e.to_string()))?;

    if value.get("status").and_then(|s| s.as_str()) == Some("error") {
        let message = value
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("no message given")
            .to_string();
        return Err(FetchError::Server(message));
    }

    serde_json::from_value(value).map_err(|e| FetchError::Parse(e.to_string()))
}

/// Fetches and caches the integration dataset
///
/// Fetches are serialized: a call that arrives while another is talking to
/// the endpoint waits for it and then re-checks the cache, so overlapping
/// callers share one request.
pub struct DataFetcher {
    endpoint: String,
    transport: Arc<dyn Transport>,
    cache: Mutex<CacheManager>,
    in_flight: Mutex<()>,
}

impl DataFetcher {
    /// Creates a fetcher using reqwest and the system clock
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let transport = ReqwestTransport::with_timeout(config.timeout)?;
        let cache = CacheManager::with_clock(config.ttl, Arc::new(SystemClock));
        Ok(Self::with_parts(config.endpoint.clone(), Arc::new(transport), cache))
    }

    /// Creates a fetcher from explicit parts
    pub fn with_parts(
        endpoint: impl Into<String>,
        transport: Arc<dyn Transport>,
        cache: CacheManager,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            transport,
            cache: Mutex::new(cache),
            in_flight: Mutex::new(()),
        }
    }

    /// Creates a fetcher with a custom transport and clock
    pub fn with_transport(
        config: &FetchConfig,
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self::with_parts(
            config.endpoint.clone(),
            transport,
            CacheManager::with_clock(config.ttl, clock),
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Returns the dataset, from cache when fresh
    ///
    /// # Behavior
    /// - Fresh cache: returned without a request
    /// - Otherwise one GET; on success the dataset is normalized and cached
    /// - Transport, HTTP and server errors fall back to the stale entry if
    ///   there is one
    /// - Parse errors, and any error with an empty cache, are returned
    pub async fn fetch_all(&self) -> Result<Arc<Dataset>, FetchError> {
        let _guard = self.in_flight.lock().await;
        self.fetch_serialized().await
    }

    /// Drops the cached dataset and fetches a new one
    ///
    /// With the cache cleared there is nothing to fall back to, so any
    /// failure is returned.
    pub async fn refresh(&self) -> Result<Arc<Dataset>, FetchError> {
        let _guard = self.in_flight.lock().await;
        self.clear_cache().await;
        info!("Refreshing dataset");
        self.fetch_serialized().await
    }

    /// Drops the cached dataset
    pub async fn clear_cache(&self) {
        self.cache.lock().await.clear();
        info!("Dataset cache cleared");
    }

    pub async fn cache_status(&self) -> CacheStatus {
        self.cache.lock().await.status()
    }

    /// Body of [`fetch_all`](Self::fetch_all); callers must hold `in_flight`
    async fn fetch_serialized(&self) -> Result<Arc<Dataset>, FetchError> {
        {
            let cache = self.cache.lock().await;
            if cache.is_fresh() {
                if let Some(entry) = cache.get() {
                    debug!(cached_at = %entry.cached_at, "Dataset cache hit");
                    return Ok(entry.data.clone());
                }
            }
        }

        info!(endpoint = %self.endpoint, "Fetching dataset");
        match self.fetch_from_endpoint().await {
            Ok(dataset) => {
                let data = Arc::new(dataset);
                self.cache.lock().await.put(data.clone());
                info!(
                    employees = data.employees.len(),
                    accounts = data.accounts.len(),
                    metrics = data.metrics.len(),
                    "Dataset loaded and cached"
                );
                Ok(data)
            }
            Err(err) if err.is_recoverable() => {
                let stale = self
                    .cache
                    .lock()
                    .await
                    .get()
                    .map(|entry| (entry.data.clone(), entry.cached_at));
                match stale {
                    Some((data, cached_at)) => {
                        warn!(error = %err, %cached_at, "Fetch failed, serving stale dataset");
                        Ok(data)
                    }
                    None => {
                        error!(error = %err, "Fetch failed and no cached dataset is available");
                        Err(err)
                    }
                }
            }
            Err(err) => {
                error!(error = %err, "Fetch returned an unusable payload");
                Err(err)
            }
        }
    }

    /// Performs the request and normalizes the payload
    async fn fetch_from_endpoint(&self) -> Result<Dataset, FetchError> {
        let response = self.transport.get(&self.endpoint).await?;
        if !response.is_success() {
            return Err(FetchError::Http {
                status: response.status,
                reason: response.reason,
            });
        }

        let payload = decode_payload(&response.body)?;
        Ok(normalize_payload(&payload))
    }
}
