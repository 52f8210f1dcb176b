//! Metadata document fetcher with gateway fallback
//!
//! Tries each candidate URL produced by the [`ContentResolver`] in order,
//! each attempt bounded by its own timeout. Every failed attempt is logged
//! and counted, then the next candidate is tried. When every candidate fails
//! the result is `None`: the record is still shown, just without metadata.

use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT},
    Client,
};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::GatewayConfig;
use crate::metrics;
use crate::models::MetadataDocument;
use crate::utils::error::FetchError;

use super::resolver::{Candidate, ContentResolver};
use super::MetadataSource;

/// Fetches metadata documents from HTTP(S) URLs and IPFS gateways
#[derive(Debug, Clone)]
pub struct MetadataFetcher {
    /// HTTP client shared by all attempts
    client: Client,

    /// Turns locators into candidate URLs
    resolver: ContentResolver,

    /// Upper bound for one attempt (connect + headers + body)
    attempt_timeout: Duration,
}

impl MetadataFetcher {
    /// Create a fetcher with a custom resolver and timeout
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Http` if the HTTP client cannot be created
    pub fn new(
        resolver: ContentResolver,
        attempt_timeout: Duration,
        user_agent: &str,
    ) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .connect_timeout(attempt_timeout)
            .gzip(true)
            .build()?;

        Ok(Self {
            client,
            resolver,
            attempt_timeout,
        })
    }

    /// Create a fetcher from the gateway section of the configuration
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Http` if the HTTP client cannot be created
    pub fn from_config(config: &GatewayConfig) -> Result<Self, FetchError> {
        Self::new(
            ContentResolver::from_config(config),
            config.attempt_timeout(),
            &config.user_agent,
        )
    }

    pub fn resolver(&self) -> &ContentResolver {
        &self.resolver
    }

    /// Fetch the metadata document for a locator
    ///
    /// Never fails: unresolvable locators and exhausted candidates both
    /// produce `None`. Empty locators return without any network call.
    pub async fn fetch(&self, locator: &str) -> Option<MetadataDocument> {
        let candidates = self.resolver.resolve(locator);
        if candidates.is_empty() {
            debug!(locator = %locator, "Locator has no fetchable candidates");
            metrics::record_metadata_outcome("unresolvable");
            return None;
        }

        let total = candidates.len();
        for (attempt, candidate) in candidates.iter().enumerate() {
            match self.fetch_candidate(candidate).await {
                Ok(document) => {
                    debug!(
                        locator = %locator,
                        url = %candidate.url,
                        gateway = %candidate.source(),
                        attempt = attempt + 1,
                        "Fetched metadata"
                    );
                    metrics::record_metadata_attempt(candidate.source(), "success");
                    metrics::record_metadata_outcome("fetched");
                    return Some(document);
                }
                Err(e) => {
                    warn!(
                        locator = %locator,
                        url = %candidate.url,
                        gateway = %candidate.source(),
                        attempt = attempt + 1,
                        candidates = total,
                        error = %e,
                        "Metadata fetch attempt failed"
                    );
                    metrics::record_metadata_attempt(candidate.source(), e.kind());
                }
            }
        }

        warn!(locator = %locator, candidates = total, "All metadata candidates failed");
        metrics::record_metadata_outcome("failed");
        None
    }

    /// Make a single bounded attempt against one candidate
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Timeout` when the attempt outlives the per-attempt
    /// timeout, `FetchError::Status` for non-success responses and
    /// `FetchError::Decode` for bodies that are not a metadata document
    pub async fn fetch_candidate(&self, candidate: &Candidate) -> Result<MetadataDocument, FetchError> {
        match tokio::time::timeout(self.attempt_timeout, self.attempt(candidate)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout),
        }
    }

    async fn attempt(&self, candidate: &Candidate) -> Result<MetadataDocument, FetchError> {
        let mut request = self
            .client
            .get(&candidate.url)
            .headers(Self::build_headers());
        if let Some(token) = &candidate.bearer {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_builder() {
                FetchError::InvalidUrl(candidate.url.clone())
            } else if e.is_timeout() {
                FetchError::Timeout
            } else {
                FetchError::Http(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let bytes = response.bytes().await?;
        Self::parse_document(&bytes)
    }

    /// Parse a response body as a metadata document
    ///
    /// Any JSON object is accepted; missing fields are simply absent.
    /// Arrays and scalars are malformed.
    pub fn parse_document(bytes: &[u8]) -> Result<MetadataDocument, FetchError> {
        let value: serde_json::Value =
            serde_json::from_slice(bytes).map_err(|e| FetchError::Decode(e.to_string()))?;

        if !value.is_object() {
            return Err(FetchError::Decode("metadata body is not a JSON object".to_string()));
        }

        serde_json::from_value(value).map_err(|e| FetchError::Decode(e.to_string()))
    }

    fn build_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json, text/plain;q=0.9, */*;q=0.8"),
        );
        headers
    }
}

#[async_trait]
impl MetadataSource for MetadataFetcher {
    async fn fetch_metadata(&self, locator: &str) -> Option<MetadataDocument> {
        self.fetch(locator).await
    }
}
