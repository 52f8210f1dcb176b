//! HTTP client for the subgraph GraphQL endpoint

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use crate::config::IndexerConfig;
use crate::models::{
    BaseRecord, CreatorMint, CreatorReward, CreatorRewardEntry, CreatorStats, IndexerMeta,
};
use crate::utils::error::IndexerError;

use super::query::{self, PageRequest};
use super::IndexSource;

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Debug, Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
    variables: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlErrorEntry>,
}

#[derive(Debug, Deserialize)]
struct GraphQlErrorEntry {
    message: String,
}

#[derive(Debug, Deserialize)]
struct MintsData {
    nftminteds: Vec<BaseRecord>,
}

#[derive(Debug, Deserialize)]
struct MetaData {
    #[serde(rename = "_meta")]
    meta: IndexerMeta,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RewardsData {
    creator_rewardeds: Vec<CreatorReward>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatorStatsData {
    nftminteds: Vec<CreatorMint>,
    creator_rewardeds: Vec<CreatorRewardEntry>,
}

// ============================================================================
// Subgraph Client
// ============================================================================

/// Client for the subgraph GraphQL endpoint
#[derive(Debug, Clone)]
pub struct SubgraphClient {
    http: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl SubgraphClient {
    /// Create a client from the indexer configuration
    ///
    /// # Errors
    ///
    /// Returns `IndexerError::Http` if the HTTP client cannot be created
    pub fn new(config: &IndexerConfig) -> Result<Self, IndexerError> {
        let http = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(concat!("mintfeed/", env!("CARGO_PKG_VERSION")))
            .gzip(true)
            .build()?;

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Run a GraphQL document and decode its `data` member
    async fn execute<T: DeserializeOwned>(
        &self,
        document: &str,
        variables: serde_json::Value,
    ) -> Result<T, IndexerError> {
        let body = GraphQlRequest {
            query: document,
            variables,
        };

        let mut request = self.http.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                IndexerError::Timeout
            } else {
                IndexerError::Http(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(endpoint = %self.endpoint, status = %status, "Subgraph returned error status");
            return Err(IndexerError::Status(status.as_u16()));
        }

        let bytes = response.bytes().await?;
        Self::decode(&bytes)
    }

    /// Decode a GraphQL response envelope
    ///
    /// Any entry in `errors` fails the call, even when partial `data` is
    /// present.
    fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, IndexerError> {
        let envelope: GraphQlResponse<T> =
            serde_json::from_slice(bytes).map_err(|e| IndexerError::Decode(e.to_string()))?;

        if !envelope.errors.is_empty() {
            let messages: Vec<String> = envelope.errors.into_iter().map(|e| e.message).collect();
            return Err(IndexerError::GraphQl(messages));
        }

        envelope
            .data
            .ok_or_else(|| IndexerError::Decode("response has no data".to_string()))
    }

    /// Fetch one page of mint records
    pub async fn mint_records(&self, page: &PageRequest) -> Result<Vec<BaseRecord>, IndexerError> {
        let document = query::mints_query(page);
        let data: MintsData = self
            .execute(&document, json!({ "first": page.first, "skip": page.skip }))
            .await?;

        debug!(count = data.nftminteds.len(), first = page.first, skip = page.skip, "Fetched mint records");
        Ok(data.nftminteds)
    }

    /// Fetch subgraph health
    pub async fn meta(&self) -> Result<IndexerMeta, IndexerError> {
        let data: MetaData = self.execute(query::META_QUERY, json!({})).await?;
        Ok(data.meta)
    }

    /// Fetch one page of creator reward events
    pub async fn creator_rewards(&self, page: &PageRequest) -> Result<Vec<CreatorReward>, IndexerError> {
        let document = query::rewards_query(page);
        let data: RewardsData = self
            .execute(&document, json!({ "first": page.first, "skip": page.skip }))
            .await?;
        Ok(data.creator_rewardeds)
    }

    /// Fetch mints and rewards of one creator
    ///
    /// The address is lowercased, which is how the subgraph stores `Bytes`.
    pub async fn creator_stats(&self, creator: &str) -> Result<CreatorStats, IndexerError> {
        let data: CreatorStatsData = self
            .execute(
                query::CREATOR_STATS_QUERY,
                json!({ "creator": creator.to_ascii_lowercase() }),
            )
            .await?;

        Ok(CreatorStats {
            mints: data.nftminteds,
            rewards: data.creator_rewardeds,
        })
    }
}

#[async_trait]
impl IndexSource for SubgraphClient {
    async fn fetch_records(&self, page: &PageRequest) -> Result<Vec<BaseRecord>, IndexerError> {
        self.mint_records(page).await
    }

    async fn meta(&self) -> Result<IndexerMeta, IndexerError> {
        SubgraphClient::meta(self).await
    }
}
