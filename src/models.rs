// Core data structures for the mint feed

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::utils::error::IndexerError;

/// A mint event as returned by the subgraph, before metadata enrichment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseRecord {
    pub id: String,
    pub token_id: String,
    pub creator: String,
    pub minter: String,
    #[serde(rename = "tokenURI")]
    pub content_locator: String,
    pub block_number: String,
    pub block_timestamp: String, // unix seconds
    pub transaction_hash: String,
}

/// Off-chain metadata document. Every field is optional.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MetadataDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Content locator of the artwork
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Vec<Attribute>>,
}

/// One `{trait_type, value}` pair
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Attribute {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trait_type: Option<String>,

    /// Usually a string, but numbers and booleans show up in the wild
    #[serde(default)]
    pub value: serde_json::Value,
}

impl Attribute {
    /// Value rendered as plain text (strings without quotes)
    pub fn value_text(&self) -> String {
        match &self.value {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

/// A base record combined with its (possibly absent) metadata
///
/// `metadata == None` means the metadata fetch failed or there was no
/// locator. It is a displayable state, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedRecord {
    #[serde(flatten)]
    pub base: BaseRecord,

    pub metadata: Option<MetadataDocument>,
}

impl MergedRecord {
    /// Combine a base record with a fetch outcome
    pub fn new(base: BaseRecord, metadata: Option<MetadataDocument>) -> Self {
        Self { base, metadata }
    }

    pub fn id(&self) -> &str {
        &self.base.id
    }

    /// `metadata.name`, or `NFT #<tokenId>` when there is none
    pub fn display_name(&self) -> String {
        self.metadata
            .as_ref()
            .and_then(|m| m.name.as_deref())
            .filter(|name| !name.trim().is_empty())
            .map(String::from)
            .unwrap_or_else(|| format!("NFT #{}", self.base.token_id))
    }

    /// Image locator from the metadata, if any
    pub fn image_locator(&self) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|m| m.image.as_deref())
            .filter(|image| !image.trim().is_empty())
    }
}

/// Failure detail of the last indexing attempt, for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub message: String,

    /// GraphQL-level errors reported by the subgraph
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub protocol_errors: Vec<String>,

    /// Network or HTTP status failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transport_error: Option<String>,
}

impl ErrorDetail {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            protocol_errors: Vec::new(),
            transport_error: None,
        }
    }
}

impl From<&IndexerError> for ErrorDetail {
    fn from(err: &IndexerError) -> Self {
        let message = err.to_string();
        match err {
            IndexerError::GraphQl(messages) => Self {
                message,
                protocol_errors: messages.clone(),
                transport_error: None,
            },
            IndexerError::Decode(reason) => Self {
                message,
                protocol_errors: vec![reason.clone()],
                transport_error: None,
            },
            IndexerError::Http(_) | IndexerError::Status(_) | IndexerError::Timeout => Self {
                transport_error: Some(message.clone()),
                message,
                protocol_errors: Vec::new(),
            },
        }
    }
}

/// State of the merged batch as seen by consumers
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "data", rename_all = "lowercase")]
pub enum BatchState {
    /// Nothing has been attempted yet
    Idle,
    /// A cycle is running and there is no displayable batch
    Loading,
    Ready(Arc<Vec<MergedRecord>>),
    /// The indexing request itself failed
    Errored(ErrorDetail),
}

impl BatchState {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    pub fn is_errored(&self) -> bool {
        matches!(self, Self::Errored(_))
    }

    pub fn records(&self) -> Option<&Arc<Vec<MergedRecord>>> {
        match self {
            Self::Ready(records) => Some(records),
            _ => None,
        }
    }

    /// Short label, also used in logs
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Ready(_) => "ready",
            Self::Errored(_) => "errored",
        }
    }
}

/// Subgraph block pointer from `_meta`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockInfo {
    pub number: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

/// Subgraph health from `_meta`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexerMeta {
    pub has_indexing_errors: bool,
    pub block: BlockInfo,
}

/// A creator reward payout event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatorReward {
    pub id: String,
    pub creator: String,
    pub amount: String,
    pub nft_token_id: String,
    pub block_number: String,
    pub block_timestamp: String,
    pub transaction_hash: String,
}

/// Mint entry in a creator's stats
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatorMint {
    pub id: String,
    pub token_id: String,
    #[serde(rename = "tokenURI")]
    pub content_locator: String,
    pub block_timestamp: String,
}

/// Reward entry in a creator's stats
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatorRewardEntry {
    pub id: String,
    pub amount: String,
    pub block_timestamp: String,
}

/// Everything the subgraph knows about one creator
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CreatorStats {
    pub mints: Vec<CreatorMint>,
    pub rewards: Vec<CreatorRewardEntry>,
}

impl CreatorStats {
    /// Sum of reward amounts in wei; non-numeric amounts are skipped
    pub fn total_rewards(&self) -> u128 {
        self.rewards
            .iter()
            .filter_map(|r| r.amount.parse::<u128>().ok())
            .fold(0u128, |acc, amount| acc.saturating_add(amount))
    }
}

/// Moment a snapshot was produced
pub type Timestamp = DateTime<Utc>;
