//! GraphQL documents sent to the subgraph
//!
//! Ordering is spliced in from closed enums rather than passed as variables,
//! because the enum type names (`NFTMinted_orderBy`, ...) depend on the
//! deployed schema.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sortable fields shared by the event entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OrderBy {
    #[default]
    BlockTimestamp,
    BlockNumber,
}

impl OrderBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BlockTimestamp => "blockTimestamp",
            Self::BlockNumber => "blockNumber",
        }
    }
}

impl fmt::Display for OrderBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderDirection {
    Asc,
    #[default]
    Desc,
}

impl OrderDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Paging and ordering of a list query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub first: u32,
    pub skip: u32,
    pub order_by: OrderBy,
    pub order_direction: OrderDirection,
}

impl PageRequest {
    /// Newest-first page of `first` records
    pub fn latest(first: u32) -> Self {
        Self {
            first,
            skip: 0,
            order_by: OrderBy::BlockTimestamp,
            order_direction: OrderDirection::Desc,
        }
    }

    pub fn with_skip(mut self, skip: u32) -> Self {
        self.skip = skip;
        self
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::latest(50)
    }
}

/// Connectivity probe
pub const META_QUERY: &str = r#"query SubgraphMeta {
  _meta {
    hasIndexingErrors
    block {
      number
      hash
    }
  }
}"#;

/// Mint events, one page
pub fn mints_query(page: &PageRequest) -> String {
    format!(
        r#"query GetNFTs($first: Int, $skip: Int) {{
  nftminteds(
    first: $first
    skip: $skip
    orderBy: {order_by}
    orderDirection: {order_direction}
  ) {{
    id
    tokenId
    creator
    minter
    tokenURI
    blockNumber
    blockTimestamp
    transactionHash
  }}
}}"#,
        order_by = page.order_by,
        order_direction = page.order_direction,
    )
}

/// Creator reward payouts, one page
pub fn rewards_query(page: &PageRequest) -> String {
    format!(
        r#"query GetCreatorRewards($first: Int, $skip: Int) {{
  creatorRewardeds(
    first: $first
    skip: $skip
    orderBy: {order_by}
    orderDirection: {order_direction}
  ) {{
    id
    creator
    amount
    nftTokenId
    blockNumber
    blockTimestamp
    transactionHash
  }}
}}"#,
        order_by = page.order_by,
        order_direction = page.order_direction,
    )
}

/// Mints and rewards of one creator
pub const CREATOR_STATS_QUERY: &str = r#"query GetCreatorStats($creator: Bytes!) {
  nftminteds(where: { creator: $creator }, orderBy: blockTimestamp, orderDirection: desc) {
    id
    tokenId
    tokenURI
    blockTimestamp
  }
  creatorRewardeds(where: { creator: $creator }, orderBy: blockTimestamp, orderDirection: desc) {
    id
    amount
    blockTimestamp
  }
}"#;
