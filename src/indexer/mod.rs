//! Indexing collaborator: the subgraph that records mint events
//!
//! - [`client`] - GraphQL-over-HTTP client
//! - [`query`] - GraphQL documents and paging types

pub mod client;
pub mod query;

use async_trait::async_trait;
use std::sync::Arc;

use crate::models::{BaseRecord, IndexerMeta};
use crate::utils::error::IndexerError;

pub use client::SubgraphClient;
pub use query::{OrderBy, OrderDirection, PageRequest};

/// Source of base records for the poller
#[async_trait]
pub trait IndexSource: Send + Sync {
    /// One page of mint records, in the order the source returns them
    async fn fetch_records(&self, page: &PageRequest) -> Result<Vec<BaseRecord>, IndexerError>;

    /// Lightweight health probe
    async fn meta(&self) -> Result<IndexerMeta, IndexerError>;
}

#[async_trait]
impl<T: IndexSource + ?Sized> IndexSource for Arc<T> {
    async fn fetch_records(&self, page: &PageRequest) -> Result<Vec<BaseRecord>, IndexerError> {
        (**self).fetch_records(page).await
    }

    async fn meta(&self) -> Result<IndexerMeta, IndexerError> {
        (**self).meta().await
    }
}

/// Check that a string is a 20-byte hex address (`0x` + 40 hex digits)
pub fn is_address(value: &str) -> bool {
    value.len() == 42
        && (value.starts_with("0x") || value.starts_with("0X"))
        && value[2..].chars().all(|c| c.is_ascii_hexdigit())
}
