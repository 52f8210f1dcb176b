//! Off-chain metadata retrieval
//!
//! - [`resolver`] - content locator to gateway URL resolution
//! - [`fetcher`] - per-record document fetch with gateway fallback

pub mod fetcher;
pub mod resolver;

use async_trait::async_trait;
use std::sync::Arc;

use crate::models::MetadataDocument;

pub use fetcher::MetadataFetcher;
pub use resolver::{Candidate, ContentResolver, Gateway, Locator};

/// Anything that can turn a content locator into a metadata document
///
/// Implementations absorb their own failures: `None` means "no metadata
/// available" and is never an error for the caller.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    async fn fetch_metadata(&self, locator: &str) -> Option<MetadataDocument>;
}

#[async_trait]
impl<T: MetadataSource + ?Sized> MetadataSource for Arc<T> {
    async fn fetch_metadata(&self, locator: &str) -> Option<MetadataDocument> {
        (**self).fetch_metadata(locator).await
    }
}
