//! Concurrent metadata fan-out
//!
//! Every record's metadata fetch is started at once and awaited together on
//! the calling task. The output has the same length and order as the input;
//! a record whose fetch failed keeps its place with `metadata == None`.

use futures::future::join_all;
use tracing::debug;

use crate::metadata::MetadataSource;
use crate::models::{BaseRecord, MergedRecord};

/// Merges base records with their metadata documents
#[derive(Debug, Clone)]
pub struct FanOutMerger<M> {
    source: M,
}

impl<M: MetadataSource> FanOutMerger<M> {
    pub fn new(source: M) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &M {
        &self.source
    }

    /// Fetch metadata for every record concurrently and merge
    pub async fn merge(&self, records: Vec<BaseRecord>) -> Vec<MergedRecord> {
        let fetches = records
            .iter()
            .map(|record| self.source.fetch_metadata(&record.content_locator));
        let documents = join_all(fetches).await;

        let merged: Vec<MergedRecord> = records
            .into_iter()
            .zip(documents)
            .map(|(base, metadata)| MergedRecord::new(base, metadata))
            .collect();

        debug!(
            records = merged.len(),
            without_metadata = merged.iter().filter(|r| r.metadata.is_none()).count(),
            "Merged batch"
        );

        merged
    }
}
