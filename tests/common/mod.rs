//! Common test utilities

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use mintfeed::indexer::{IndexSource, PageRequest};
use mintfeed::metadata::MetadataSource;
use mintfeed::models::{BaseRecord, BlockInfo, IndexerMeta, MetadataDocument};
use mintfeed::utils::error::IndexerError;

/// A valid CIDv0
pub const CID_A: &str = "QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG";
pub const CID_B: &str = "QmT78zSuBmuS4z925WZfrqQ1qHaJ56DQaTfyMUF7F8ff5o";

/// Create a base record with the given locator
pub fn create_record(id: &str, locator: &str) -> BaseRecord {
    BaseRecord {
        id: id.to_string(),
        token_id: id.to_string(),
        creator: "0x27AfcC1b6C645acF64b67f19C98ed48641aC37A8".to_string(),
        minter: "0x2222222222222222222222222222222222222222".to_string(),
        content_locator: locator.to_string(),
        block_number: "100".to_string(),
        block_timestamp: "1700000000".to_string(),
        transaction_hash: format!("0xtx{id}"),
    }
}

pub fn named(name: &str) -> MetadataDocument {
    MetadataDocument {
        name: Some(name.to_string()),
        ..Default::default()
    }
}

// ============================================================================
// Scripted Indexer
// ============================================================================

/// One scripted indexer reply
#[derive(Debug, Clone)]
pub enum Reply {
    Records(Vec<BaseRecord>),
    Status(u16),
    GraphQl(Vec<String>),
}

impl Reply {
    fn into_result(self) -> Result<Vec<BaseRecord>, IndexerError> {
        match self {
            Reply::Records(records) => Ok(records),
            Reply::Status(code) => Err(IndexerError::Status(code)),
            Reply::GraphQl(messages) => Err(IndexerError::GraphQl(messages)),
        }
    }
}

/// Indexer that answers from a script; the last step repeats forever
pub struct ScriptedIndex {
    script: Mutex<VecDeque<(Duration, Reply)>>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedIndex {
    pub fn new(script: Vec<(Duration, Reply)>) -> Self {
        assert!(!script.is_empty(), "script needs at least one step");
        Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn always(reply: Reply) -> Self {
        Self::new(vec![(Duration::ZERO, reply)])
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn next_step(&self) -> (Duration, Reply) {
        let mut script = self.script.lock().unwrap();
        if script.len() > 1 {
            script.pop_front().unwrap()
        } else {
            script.front().cloned().unwrap()
        }
    }
}

#[async_trait]
impl IndexSource for ScriptedIndex {
    async fn fetch_records(&self, _page: &PageRequest) -> Result<Vec<BaseRecord>, IndexerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let (delay, reply) = self.next_step();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        reply.into_result()
    }

    async fn meta(&self) -> Result<IndexerMeta, IndexerError> {
        Ok(IndexerMeta {
            has_indexing_errors: false,
            block: BlockInfo {
                number: 4242,
                hash: Some("0xblock".to_string()),
            },
        })
    }
}

// ============================================================================
// Static Metadata
// ============================================================================

/// Metadata source backed by a map; unknown locators yield `None`
#[derive(Default)]
pub struct StaticMetadata {
    documents: HashMap<String, MetadataDocument>,
    calls: AtomicUsize,
}

impl StaticMetadata {
    pub fn new(documents: impl IntoIterator<Item = (String, MetadataDocument)>) -> Self {
        Self {
            documents: documents.into_iter().collect(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetadataSource for StaticMetadata {
    async fn fetch_metadata(&self, locator: &str) -> Option<MetadataDocument> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.documents.get(locator).cloned()
    }
}
