//! mintfeed - Live NFT mint feed
//!
//! Polls a subgraph for recent mint events, resolves each record's content
//! locator through IPFS gateways, merges the metadata documents in and
//! publishes the result to subscribers.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and settings
//! - [`indexer`] - Subgraph GraphQL client
//! - [`metadata`] - Content locator resolution and gateway fallback fetching
//! - [`pipeline`] - Fan-out merge, poll loop and result publishing
//! - [`server`] - HTTP API over the published feed
//! - [`models`] - Core data structures and types
//! - [`display`] - Presentation helpers
//! - [`metrics`] - Prometheus metrics
//! - [`utils`] - Common utilities and helpers
//!
//! # Example
//!
//! ```no_run
//! use mintfeed::config::Config;
//! use mintfeed::pipeline::Poller;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let (mut feed, poller) = Poller::from_config(&config)?.spawn();
//!     let snapshot = feed.changed().await?;
//!     println!("{} records", snapshot.records().len());
//!     poller.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod display;
pub mod error;
pub mod indexer;
pub mod metadata;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod server;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{Error, ErrorCategory, MintfeedErrorTrait, Result};
    pub use crate::indexer::{IndexSource, PageRequest, SubgraphClient};
    pub use crate::metadata::{ContentResolver, MetadataFetcher, MetadataSource};
    pub use crate::models::{BaseRecord, BatchState, MergedRecord, MetadataDocument};
    pub use crate::pipeline::{FeedHandle, FeedSnapshot, Poller, PollerHandle};
}

// Direct re-exports for convenience
pub use models::{BaseRecord, BatchState, MergedRecord, MetadataDocument};
