//! Aggregation pipeline
//!
//! - [`merger`] - concurrent metadata fan-out over one batch
//! - [`publisher`] - latest-result cache with change notification
//! - [`poller`] - the periodic cycle and its handles

pub mod merger;
pub mod poller;
pub mod publisher;

pub use merger::FanOutMerger;
pub use poller::{CycleOutcome, FeedHandle, PollSettings, Poller, PollerHandle};
pub use publisher::{FeedSnapshot, PublishResult, Publisher};
