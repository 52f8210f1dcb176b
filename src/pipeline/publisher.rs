//! Result cache and change publisher
//!
//! Holds the current [`FeedSnapshot`] in a `tokio::sync::watch` channel.
//! Readers get the latest value synchronously and are woken on every state
//! transition. A `Ready` batch deep-equal to the one already published is
//! not re-announced.
//!
//! Every cycle takes a generation from [`Publisher::begin_cycle`]; results
//! carrying any generation other than the latest started one are dropped, so
//! a slow old cycle can never overwrite a newer one.

use chrono::Utc;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

use crate::models::{BatchState, ErrorDetail, MergedRecord, Timestamp};

/// What subscribers observe
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedSnapshot {
    /// Generation of the cycle that produced this snapshot (0 = none yet)
    pub generation: u64,

    pub state: BatchState,

    /// Last successfully merged batch; survives an `Errored` state
    pub last_ready: Option<Arc<Vec<MergedRecord>>>,

    /// Detail of the most recent indexing failure, cleared on success
    pub last_error: Option<ErrorDetail>,

    pub updated_at: Option<Timestamp>,
}

impl FeedSnapshot {
    fn initial() -> Self {
        Self {
            generation: 0,
            state: BatchState::Idle,
            last_ready: None,
            last_error: None,
            updated_at: None,
        }
    }

    /// Records to display: the current batch, or the last good one
    pub fn records(&self) -> &[MergedRecord] {
        match (&self.state, &self.last_ready) {
            (BatchState::Ready(records), _) => records.as_slice(),
            (_, Some(records)) => records.as_slice(),
            _ => &[],
        }
    }
}

/// Result of a publish call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishResult {
    /// State changed and subscribers were notified
    Published,
    /// Content-identical to the current state; nobody was notified
    Unchanged,
    /// A newer cycle has started since this one
    Stale,
    /// Nobody is listening; result dropped
    NoSubscribers,
}

/// Single writer of the feed state
#[derive(Debug)]
pub struct Publisher {
    sender: watch::Sender<FeedSnapshot>,
    latest_started: AtomicU64,
}

impl Default for Publisher {
    fn default() -> Self {
        Self::new()
    }
}

impl Publisher {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(FeedSnapshot::initial());
        Self {
            sender,
            latest_started: AtomicU64::new(0),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<FeedSnapshot> {
        self.sender.subscribe()
    }

    /// Copy of the current snapshot
    pub fn snapshot(&self) -> FeedSnapshot {
        self.sender.borrow().clone()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Resolves once every subscriber is gone
    pub async fn closed(&self) {
        self.sender.closed().await
    }

    /// Start a new cycle and return its generation
    pub fn begin_cycle(&self) -> u64 {
        self.latest_started.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn latest_generation(&self) -> u64 {
        self.latest_started.load(Ordering::SeqCst)
    }

    fn check(&self, generation: u64) -> Option<PublishResult> {
        if generation != self.latest_generation() {
            debug!(
                generation,
                latest = self.latest_generation(),
                "Dropping result of superseded cycle"
            );
            return Some(PublishResult::Stale);
        }
        if self.subscriber_count() == 0 {
            debug!(generation, "Dropping result, no subscribers");
            return Some(PublishResult::NoSubscribers);
        }
        None
    }

    /// Enter `Loading`, but only when there is nothing displayable
    ///
    /// A `Ready` batch stays visible while the next cycle runs.
    pub fn mark_loading(&self, generation: u64) -> PublishResult {
        if let Some(rejected) = self.check(generation) {
            return rejected;
        }

        let mut result = PublishResult::Unchanged;
        self.sender.send_if_modified(|snapshot| {
            if matches!(snapshot.state, BatchState::Idle | BatchState::Errored(_)) {
                snapshot.generation = generation;
                snapshot.state = BatchState::Loading;
                snapshot.updated_at = Some(Utc::now());
                result = PublishResult::Published;
                true
            } else {
                false
            }
        });
        result
    }

    /// Publish a merged batch
    pub fn publish_ready(&self, generation: u64, records: Vec<MergedRecord>) -> PublishResult {
        if let Some(rejected) = self.check(generation) {
            return rejected;
        }

        let mut result = PublishResult::Unchanged;
        self.sender.send_if_modified(|snapshot| {
            if let BatchState::Ready(current) = &snapshot.state {
                if current.as_slice() == records.as_slice() {
                    return false;
                }
            }

            let batch = Arc::new(records);
            snapshot.generation = generation;
            snapshot.state = BatchState::Ready(Arc::clone(&batch));
            snapshot.last_ready = Some(batch);
            snapshot.last_error = None;
            snapshot.updated_at = Some(Utc::now());
            result = PublishResult::Published;
            true
        });
        result
    }

    /// Publish an indexing failure; the last good batch stays readable
    pub fn publish_error(&self, generation: u64, detail: ErrorDetail) -> PublishResult {
        if let Some(rejected) = self.check(generation) {
            return rejected;
        }

        let mut result = PublishResult::Unchanged;
        self.sender.send_if_modified(|snapshot| {
            if matches!(&snapshot.state, BatchState::Errored(current) if *current == detail) {
                return false;
            }

            snapshot.generation = generation;
            snapshot.state = BatchState::Errored(detail.clone());
            snapshot.last_error = Some(detail);
            snapshot.updated_at = Some(Utc::now());
            result = PublishResult::Published;
            true
        });
        result
    }
}
