//! Periodic poll loop
//!
//! One background task owns the cycle: query the indexer, fan out metadata
//! fetches, publish. Ticks and manual refreshes that arrive while a cycle is
//! running join that cycle instead of starting another one, so at most one
//! cycle is in flight at any time.
//!
//! The loop stops when shutdown is requested through either handle, or when
//! every [`FeedHandle`] and subscriber is gone. A cycle already running is
//! allowed to finish; its result is dropped if nobody is left to see it.

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info, info_span, warn, Instrument};

use crate::config::Config;
use crate::error::{Error, MintfeedErrorTrait, Result};
use crate::indexer::{IndexSource, PageRequest, SubgraphClient};
use crate::metadata::{MetadataFetcher, MetadataSource};
use crate::metrics;
use crate::models::{BatchState, ErrorDetail};

use super::merger::FanOutMerger;
use super::publisher::{FeedSnapshot, PublishResult, Publisher};

/// Queued manual refreshes before senders wait
const REFRESH_QUEUE: usize = 16;

// ============================================================================
// Settings & Outcome
// ============================================================================

/// Poll loop settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub page: PageRequest,
}

impl PollSettings {
    pub fn new(interval: Duration, page: PageRequest) -> Self {
        Self { interval, page }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            interval: config.poller.interval(),
            page: PageRequest::latest(config.indexer.page_size),
        }
    }
}

/// What a single cycle did
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CycleOutcome {
    /// A new batch was published
    Published { generation: u64, records: usize },
    /// The batch equals the one already published
    Unchanged { generation: u64, records: usize },
    /// The indexer request failed
    Errored { generation: u64, error: ErrorDetail },
    /// The result was dropped (superseded or no subscribers)
    Discarded { generation: u64 },
}

impl CycleOutcome {
    pub fn generation(&self) -> u64 {
        match self {
            Self::Published { generation, .. }
            | Self::Unchanged { generation, .. }
            | Self::Errored { generation, .. }
            | Self::Discarded { generation } => *generation,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Published { .. } => "published",
            Self::Unchanged { .. } => "unchanged",
            Self::Errored { .. } => "errored",
            Self::Discarded { .. } => "discarded",
        }
    }
}

// ============================================================================
// Poller
// ============================================================================

/// Drives fetch-merge-publish cycles
pub struct Poller<I, M> {
    indexer: I,
    merger: FanOutMerger<M>,
    publisher: Arc<Publisher>,
    settings: PollSettings,
}

impl Poller<SubgraphClient, MetadataFetcher> {
    /// Build the production poller from configuration
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` when the configuration is invalid, in which
    /// case nothing is started.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;

        let indexer = SubgraphClient::new(&config.indexer)?;
        let fetcher = MetadataFetcher::from_config(&config.gateways)?;

        Ok(Self::new(indexer, fetcher, PollSettings::from_config(config)))
    }
}

impl<I, M> Poller<I, M>
where
    I: IndexSource + 'static,
    M: MetadataSource + 'static,
{
    pub fn new(indexer: I, metadata: M, settings: PollSettings) -> Self {
        Self {
            indexer,
            merger: FanOutMerger::new(metadata),
            publisher: Arc::new(Publisher::new()),
            settings,
        }
    }

    pub fn publisher(&self) -> &Arc<Publisher> {
        &self.publisher
    }

    pub fn settings(&self) -> &PollSettings {
        &self.settings
    }

    /// Run one complete cycle
    ///
    /// Safe to call concurrently; the generation guard keeps only the
    /// newest cycle's result.
    pub async fn run_cycle(&self) -> CycleOutcome {
        let generation = self.publisher.begin_cycle();
        let span = info_span!("poll_cycle", generation);

        async move {
            let started = Instant::now();
            self.publisher.mark_loading(generation);

            let outcome = match self.indexer.fetch_records(&self.settings.page).await {
                Ok(records) => {
                    let merged = self.merger.merge(records).await;
                    let count = merged.len();

                    match self.publisher.publish_ready(generation, merged) {
                        PublishResult::Published => {
                            metrics::set_published_records(count);
                            info!(records = count, "Published batch");
                            CycleOutcome::Published {
                                generation,
                                records: count,
                            }
                        }
                        PublishResult::Unchanged => {
                            debug!(records = count, "Batch unchanged");
                            CycleOutcome::Unchanged {
                                generation,
                                records: count,
                            }
                        }
                        PublishResult::Stale | PublishResult::NoSubscribers => {
                            CycleOutcome::Discarded { generation }
                        }
                    }
                }
                Err(e) => {
                    warn!(
                        error = %e,
                        category = e.category().as_str(),
                        "Indexer request failed"
                    );
                    let detail = ErrorDetail::from(&e);

                    match self.publisher.publish_error(generation, detail.clone()) {
                        PublishResult::Published | PublishResult::Unchanged => {
                            CycleOutcome::Errored {
                                generation,
                                error: detail,
                            }
                        }
                        PublishResult::Stale | PublishResult::NoSubscribers => {
                            CycleOutcome::Discarded { generation }
                        }
                    }
                }
            };

            metrics::record_cycle(outcome.label(), started.elapsed().as_secs_f64());
            outcome
        }
        .instrument(span)
        .await
    }

    /// Start the poll loop on a background task
    pub fn spawn(self) -> (FeedHandle, PollerHandle) {
        let (refresh_tx, refresh_rx) = mpsc::channel(REFRESH_QUEUE);
        let (shutdown, shutdown_rx) = watch::channel(false);
        let shutdown = Arc::new(shutdown);
        let receiver = self.publisher.subscribe();

        let feed = FeedHandle {
            receiver,
            refresh_tx,
            shutdown: Arc::clone(&shutdown),
        };

        let task = tokio::spawn(self.run(refresh_rx, shutdown_rx));

        (feed, PollerHandle { task, shutdown })
    }

    async fn run(
        self,
        mut refresh_rx: mpsc::Receiver<oneshot::Sender<CycleOutcome>>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) {
        let mut ticker = interval(self.settings.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            interval_secs = self.settings.interval.as_secs_f64(),
            page_size = self.settings.page.first,
            "Poller started"
        );

        loop {
            let mut waiters = Vec::new();

            tokio::select! {
                biased;
                _ = shutdown_rx.changed() => {
                    info!("Poller shutting down");
                    break;
                }
                _ = self.publisher.closed() => {
                    info!("No subscribers left, poller stopping");
                    break;
                }
                _ = ticker.tick() => {}
                Some(waiter) = refresh_rx.recv() => {
                    debug!("Manual refresh requested");
                    waiters.push(waiter);
                }
            }

            let outcome = self.drive_cycle(&mut refresh_rx, &mut waiters).await;
            for waiter in waiters {
                let _ = waiter.send(outcome.clone());
            }
        }
    }

    /// Run one cycle while collecting refresh requests that join it
    async fn drive_cycle(
        &self,
        refresh_rx: &mut mpsc::Receiver<oneshot::Sender<CycleOutcome>>,
        waiters: &mut Vec<oneshot::Sender<CycleOutcome>>,
    ) -> CycleOutcome {
        let cycle = self.run_cycle();
        tokio::pin!(cycle);

        loop {
            tokio::select! {
                outcome = &mut cycle => return outcome,
                Some(waiter) = refresh_rx.recv() => {
                    debug!("Refresh joined in-flight cycle");
                    waiters.push(waiter);
                }
            }
        }
    }
}

// ============================================================================
// Handles
// ============================================================================

/// Read side of a running feed
///
/// Cheap to clone. Each clone counts as a subscriber; the poller stops once
/// every clone and every receiver obtained from [`FeedHandle::subscribe`]
/// has been dropped.
#[derive(Debug, Clone)]
pub struct FeedHandle {
    receiver: watch::Receiver<FeedSnapshot>,
    refresh_tx: mpsc::Sender<oneshot::Sender<CycleOutcome>>,
    shutdown: Arc<watch::Sender<bool>>,
}

impl FeedHandle {
    /// Latest snapshot, without waiting
    pub fn snapshot(&self) -> FeedSnapshot {
        self.receiver.borrow().clone()
    }

    pub fn state(&self) -> BatchState {
        self.receiver.borrow().state.clone()
    }

    /// A receiver woken on every state transition
    pub fn subscribe(&self) -> watch::Receiver<FeedSnapshot> {
        self.receiver.clone()
    }

    /// Wait for the next state transition
    pub async fn changed(&mut self) -> Result<FeedSnapshot> {
        self.receiver.changed().await.map_err(|_| Error::FeedClosed)?;
        Ok(self.receiver.borrow_and_update().clone())
    }

    /// Run a cycle now, or join the one in flight, and wait for its outcome
    ///
    /// # Errors
    ///
    /// Returns `Error::FeedClosed` if the poller has stopped.
    pub async fn refresh(&self) -> Result<CycleOutcome> {
        let (tx, rx) = oneshot::channel();
        self.refresh_tx
            .send(tx)
            .await
            .map_err(|_| Error::FeedClosed)?;
        rx.await.map_err(|_| Error::FeedClosed)
    }

    /// Stop the poll loop after the current cycle
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }

    pub fn is_closed(&self) -> bool {
        self.refresh_tx.is_closed()
    }
}

/// Owner of the poll task
pub struct PollerHandle {
    task: JoinHandle<()>,
    shutdown: Arc<watch::Sender<bool>>,
}

impl PollerHandle {
    /// Wait for the loop to exit
    pub async fn wait(self) {
        if let Err(e) = self.task.await {
            warn!("Poller task failed: {}", e);
        }
    }

    /// Trigger shutdown and wait
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        self.wait().await;
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}
