//! Poll loop integration tests
//!
//! Time is paused so interval ticks and scripted indexer delays advance
//! deterministically.

use std::sync::Arc;
use std::time::Duration;

use mintfeed::error::Error;
use mintfeed::indexer::PageRequest;
use mintfeed::models::BatchState;
use mintfeed::pipeline::{CycleOutcome, PollSettings, Poller};

use crate::common::{create_record, named, Reply, ScriptedIndex, StaticMetadata};

fn settings(interval_secs: u64) -> PollSettings {
    PollSettings::new(Duration::from_secs(interval_secs), PageRequest::latest(10))
}

fn metadata() -> Arc<StaticMetadata> {
    Arc::new(StaticMetadata::new([
        ("ipfs://one".to_string(), named("One")),
        ("ipfs://two".to_string(), named("Two")),
    ]))
}

fn batch_a() -> Vec<mintfeed::BaseRecord> {
    vec![create_record("1", "ipfs://one"), create_record("2", "")]
}

fn batch_b() -> Vec<mintfeed::BaseRecord> {
    vec![create_record("3", "ipfs://two")]
}

/// Test that refreshes during a running cycle join it instead of overlapping
#[tokio::test(start_paused = true)]
async fn test_refreshes_join_in_flight_cycle() {
    let index = Arc::new(ScriptedIndex::new(vec![(
        Duration::from_secs(3),
        Reply::Records(batch_a()),
    )]));
    let poller = Poller::new(Arc::clone(&index), metadata(), settings(60));
    let (feed, handle) = poller.spawn();

    let (a, b, c) = tokio::join!(feed.refresh(), feed.refresh(), feed.refresh());
    let (a, b, c) = (a.unwrap(), b.unwrap(), c.unwrap());

    assert_eq!(index.calls(), 1);
    assert_eq!(index.max_in_flight(), 1);
    assert_eq!(a, b);
    assert_eq!(b, c);
    assert!(matches!(a, CycleOutcome::Published { records: 2, .. }));

    // A refresh after the cycle finished starts a new one.
    let next = feed.refresh().await.unwrap();
    assert!(next.generation() > a.generation());
    assert_eq!(index.calls(), 2);
    assert_eq!(index.max_in_flight(), 1);

    handle.shutdown().await;
}

/// Test that ticks are skipped, not queued, while a slow cycle runs
#[tokio::test(start_paused = true)]
async fn test_slow_cycles_never_overlap() {
    let index = Arc::new(ScriptedIndex::new(vec![(
        Duration::from_secs(25),
        Reply::Records(batch_a()),
    )]));
    let poller = Poller::new(Arc::clone(&index), metadata(), settings(10));
    let (_feed, handle) = poller.spawn();

    tokio::time::sleep(Duration::from_secs(120)).await;

    assert!(index.calls() >= 2);
    assert_eq!(index.max_in_flight(), 1);

    handle.shutdown().await;
}

/// Test that an older cycle finishing last cannot overwrite a newer one
#[tokio::test(start_paused = true)]
async fn test_generation_guard_between_concurrent_cycles() {
    let index = Arc::new(ScriptedIndex::new(vec![
        (Duration::from_secs(5), Reply::Records(batch_a())),
        (Duration::from_secs(1), Reply::Records(batch_b())),
    ]));
    let poller = Poller::new(Arc::clone(&index), metadata(), settings(60));
    let mut rx = poller.publisher().subscribe();

    let (older, newer) = tokio::join!(poller.run_cycle(), poller.run_cycle());

    assert!(matches!(older, CycleOutcome::Discarded { generation: 1 }));
    assert!(matches!(newer, CycleOutcome::Published { generation: 2, .. }));

    let snapshot = rx.borrow_and_update().clone();
    assert_eq!(snapshot.generation, 2);
    assert_eq!(snapshot.records().len(), 1);
    assert_eq!(snapshot.records()[0].id(), "3");
}

/// Test that an identical batch does not notify subscribers again
#[tokio::test(start_paused = true)]
async fn test_identical_batch_not_renotified() {
    let index = Arc::new(ScriptedIndex::always(Reply::Records(batch_a())));
    let poller = Poller::new(Arc::clone(&index), metadata(), settings(60));
    let mut rx = poller.publisher().subscribe();

    assert!(matches!(poller.run_cycle().await, CycleOutcome::Published { .. }));
    assert!(rx.has_changed().unwrap());
    rx.borrow_and_update();

    assert!(matches!(poller.run_cycle().await, CycleOutcome::Unchanged { .. }));
    assert!(!rx.has_changed().unwrap());
}

/// Test that an indexer failure keeps the last good batch available
#[tokio::test(start_paused = true)]
async fn test_error_keeps_last_good_batch() {
    let index = Arc::new(ScriptedIndex::new(vec![
        (Duration::ZERO, Reply::Records(batch_a())),
        (Duration::ZERO, Reply::Status(503)),
        (Duration::ZERO, Reply::GraphQl(vec!["indexing_error".into()])),
        (Duration::ZERO, Reply::Records(batch_b())),
    ]));
    let poller = Poller::new(Arc::clone(&index), metadata(), settings(60));
    let rx = poller.publisher().subscribe();

    poller.run_cycle().await;
    assert!(rx.borrow().state.is_ready());

    match poller.run_cycle().await {
        CycleOutcome::Errored { error, .. } => assert!(error.transport_error.is_some()),
        other => panic!("expected errored outcome, got {other:?}"),
    }
    {
        let snapshot = rx.borrow();
        assert!(snapshot.state.is_errored());
        assert_eq!(snapshot.records().len(), 2);
    }

    poller.run_cycle().await;
    {
        let snapshot = rx.borrow();
        match &snapshot.state {
            BatchState::Errored(detail) => {
                assert_eq!(detail.protocol_errors, vec!["indexing_error".to_string()]);
            }
            other => panic!("expected errored state, got {other:?}"),
        }
        assert_eq!(snapshot.records().len(), 2);
    }

    assert!(matches!(poller.run_cycle().await, CycleOutcome::Published { records: 1, .. }));
    let snapshot = rx.borrow().clone();
    assert!(snapshot.last_error.is_none());
    assert_eq!(snapshot.records()[0].id(), "3");
}

/// Test that the first cycle enters Loading before Ready
#[tokio::test(start_paused = true)]
async fn test_first_cycle_passes_through_loading() {
    let index = Arc::new(ScriptedIndex::new(vec![(
        Duration::from_secs(2),
        Reply::Records(batch_a()),
    )]));
    let poller = Poller::new(Arc::clone(&index), metadata(), settings(60));
    let (mut feed, handle) = poller.spawn();

    assert_eq!(feed.state(), BatchState::Idle);

    let first = feed.changed().await.unwrap();
    assert_eq!(first.state, BatchState::Loading);

    let second = feed.changed().await.unwrap();
    assert!(second.state.is_ready());
    assert_eq!(second.records()[0].display_name(), "One");

    handle.shutdown().await;
}

/// Test that the poller stops once every feed handle is dropped
#[tokio::test(start_paused = true)]
async fn test_stops_when_subscribers_gone() {
    let index = Arc::new(ScriptedIndex::always(Reply::Records(batch_a())));
    let poller = Poller::new(Arc::clone(&index), metadata(), settings(5));
    let (feed, handle) = poller.spawn();

    tokio::time::sleep(Duration::from_secs(1)).await;
    drop(feed);

    tokio::time::timeout(Duration::from_secs(30), handle.wait())
        .await
        .expect("poller should stop without subscribers");
}

/// Test that a cycle finishing after every subscriber left is discarded
#[tokio::test(start_paused = true)]
async fn test_result_discarded_when_subscribers_leave_mid_cycle() {
    let index = Arc::new(ScriptedIndex::new(vec![(
        Duration::from_secs(5),
        Reply::Records(batch_a()),
    )]));
    let poller = Poller::new(Arc::clone(&index), metadata(), settings(60));
    let publisher = Arc::clone(poller.publisher());
    let (feed, handle) = poller.spawn();

    // The first tick starts a cycle that is still waiting on the indexer.
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(index.calls(), 1);
    drop(feed);

    tokio::time::timeout(Duration::from_secs(30), handle.wait())
        .await
        .expect("poller should stop without subscribers");

    let snapshot = publisher.snapshot();
    assert_eq!(snapshot.state, BatchState::Loading);
    assert!(snapshot.records().is_empty());
    assert_eq!(publisher.subscriber_count(), 0);
    assert_eq!(index.calls(), 1);
}

/// Test that refresh reports a closed feed after shutdown
#[tokio::test(start_paused = true)]
async fn test_refresh_after_shutdown() {
    let index = Arc::new(ScriptedIndex::always(Reply::Records(batch_a())));
    let poller = Poller::new(Arc::clone(&index), metadata(), settings(5));
    let (feed, handle) = poller.spawn();

    handle.shutdown().await;

    assert!(feed.is_closed());
    assert!(matches!(feed.refresh().await, Err(Error::FeedClosed)));
}

/// Test that any feed handle can stop the loop
#[tokio::test(start_paused = true)]
async fn test_shutdown_from_feed_handle() {
    let index = Arc::new(ScriptedIndex::always(Reply::Records(batch_a())));
    let poller = Poller::new(Arc::clone(&index), metadata(), settings(5));
    let (feed, handle) = poller.spawn();
    let other = feed.clone();

    tokio::time::sleep(Duration::from_secs(1)).await;
    other.shutdown();

    tokio::time::timeout(Duration::from_secs(30), handle.wait())
        .await
        .expect("poller should stop on shutdown");
    assert!(matches!(feed.refresh().await, Err(Error::FeedClosed)));
}
