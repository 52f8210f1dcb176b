use anyhow::{bail, Context, Result};

use mintfeed::config::Config;
use mintfeed::pipeline::{CycleOutcome, Poller};

/// Run a single cycle and print the merged batch as JSON
pub async fn once(config: Config) -> Result<()> {
    let poller = Poller::from_config(&config).context("Failed to build poller")?;

    // A cycle only publishes while someone is subscribed.
    let receiver = poller.publisher().subscribe();
    let outcome = poller.run_cycle().await;
    tracing::info!(outcome = outcome.label(), "Cycle finished");

    if let CycleOutcome::Errored { error, .. } = &outcome {
        bail!("Indexer request failed: {}", error.message);
    }

    let snapshot = receiver.borrow().clone();
    let json = serde_json::to_string_pretty(snapshot.records())
        .context("Failed to serialize batch")?;
    println!("{json}");

    Ok(())
}
