use anyhow::{Context, Result};

use mintfeed::config::Config;
use mintfeed::display::{Explorer, RecordView};
use mintfeed::metadata::ContentResolver;
use mintfeed::models::BatchState;
use mintfeed::pipeline::Poller;

use super::print_records;

/// Run the poller and print every published snapshot until Ctrl+C
pub async fn watch(config: Config) -> Result<()> {
    println!("Watching mints");
    println!("==============");
    println!("  Subgraph: {}", config.indexer.endpoint);
    println!("  Interval: {}s", config.poller.interval_secs);
    println!("  Page size: {}", config.indexer.page_size);
    println!();

    let resolver = ContentResolver::from_config(&config.gateways);
    let explorer = Explorer::new(&config.display.explorer_url);

    let poller = Poller::from_config(&config).context("Failed to build poller")?;
    let (mut feed, handle) = poller.spawn();

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            changed = feed.changed() => {
                let snapshot = changed.context("Feed stopped unexpectedly")?;
                match &snapshot.state {
                    BatchState::Idle => {}
                    BatchState::Loading => println!("Loading..."),
                    BatchState::Ready(records) => {
                        println!(
                            "\n[generation {}] {} mints",
                            snapshot.generation,
                            records.len()
                        );
                        let views: Vec<RecordView> = records
                            .iter()
                            .map(|r| RecordView::build(r, &resolver, &explorer))
                            .collect();
                        print_records(&views);
                    }
                    BatchState::Errored(detail) => {
                        println!("\n[generation {}] Error: {}", snapshot.generation, detail.message);
                        for message in &detail.protocol_errors {
                            println!("  - {message}");
                        }
                        if !snapshot.records().is_empty() {
                            println!("  (showing last good batch of {} mints)", snapshot.records().len());
                        }
                    }
                }
            }
            _ = &mut ctrl_c => {
                println!("\nShutting down...");
                break;
            }
        }
    }

    handle.shutdown().await;
    Ok(())
}
