use anyhow::{Context, Result};
use std::sync::Arc;

use mintfeed::config::Config;
use mintfeed::display::Explorer;
use mintfeed::indexer::{IndexSource, SubgraphClient};
use mintfeed::metadata::ContentResolver;
use mintfeed::metrics;
use mintfeed::pipeline::Poller;
use mintfeed::server::{AppState, FeedServer};

/// Run the poller behind the HTTP API until Ctrl+C
pub async fn serve(config: Config) -> Result<()> {
    println!("Starting feed server");
    println!("====================");
    println!("  Subgraph: {}", config.indexer.endpoint);
    println!("  Bind: {}", config.server.bind_address);
    println!("  Interval: {}s", config.poller.interval_secs);
    println!(
        "  Private gateway: {}",
        if config.gateways.private.is_some() { "configured" } else { "none" }
    );
    println!("  Public gateways: {}", config.gateways.public.join(", "));
    println!();

    metrics::init_metrics()
        .map_err(|e| anyhow::anyhow!("Failed to initialize metrics: {e}"))?;

    let poller = Poller::from_config(&config).context("Failed to build poller")?;
    let (feed, handle) = poller.spawn();

    let indexer: Arc<dyn IndexSource> = Arc::new(
        SubgraphClient::new(&config.indexer).context("Failed to create subgraph client")?,
    );
    let state = AppState::new(
        feed,
        indexer,
        ContentResolver::from_config(&config.gateways),
        Explorer::new(&config.display.explorer_url),
    );

    let server = FeedServer::new(config.server.clone(), state);

    println!("Endpoints:");
    println!("  GET  /api/health       - Health check");
    println!("  GET  /api/nfts         - Latest merged batch");
    println!("  POST /api/refresh      - Run a cycle now");
    println!("  GET  /api/indexer/meta - Subgraph health");
    println!("  GET  /metrics          - Prometheus metrics");
    println!();

    server
        .start_with_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Received shutdown signal");
        })
        .await
        .context("Feed server failed")?;

    // The router owned the last feed handle; stop the poller explicitly.
    handle.shutdown().await;
    Ok(())
}
