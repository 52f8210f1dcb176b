use anyhow::{Context, Result};

use mintfeed::config::Config;
use mintfeed::indexer::SubgraphClient;

/// Query the subgraph `_meta` field and print connectivity diagnostics
pub async fn health(config: Config) -> Result<()> {
    println!("Subgraph health");
    println!("===============");
    println!("  Endpoint: {}", config.indexer.endpoint);
    println!(
        "  API key: {}",
        if config.indexer.api_key.is_some() { "set" } else { "not set" }
    );

    let client = SubgraphClient::new(&config.indexer).context("Failed to create subgraph client")?;

    match client.meta().await {
        Ok(meta) => {
            println!("  Status: reachable");
            println!("  Latest block: {}", meta.block.number);
            if let Some(hash) = &meta.block.hash {
                println!("  Block hash: {hash}");
            }
            println!(
                "  Indexing errors: {}",
                if meta.has_indexing_errors { "yes" } else { "no" }
            );
            Ok(())
        }
        Err(e) => {
            println!("  Status: unreachable");
            println!("  Error: {e}");
            if e.is_protocol() {
                println!("  Hint: the endpoint answered but not with a valid subgraph response");
            } else {
                println!("  Hint: check the endpoint URL, network access and API key");
            }
            Err(e).context("Subgraph health check failed")
        }
    }
}
