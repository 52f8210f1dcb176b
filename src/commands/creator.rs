use anyhow::{bail, Context, Result};

use mintfeed::config::Config;
use mintfeed::display::{format_ether, format_timestamp, short_address};
use mintfeed::indexer::{is_address, PageRequest, SubgraphClient};

/// List the latest creator reward payouts
pub async fn rewards(config: Config, first: u32) -> Result<()> {
    let client = SubgraphClient::new(&config.indexer).context("Failed to create subgraph client")?;
    let rewards = client
        .creator_rewards(&PageRequest::latest(first))
        .await
        .context("Failed to fetch creator rewards")?;

    println!("Creator rewards (latest {first})");
    println!("================================");

    if rewards.is_empty() {
        println!("  (no rewards yet)");
        return Ok(());
    }

    for reward in &rewards {
        let amount = reward
            .amount
            .parse::<u128>()
            .map(format_ether)
            .unwrap_or_else(|_| reward.amount.clone());
        println!(
            "  {} | token #{} | {} | {}",
            short_address(&reward.creator),
            reward.nft_token_id,
            amount,
            format_timestamp(&reward.block_timestamp)
        );
    }

    Ok(())
}

/// Print mints and rewards of one creator
pub async fn creator(config: Config, address: String) -> Result<()> {
    if !is_address(&address) {
        bail!("Invalid creator address: {address}");
    }

    let client = SubgraphClient::new(&config.indexer).context("Failed to create subgraph client")?;
    let stats = client
        .creator_stats(&address)
        .await
        .context("Failed to fetch creator stats")?;

    println!("Creator {}", short_address(&address));
    println!("========================");
    println!("  Mints: {}", stats.mints.len());
    println!("  Reward payouts: {}", stats.rewards.len());
    println!("  Total rewards: {}", format_ether(stats.total_rewards()));

    if !stats.mints.is_empty() {
        println!();
        println!("Mints:");
        for mint in &stats.mints {
            println!(
                "  #{} | {} | {}",
                mint.token_id,
                format_timestamp(&mint.block_timestamp),
                mint.content_locator
            );
        }
    }

    Ok(())
}
