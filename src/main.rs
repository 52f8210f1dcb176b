use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(
    name = "mintfeed",
    version,
    about = "Live NFT mint feed: subgraph records merged with IPFS metadata",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML config file (defaults to MINTFEED_* environment variables)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json); overrides the config file
    #[arg(long, global = true)]
    log_format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll continuously and print each new batch
    Watch,

    /// Poll continuously and serve the feed over HTTP
    Serve,

    /// Run one cycle and print the merged batch as JSON
    Once,

    /// Check subgraph connectivity
    Health,

    /// List the latest creator reward payouts
    Rewards {
        /// Number of rewards to list
        #[arg(short, long, default_value = "20")]
        first: u32,
    },

    /// Show mints and rewards of one creator
    Creator {
        /// Creator address (0x...)
        address: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = commands::load_config(cli.config.as_deref())?;

    let log_format = cli.log_format.as_deref().unwrap_or(&config.logging.format);
    setup_tracing(log_format, &config.logging.level, cli.verbose)?;

    tracing::info!(subgraph = %config.indexer.endpoint, "mintfeed starting");

    match cli.command {
        Commands::Watch => {
            tracing::info!(interval_secs = config.poller.interval_secs, "Starting watch command");
            commands::watch(config).await?;
        }

        Commands::Serve => {
            tracing::info!(bind = %config.server.bind_address, "Starting serve command");
            commands::serve(config).await?;
        }

        Commands::Once => {
            tracing::info!("Starting once command");
            commands::once(config).await?;
        }

        Commands::Health => {
            commands::health(config).await?;
        }

        Commands::Rewards { first } => {
            tracing::info!(first = %first, "Starting rewards command");
            commands::rewards(config, first).await?;
        }

        Commands::Creator { address } => {
            tracing::info!(address = %address, "Starting creator command");
            commands::creator(config, address).await?;
        }
    }

    Ok(())
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("mintfeed=debug,info")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("mintfeed={level},warn")))
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}
