pub mod creator;
pub mod health;
pub mod once;
pub mod serve;
pub mod watch;

use anyhow::{Context, Result};
use std::path::Path;

use mintfeed::config::Config;
use mintfeed::display::RecordView;
use mintfeed::utils::truncate_text;

// Re-export command functions for convenience
pub use creator::{creator, rewards};
pub use health::health;
pub use once::once;
pub use serve::serve;
pub use watch::watch;

/// Load configuration from a TOML file if given, otherwise from the environment
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Config::from_env().context("Failed to load config from environment"),
    }
}

/// Print gallery cards as a plain list
pub fn print_records(records: &[RecordView]) {
    if records.is_empty() {
        println!("  (no mints yet)");
        return;
    }

    for (i, record) in records.iter().enumerate() {
        let marker = if record.has_metadata { "" } else { " [no metadata]" };
        println!("{}. {}{}", i + 1, record.name, marker);
        println!(
            "   Token #{} | Creator {} | Minted {}",
            record.token_id, record.creator_short, record.minted_at
        );
        if let Some(description) = &record.description {
            println!("   {}", truncate_text(description, 80));
        }
        if let Some(image) = &record.image_url {
            println!("   Image: {image}");
        }
        println!("   Tx: {}", record.tx_url);
    }
}
