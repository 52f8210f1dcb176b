//! Presentation helpers for merged records
//!
//! Formatting used by the CLI output and the HTTP API: shortened addresses,
//! human-readable mint times and block-explorer links.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::metadata::resolver::ContentResolver;
use crate::models::MergedRecord;
use crate::utils::trim_base_url;

/// Shorten an address to `0x1234...abcd`
///
/// Strings too short to shorten are returned unchanged.
pub fn short_address(address: &str) -> String {
    if address.len() <= 10 || !address.is_ascii() {
        return address.to_string();
    }
    format!("{}...{}", &address[..6], &address[address.len() - 4..])
}

/// Parse a string-encoded unix timestamp (seconds)
pub fn parse_timestamp(timestamp: &str) -> Option<DateTime<Utc>> {
    let secs = timestamp.trim().parse::<i64>().ok()?;
    DateTime::from_timestamp(secs, 0)
}

/// Render a string-encoded unix timestamp, or return it as-is when unparsable
pub fn format_timestamp(timestamp: &str) -> String {
    parse_timestamp(timestamp)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}

/// Render a wei amount as ether with up to six decimals, trailing zeros cut
pub fn format_ether(wei: u128) -> String {
    const WEI_PER_ETHER: u128 = 1_000_000_000_000_000_000;
    const SCALE: u128 = 1_000_000_000_000;

    let whole = wei / WEI_PER_ETHER;
    let micro = (wei % WEI_PER_ETHER) / SCALE;
    if micro == 0 {
        return format!("{whole} ETH");
    }
    let fraction = format!("{micro:06}");
    format!("{whole}.{} ETH", fraction.trim_end_matches('0'))
}

/// Block explorer link builder
#[derive(Debug, Clone)]
pub struct Explorer {
    base_url: String,
}

impl Explorer {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    pub fn tx_url(&self, hash: &str) -> String {
        format!("{}/tx/{hash}", trim_base_url(&self.base_url))
    }

    pub fn address_url(&self, address: &str) -> String {
        format!("{}/address/{address}", trim_base_url(&self.base_url))
    }
}

/// A merged record flattened into what a gallery card shows
#[derive(Debug, Clone, Serialize)]
pub struct RecordView {
    pub id: String,
    pub name: String,
    pub token_id: String,
    pub description: Option<String>,
    /// `None` means the consumer should show a placeholder
    pub image_url: Option<String>,
    pub creator: String,
    pub creator_short: String,
    pub creator_url: String,
    pub minted_at: String,
    pub tx_url: String,
    pub has_metadata: bool,
}

impl RecordView {
    pub fn build(record: &MergedRecord, resolver: &ContentResolver, explorer: &Explorer) -> Self {
        let base = &record.base;
        Self {
            id: base.id.clone(),
            name: record.display_name(),
            token_id: base.token_id.clone(),
            description: record.metadata.as_ref().and_then(|m| m.description.clone()),
            image_url: record
                .image_locator()
                .and_then(|locator| resolver.display_url(locator)),
            creator: base.creator.clone(),
            creator_short: short_address(&base.creator),
            creator_url: explorer.address_url(&base.creator),
            minted_at: format_timestamp(&base.block_timestamp),
            tx_url: explorer.tx_url(&base.transaction_hash),
            has_metadata: record.metadata.is_some(),
        }
    }
}
