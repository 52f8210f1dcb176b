//! Common utilities and helper functions

pub mod error;

use anyhow::{Context, Result};
use url::Url;

/// Extract host from URL
pub fn extract_host(url: &str) -> Result<String> {
    let parsed = Url::parse(url).context("Invalid URL")?;

    parsed
        .host_str()
        .map(|s| s.to_string())
        .context("No host in URL")
}

/// Truncate text to a maximum length
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_len.saturating_sub(3)).collect();
        format!("{truncated}...")
    }
}

/// Remove trailing slashes so `base/ipfs/...` joins never double up
pub fn trim_base_url(base: &str) -> &str {
    base.trim_end_matches('/')
}
