//! Configuration management for mintfeed
//!
//! This module handles loading and validating configuration from environment
//! variables and TOML files. A configuration that is missing a required
//! external identifier or credential is rejected at startup.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};

/// Default public IPFS gateway used when nothing else is configured
pub const DEFAULT_PUBLIC_GATEWAY: &str = "https://ipfs.io";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Subgraph (indexing collaborator) configuration
    pub indexer: IndexerConfig,

    /// Content gateway configuration
    #[serde(default)]
    pub gateways: GatewayConfig,

    /// Poll loop configuration
    #[serde(default)]
    pub poller: PollerConfig,

    /// HTTP API configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Display configuration
    #[serde(default)]
    pub display: DisplayConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Subgraph configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexerConfig {
    /// GraphQL endpoint of the subgraph
    pub endpoint: String,

    /// Bearer API key for hosted subgraphs (optional)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Number of records requested per poll (`first`)
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Request timeout in seconds
    #[serde(default = "default_indexer_timeout")]
    pub request_timeout_secs: u64,
}

/// A private (paid) gateway that requires a bearer token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PrivateGateway {
    /// Base URL, e.g. `https://example.mypinata.cloud`
    pub base_url: String,

    /// Bearer token sent on every request to this gateway
    pub token: String,
}

/// Content gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Preferred gateway, tried first when present
    #[serde(default)]
    pub private: Option<PrivateGateway>,

    /// Public fallbacks, tried in order after the private gateway
    #[serde(default = "default_public_gateways")]
    pub public: Vec<String>,

    /// Timeout for a single metadata fetch attempt, in seconds
    #[serde(default = "default_attempt_timeout")]
    pub attempt_timeout_secs: u64,

    /// User agent sent to gateways
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Poll loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollerConfig {
    /// Seconds between poll cycles
    #[serde(default = "default_interval")]
    pub interval_secs: u64,
}

/// HTTP API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server bind address
    pub bind_address: SocketAddr,

    /// Enable CORS for API
    pub enable_cors: bool,

    /// Enable request logging
    pub enable_request_logging: bool,
}

/// Display configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Block explorer base URL used for tx and address links
    pub explorer_url: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

fn default_page_size() -> u32 {
    50
}

fn default_indexer_timeout() -> u64 {
    30
}

fn default_public_gateways() -> Vec<String> {
    vec![DEFAULT_PUBLIC_GATEWAY.to_string()]
}

fn default_attempt_timeout() -> u64 {
    10
}

fn default_user_agent() -> String {
    format!("mintfeed/{}", env!("CARGO_PKG_VERSION"))
}

fn default_interval() -> u64 {
    10
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            private: None,
            public: default_public_gateways(),
            attempt_timeout_secs: default_attempt_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], 8080)),
            enable_cors: true,
            enable_request_logging: true,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            explorer_url: String::from("https://sepolia.arbiscan.io"),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

impl IndexerConfig {
    /// Config for an endpoint with every other field defaulted
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: None,
            page_size: default_page_size(),
            request_timeout_secs: default_indexer_timeout(),
        }
    }

    /// Get request timeout as Duration
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl GatewayConfig {
    /// Get per-attempt timeout as Duration
    #[must_use]
    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_secs(self.attempt_timeout_secs)
    }
}

impl PollerConfig {
    /// Get poll interval as Duration
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl Config {
    /// Config for a subgraph endpoint with every other section defaulted
    pub fn for_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            indexer: IndexerConfig::new(endpoint),
            gateways: GatewayConfig::default(),
            poller: PollerConfig::default(),
            server: ServerConfig::default(),
            display: DisplayConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Load configuration from environment variables
    ///
    /// `MINTFEED_SUBGRAPH_URL` is required. Everything else has a default.
    pub fn from_env() -> Result<Self> {
        let endpoint = env_non_empty("MINTFEED_SUBGRAPH_URL")
            .ok_or_else(|| Error::config("MINTFEED_SUBGRAPH_URL is not set"))?;

        let mut config = Self::for_endpoint(endpoint);

        config.indexer.api_key = env_non_empty("MINTFEED_SUBGRAPH_API_KEY");
        if let Some(page_size) = env_parse::<u32>("MINTFEED_PAGE_SIZE") {
            config.indexer.page_size = page_size;
        }
        if let Some(timeout) = env_parse::<u64>("MINTFEED_INDEXER_TIMEOUT") {
            config.indexer.request_timeout_secs = timeout;
        }

        let private_base = env_non_empty("MINTFEED_PRIVATE_GATEWAY");
        let private_token = env_non_empty("MINTFEED_GATEWAY_TOKEN");
        config.gateways.private = match (private_base, private_token) {
            (Some(base_url), Some(token)) => Some(PrivateGateway { base_url, token }),
            (Some(_), None) => {
                return Err(Error::config(
                    "MINTFEED_PRIVATE_GATEWAY is set but MINTFEED_GATEWAY_TOKEN is missing",
                ))
            }
            (None, _) => None,
        };

        if let Some(public) = env_non_empty("MINTFEED_PUBLIC_GATEWAYS") {
            config.gateways.public = public
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(timeout) = env_parse::<u64>("MINTFEED_ATTEMPT_TIMEOUT") {
            config.gateways.attempt_timeout_secs = timeout;
        }

        if let Some(interval) = env_parse::<u64>("MINTFEED_POLL_INTERVAL") {
            config.poller.interval_secs = interval;
        }

        if let Some(bind) = env_non_empty("MINTFEED_BIND_ADDRESS") {
            config.server.bind_address = bind
                .parse()
                .map_err(|e| Error::config(format!("Invalid MINTFEED_BIND_ADDRESS '{bind}': {e}")))?;
        }

        if let Some(explorer) = env_non_empty("MINTFEED_EXPLORER_URL") {
            config.display.explorer_url = explorer;
        }

        if let Some(level) = env_non_empty("MINTFEED_LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Some(format) = env_non_empty("MINTFEED_LOG_FORMAT") {
            config.logging.format = format;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read config file {}: {e}", path.display()))
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| {
            Error::config(format!(
                "Failed to parse TOML config file {}: {e}",
                path.display()
            ))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.indexer.endpoint.trim().is_empty() {
            return Err(Error::config("indexer.endpoint must not be empty"));
        }
        validate_http_url("indexer.endpoint", &self.indexer.endpoint)?;

        if self.indexer.page_size == 0 {
            return Err(Error::config("indexer.page_size must be greater than 0"));
        }

        if let Some(private) = &self.gateways.private {
            validate_http_url("gateways.private.base_url", &private.base_url)?;
            if private.token.trim().is_empty() {
                return Err(Error::config(
                    "gateways.private.token is required for a private gateway",
                ));
            }
        }

        for gateway in &self.gateways.public {
            validate_http_url("gateways.public", gateway)?;
        }

        if self.gateways.private.is_none() && self.gateways.public.is_empty() {
            return Err(Error::config("at least one content gateway is required"));
        }

        if self.gateways.attempt_timeout_secs == 0 {
            return Err(Error::config(
                "gateways.attempt_timeout_secs must be greater than 0",
            ));
        }

        if self.poller.interval_secs == 0 {
            return Err(Error::config("poller.interval_secs must be greater than 0"));
        }

        Ok(())
    }
}

fn validate_http_url(field: &str, value: &str) -> Result<()> {
    let parsed = url::Url::parse(value)
        .map_err(|e| Error::config(format!("{field}: invalid URL '{value}': {e}")))?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(Error::config(format!(
            "{field}: unsupported scheme '{other}' in '{value}'"
        ))),
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}
