//! Error types for the subgraph and gateway clients
//!
//! This module defines the domain errors raised while talking to the two
//! upstream collaborators.

use thiserror::Error;

/// Errors that can occur while fetching one metadata document from a gateway
///
/// These never cross the fan-out boundary: the fetcher logs them and moves on
/// to the next candidate gateway.
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Gateway answered with a non-success status
    #[error("Gateway returned status {0}")]
    Status(u16),

    /// Attempt exceeded the per-attempt timeout
    #[error("Request timeout")]
    Timeout,

    /// Body was not a metadata document
    #[error("Malformed metadata document: {0}")]
    Decode(String),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Errors raised by the indexing collaborator (the subgraph)
#[derive(Error, Debug)]
pub enum IndexerError {
    /// Connection, DNS, TLS or body read failure
    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    /// Subgraph endpoint answered with a non-success status
    #[error("Subgraph returned status {0}")]
    Status(u16),

    /// Request exceeded the configured timeout
    #[error("Subgraph request timeout")]
    Timeout,

    /// The query executed but the subgraph reported errors
    #[error("GraphQL error: {}", .0.join("; "))]
    GraphQl(Vec<String>),

    /// Response body did not have the expected shape
    #[error("Unexpected subgraph response: {0}")]
    Decode(String),
}

impl IndexerError {
    /// Whether the failure happened at the GraphQL protocol level
    pub fn is_protocol(&self) -> bool {
        matches!(self, Self::GraphQl(_) | Self::Decode(_))
    }

    /// Whether the failure happened at the transport level
    pub fn is_transport(&self) -> bool {
        !self.is_protocol()
    }
}

impl FetchError {
    /// Short machine-friendly label, used as a metrics label value
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Http(_) => "network",
            Self::Status(_) => "status",
            Self::Timeout => "timeout",
            Self::Decode(_) => "malformed",
            Self::InvalidUrl(_) => "invalid_url",
        }
    }
}
