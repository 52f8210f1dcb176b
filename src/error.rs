//! Unified error handling for the mintfeed crate
//!
//! This module provides a unified error type that consolidates the
//! domain-specific errors into a single `Error` enum, while keeping the
//! domain errors usable on their own.
//!
//! # Architecture
//!
//! - [`MintfeedErrorTrait`] - Common interface implemented by all error types
//! - [`ErrorCategory`] - Classification of errors for handling strategies
//! - [`Error`] - Unified error enum wrapping all domain-specific errors
//!
//! Only indexing failures and configuration failures are expected to reach a
//! caller through this type. Per-record metadata failures are absorbed inside
//! the metadata fetcher.

use thiserror::Error;

pub use crate::utils::error::{FetchError, IndexerError};

/// Common trait for all mintfeed error types
pub trait MintfeedErrorTrait: std::error::Error {
    /// Check if this error is recoverable (a later attempt may succeed)
    fn is_recoverable(&self) -> bool;

    /// Get the error category for handling strategies
    fn category(&self) -> ErrorCategory;
}

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Network-related errors (HTTP, timeout, status)
    Network,
    /// Upstream protocol and decoding errors
    Protocol,
    /// Configuration and validation errors
    Config,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    /// Lowercase name of the category
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Protocol => "protocol",
            Self::Config => "config",
            Self::Other => "other",
        }
    }
}

/// Unified error type for the mintfeed crate
#[derive(Error, Debug)]
pub enum Error {
    /// Indexing collaborator errors
    #[error("Indexer error: {0}")]
    Indexer(#[from] IndexerError),

    /// Metadata fetch errors
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// The poller task is gone
    #[error("Feed is shut down")]
    FeedClosed,
}

impl MintfeedErrorTrait for IndexerError {
    fn is_recoverable(&self) -> bool {
        // The next poll tick is the retry, whatever went wrong.
        true
    }

    fn category(&self) -> ErrorCategory {
        if self.is_protocol() {
            ErrorCategory::Protocol
        } else {
            ErrorCategory::Network
        }
    }
}

impl MintfeedErrorTrait for FetchError {
    fn is_recoverable(&self) -> bool {
        !matches!(self, Self::InvalidUrl(_) | Self::Decode(_))
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Http(_) | Self::Status(_) | Self::Timeout => ErrorCategory::Network,
            Self::Decode(_) | Self::InvalidUrl(_) => ErrorCategory::Protocol,
        }
    }
}

impl MintfeedErrorTrait for Error {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Indexer(e) => e.is_recoverable(),
            Self::Fetch(e) => e.is_recoverable(),
            Self::Config(_) | Self::FeedClosed => false,
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Indexer(e) => e.category(),
            Self::Fetch(e) => e.category(),
            Self::Config(_) => ErrorCategory::Config,
            Self::FeedClosed => ErrorCategory::Other,
        }
    }
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
