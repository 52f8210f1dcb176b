//! Integration tests module
//!
//! End-to-end tests for the mint feed:
//! - Fetch → merge with gateway fallback
//! - Poll cycles, refresh joining, generation guard and shutdown
//! - HTTP API over a running feed

pub mod pipeline_test;
pub mod poller_test;
pub mod server_test;
