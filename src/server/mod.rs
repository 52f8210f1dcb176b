//! HTTP surface for the feed
//!
//! Serves the published batch, a manual refresh trigger, the subgraph
//! health probe and Prometheus metrics.

pub mod api;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::display::Explorer;
use crate::indexer::IndexSource;
use crate::metadata::ContentResolver;
use crate::pipeline::FeedHandle;

pub use api::create_router;

// ============================================================================
// App State
// ============================================================================

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Read side of the running feed
    pub feed: FeedHandle,

    /// Indexer used for the health probe
    pub indexer: Arc<dyn IndexSource>,

    /// Turns image locators into browser URLs
    pub resolver: Arc<ContentResolver>,

    pub explorer: Explorer,

    /// Server start time
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        feed: FeedHandle,
        indexer: Arc<dyn IndexSource>,
        resolver: ContentResolver,
        explorer: Explorer,
    ) -> Self {
        Self {
            feed,
            indexer,
            resolver: Arc::new(resolver),
            explorer,
            start_time: Instant::now(),
        }
    }
}

// ============================================================================
// Feed Server
// ============================================================================

/// HTTP server exposing the feed
pub struct FeedServer {
    config: ServerConfig,
    state: AppState,
}

impl FeedServer {
    pub fn new(config: ServerConfig, state: AppState) -> Self {
        Self { config, state }
    }

    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Build the router with all routes and configured layers
    pub fn build_router(&self) -> Router {
        let mut router = create_router(self.state.clone());

        if self.config.enable_cors {
            router = router.layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            );
        }

        if self.config.enable_request_logging {
            router = router.layer(TraceLayer::new_for_http());
        }

        router
    }

    pub fn bind_address(&self) -> SocketAddr {
        self.config.bind_address
    }

    /// Serve until `shutdown_signal` resolves
    pub async fn start_with_shutdown(
        &self,
        shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> Result<(), ServerError> {
        let router = self.build_router();
        let addr = self.config.bind_address;

        tracing::info!("Starting feed server on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Bind(addr, e))?;

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(ServerError::Serve)?;

        tracing::info!("Feed server shutdown complete");
        Ok(())
    }
}

// ============================================================================
// Server Errors
// ============================================================================

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Failed to bind {0}: {1}")]
    Bind(SocketAddr, #[source] std::io::Error),

    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),
}
