//! REST API handlers
//!
//! All JSON responses use the [`ApiResponse`] envelope.

use std::time::Instant;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::display::RecordView;
use crate::error::Error;
use crate::metrics;
use crate::models::{ErrorDetail, IndexerMeta, Timestamp};
use crate::pipeline::CycleOutcome;

use super::AppState;

// ============================================================================
// API Response Types
// ============================================================================

/// Generic API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    /// `idle`, `loading`, `ready` or `errored`
    pub feed: String,
    pub generation: u64,
}

/// Current batch as gallery cards
#[derive(Debug, Serialize)]
pub struct FeedResponse {
    pub status: String,
    pub generation: u64,
    pub updated_at: Option<Timestamp>,
    /// Records are from an earlier cycle because the latest one failed
    pub stale: bool,
    pub records: Vec<RecordView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<ErrorDetail>,
}

// ============================================================================
// API Routes
// ============================================================================

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/nfts", get(get_feed))
        .route("/api/refresh", post(refresh))
        .route("/api/indexer/meta", get(indexer_meta))
        .route("/metrics", get(prometheus_metrics))
        .with_state(state)
}

// ============================================================================
// Handlers
// ============================================================================

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.feed.snapshot();

    Json(ApiResponse::success(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        feed: snapshot.state.label().to_string(),
        generation: snapshot.generation,
    }))
}

/// Latest published batch; the last good batch is served while errored
async fn get_feed(State(state): State<AppState>) -> impl IntoResponse {
    let started = Instant::now();
    let snapshot = state.feed.snapshot();

    let records: Vec<RecordView> = snapshot
        .records()
        .iter()
        .map(|record| RecordView::build(record, &state.resolver, &state.explorer))
        .collect();

    let response = FeedResponse {
        status: snapshot.state.label().to_string(),
        generation: snapshot.generation,
        updated_at: snapshot.updated_at,
        stale: snapshot.state.is_errored() && !records.is_empty(),
        records,
        last_error: snapshot.last_error.clone(),
    };

    metrics::record_api_request("nfts", 200, started.elapsed().as_secs_f64());
    Json(ApiResponse::success(response))
}

/// Run a cycle now (or join the running one) and report its outcome
async fn refresh(State(state): State<AppState>) -> impl IntoResponse {
    let started = Instant::now();

    let (status, body) = match state.feed.refresh().await {
        Ok(outcome) => (StatusCode::OK, ApiResponse::<CycleOutcome>::success(outcome)),
        Err(e @ Error::FeedClosed) => (
            StatusCode::SERVICE_UNAVAILABLE,
            ApiResponse::error(e.to_string()),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            ApiResponse::error(e.to_string()),
        ),
    };

    metrics::record_api_request("refresh", status.as_u16(), started.elapsed().as_secs_f64());
    (status, Json(body))
}

async fn indexer_meta(State(state): State<AppState>) -> impl IntoResponse {
    match state.indexer.meta().await {
        Ok(meta) => (StatusCode::OK, Json(ApiResponse::<IndexerMeta>::success(meta))),
        Err(e) => {
            tracing::warn!(error = %e, "Indexer health probe failed");
            (StatusCode::BAD_GATEWAY, Json(ApiResponse::error(e.to_string())))
        }
    }
}

async fn prometheus_metrics() -> impl IntoResponse {
    match metrics::encode_metrics() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(header::CONTENT_TYPE, "text/plain")],
            e.to_string(),
        ),
    }
}
