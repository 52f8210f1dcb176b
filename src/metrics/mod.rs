//! Prometheus metrics for the mint feed
//!
//! This module tracks:
//! - Poll cycles: outcome, duration, published record count
//! - Metadata: per-attempt results by gateway, per-record outcomes
//! - HTTP API requests
//!
//! # Usage
//!
//! Call `init_metrics()` at application startup to register all metrics.
//! If initialization fails, metrics operations become no-ops.

use prometheus::{
    register_counter_vec, register_gauge, register_histogram, register_histogram_vec,
    CounterVec, Encoder, Gauge, Histogram, HistogramVec, TextEncoder,
};
use std::sync::OnceLock;

// ============================================================================
// Metrics Storage
// ============================================================================

/// Container for poll loop metrics
struct FeedMetrics {
    cycles: CounterVec,
    cycle_duration: Histogram,
    published_records: Gauge,
    metadata_attempts: CounterVec,
    metadata_outcomes: CounterVec,
    api_requests: CounterVec,
    api_duration: HistogramVec,
}

/// Global storage for feed metrics
static FEED_METRICS: OnceLock<FeedMetrics> = OnceLock::new();

/// Flag to track if initialization was attempted
static METRICS_INIT_ATTEMPTED: OnceLock<bool> = OnceLock::new();

// ============================================================================
// Initialization
// ============================================================================

/// Initialize all Prometheus metrics
///
/// Safe to call more than once; only the first call registers anything.
pub fn init_metrics() -> Result<(), Box<dyn std::error::Error>> {
    if METRICS_INIT_ATTEMPTED.get().is_some() {
        return Ok(());
    }
    METRICS_INIT_ATTEMPTED.set(true).ok();

    let metrics = FeedMetrics {
        cycles: register_counter_vec!(
            "mintfeed_poll_cycles_total",
            "Poll cycles by outcome",
            &["outcome"]
        )?,
        cycle_duration: register_histogram!(
            "mintfeed_poll_cycle_duration_seconds",
            "Duration of a full poll cycle (index query plus metadata fan-out)",
            vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]
        )?,
        published_records: register_gauge!(
            "mintfeed_published_records",
            "Number of records in the last published batch"
        )?,
        metadata_attempts: register_counter_vec!(
            "mintfeed_metadata_attempts_total",
            "Metadata fetch attempts by gateway and result",
            &["gateway", "result"]
        )?,
        metadata_outcomes: register_counter_vec!(
            "mintfeed_metadata_outcomes_total",
            "Per-record metadata outcomes",
            &["outcome"]
        )?,
        api_requests: register_counter_vec!(
            "mintfeed_api_requests_total",
            "Total API requests by endpoint and status",
            &["endpoint", "status"]
        )?,
        api_duration: register_histogram_vec!(
            "mintfeed_api_request_duration_seconds",
            "API request duration in seconds",
            &["endpoint"],
            vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
        )?,
    };

    FEED_METRICS
        .set(metrics)
        .map_err(|_| "Feed metrics already initialized")?;

    tracing::info!("Prometheus metrics initialized successfully");
    Ok(())
}

/// Check if metrics have been initialized
pub fn metrics_initialized() -> bool {
    FEED_METRICS.get().is_some()
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, Box<dyn std::error::Error>> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

/// Record a finished poll cycle
pub fn record_cycle(outcome: &str, duration_secs: f64) {
    let Some(m) = FEED_METRICS.get() else {
        return;
    };

    m.cycles.with_label_values(&[outcome]).inc();
    m.cycle_duration.observe(duration_secs);
}

/// Record the size of the batch that was just published
pub fn set_published_records(count: usize) {
    if let Some(m) = FEED_METRICS.get() {
        m.published_records.set(count as f64);
    }
}

/// Record one metadata fetch attempt against a gateway
pub fn record_metadata_attempt(gateway: &str, result: &str) {
    if let Some(m) = FEED_METRICS.get() {
        m.metadata_attempts
            .with_label_values(&[gateway, result])
            .inc();
    }
}

/// Record the final metadata outcome for one record
pub fn record_metadata_outcome(outcome: &str) {
    if let Some(m) = FEED_METRICS.get() {
        m.metadata_outcomes.with_label_values(&[outcome]).inc();
    }
}

/// Record API request
pub fn record_api_request(endpoint: &str, status: u16, duration_secs: f64) {
    let Some(m) = FEED_METRICS.get() else {
        return;
    };

    let status_str = status.to_string();
    m.api_requests
        .with_label_values(&[endpoint, &status_str])
        .inc();
    m.api_duration
        .with_label_values(&[endpoint])
        .observe(duration_secs);
}

// ============================================================================
// Tests
// ============================================================================
