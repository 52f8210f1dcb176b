//! HTTP API integration tests

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use mintfeed::display::Explorer;
use mintfeed::indexer::{IndexSource, PageRequest};
use mintfeed::metadata::{ContentResolver, Gateway};
use mintfeed::pipeline::{PollSettings, Poller, PollerHandle};
use mintfeed::server::{create_router, AppState};

use crate::common::{create_record, named, Reply, ScriptedIndex, StaticMetadata, CID_A};

fn app(reply: Reply) -> (Router, PollerHandle) {
    let index = Arc::new(ScriptedIndex::always(reply));
    let metadata = Arc::new(StaticMetadata::new([(
        "ipfs://one".to_string(),
        mintfeed::MetadataDocument {
            image: Some(format!("ipfs://{CID_A}")),
            ..named("One")
        },
    )]));

    let poller = Poller::new(
        Arc::clone(&index),
        metadata,
        PollSettings::new(Duration::from_secs(3600), PageRequest::latest(10)),
    );
    let (feed, handle) = poller.spawn();

    let indexer: Arc<dyn IndexSource> = index;
    let state = AppState::new(
        feed,
        indexer,
        ContentResolver::new(vec![Gateway::public("https://ipfs.io")]),
        Explorer::new("https://sepolia.arbiscan.io"),
    );

    (create_router(state), handle)
}

async fn send(router: &Router, method: &str, uri: &str) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn records() -> Vec<mintfeed::BaseRecord> {
    vec![create_record("1", "ipfs://one"), create_record("2", "")]
}

#[tokio::test]
async fn test_health_check() {
    let (router, handle) = app(Reply::Records(records()));

    let (status, body) = send(&router, "GET", "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "healthy");
    assert_eq!(body["data"]["version"], env!("CARGO_PKG_VERSION"));

    drop(router);
    handle.shutdown().await;
}

#[tokio::test]
async fn test_refresh_then_feed() {
    let (router, handle) = app(Reply::Records(records()));

    let (status, body) = send(&router, "POST", "/api/refresh").await;
    assert_eq!(status, StatusCode::OK);
    let outcome = body["data"]["outcome"].as_str().unwrap();
    assert!(outcome == "published" || outcome == "unchanged", "got {outcome}");

    let (status, body) = send(&router, "GET", "/api/nfts").await;
    assert_eq!(status, StatusCode::OK);

    let data = &body["data"];
    assert_eq!(data["status"], "ready");
    assert_eq!(data["stale"], false);

    let cards = data["records"].as_array().unwrap();
    assert_eq!(cards.len(), 2);
    assert_eq!(cards[0]["name"], "One");
    assert_eq!(
        cards[0]["image_url"],
        format!("https://ipfs.io/ipfs/{CID_A}").as_str()
    );
    assert_eq!(cards[0]["creator_short"], "0x27Af...37A8");
    assert_eq!(cards[1]["name"], "NFT #2");
    assert_eq!(cards[1]["has_metadata"], false);
    assert!(cards[1]["image_url"].is_null());

    drop(router);
    handle.shutdown().await;
}

#[tokio::test]
async fn test_feed_reports_indexer_error() {
    let (router, handle) = app(Reply::Status(503));

    let (status, body) = send(&router, "POST", "/api/refresh").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["outcome"], "errored");

    let (_, body) = send(&router, "GET", "/api/nfts").await;
    let data = &body["data"];
    assert_eq!(data["status"], "errored");
    assert!(data["records"].as_array().unwrap().is_empty());
    assert!(data["last_error"]["transport_error"].is_string());

    drop(router);
    handle.shutdown().await;
}

#[tokio::test]
async fn test_indexer_meta() {
    let (router, handle) = app(Reply::Records(Vec::new()));

    let (status, body) = send(&router, "GET", "/api/indexer/meta").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["block"]["number"], 4242);
    assert_eq!(body["data"]["hasIndexingErrors"], false);

    drop(router);
    handle.shutdown().await;
}

#[tokio::test]
async fn test_refresh_after_poller_stopped() {
    let (router, handle) = app(Reply::Records(records()));
    handle.shutdown().await;

    let (status, body) = send(&router, "POST", "/api/refresh").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let (router, handle) = app(Reply::Records(Vec::new()));

    let response = router
        .clone()
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    drop(router);
    handle.shutdown().await;
}
