//! Fan-out merge integration tests

use std::sync::Arc;
use std::time::Duration;

use proptest::prelude::*;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use mintfeed::metadata::{ContentResolver, Gateway, MetadataFetcher};
use mintfeed::pipeline::FanOutMerger;

use crate::common::{create_record, named, StaticMetadata, CID_A, CID_B};

/// Test the two-record scenario: one resolvable, one empty locator
#[tokio::test]
async fn test_merge_with_empty_locator() {
    let gateway = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/ipfs/{CID_A}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": "Sunset",
            "image": format!("ipfs://{CID_B}")
        })))
        .expect(1)
        .mount(&gateway)
        .await;

    let fetcher = MetadataFetcher::new(
        ContentResolver::new(vec![Gateway::public(gateway.uri())]),
        Duration::from_secs(5),
        "mintfeed-test",
    )
    .unwrap();
    let merger = FanOutMerger::new(fetcher);

    let merged = merger
        .merge(vec![
            create_record("1", &format!("ipfs://{CID_A}")),
            create_record("2", ""),
        ])
        .await;

    assert_eq!(merged.len(), 2);
    assert_eq!(merged[0].id(), "1");
    assert_eq!(merged[0].display_name(), "Sunset");
    assert_eq!(merged[0].image_locator(), Some(format!("ipfs://{CID_B}").as_str()));
    assert_eq!(merged[1].id(), "2");
    assert!(merged[1].metadata.is_none());
    assert_eq!(merged[1].display_name(), "NFT #2");
}

/// Test that a failed fetch only affects its own record
#[tokio::test]
async fn test_failure_isolated_to_record() {
    let gateway = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/ipfs/{CID_A}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "name": "Ok" })))
        .mount(&gateway)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/ipfs/{CID_B}")))
        .respond_with(ResponseTemplate::new(404))
        .mount(&gateway)
        .await;

    let fetcher = MetadataFetcher::new(
        ContentResolver::new(vec![Gateway::public(gateway.uri())]),
        Duration::from_secs(5),
        "mintfeed-test",
    )
    .unwrap();

    let merged = FanOutMerger::new(fetcher)
        .merge(vec![
            create_record("a", &format!("ipfs://{CID_B}")),
            create_record("b", &format!("ipfs://{CID_A}")),
            create_record("c", "not a locator"),
        ])
        .await;

    let names: Vec<String> = merged.iter().map(|r| r.display_name()).collect();
    assert_eq!(names, vec!["NFT #a", "Ok", "NFT #c"]);
}

/// Test that every record gets exactly one metadata lookup
#[tokio::test]
async fn test_one_lookup_per_record() {
    let source = Arc::new(StaticMetadata::new([(
        "ipfs://known".to_string(),
        named("Known"),
    )]));
    let merger = FanOutMerger::new(Arc::clone(&source));

    let records: Vec<_> = (0..25)
        .map(|i| create_record(&i.to_string(), if i % 2 == 0 { "ipfs://known" } else { "" }))
        .collect();
    let merged = merger.merge(records).await;

    assert_eq!(merged.len(), 25);
    assert_eq!(source.calls(), 25);
    assert_eq!(merged.iter().filter(|r| r.metadata.is_some()).count(), 13);
}

proptest! {
    /// Output preserves length, order and the base record of every input
    #[test]
    fn prop_merge_preserves_order(ids in proptest::collection::vec("[a-z0-9]{1,8}", 0..40),
                                  resolvable in proptest::collection::vec(any::<bool>(), 40)) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        let records: Vec<_> = ids
            .iter()
            .enumerate()
            .map(|(i, id)| {
                let locator = if resolvable[i] { format!("ipfs://{id}") } else { String::new() };
                create_record(id, &locator)
            })
            .collect();

        let documents = ids
            .iter()
            .map(|id| (format!("ipfs://{id}"), named(id)));
        let merger = FanOutMerger::new(StaticMetadata::new(documents));

        let merged = runtime.block_on(merger.merge(records.clone()));

        prop_assert_eq!(merged.len(), records.len());
        for (i, (merged, base)) in merged.iter().zip(&records).enumerate() {
            prop_assert_eq!(&merged.base, base);
            prop_assert_eq!(merged.metadata.is_some(), resolvable[i]);
        }
    }
}
