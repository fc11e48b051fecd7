//! Verification of records produced by the publisher

use super::support::*;
use provgraph::identity::MemoryIdentityRegistry;
use provgraph::signing::Signer;
use provgraph::types::AssetId;
use provgraph::verify::{verify, verify_published};

#[tokio::test]
async fn test_published_record_verifies() {
    let harness = Harness::new();
    let registry = MemoryIdentityRegistry::new();
    registry.register(&harness.signer.address(), "0xnewsroom");
    registry.register("0xnewsroom", "0xpqr");

    let published = harness
        .publisher()
        .publish_item(&text_item("<p>Verified</p>", at(2024, 3, 9)))
        .await
        .unwrap();

    let (record, report) = verify_published(
        &published.identity,
        harness.ledger.as_ref(),
        harness.storage.as_ref(),
        &registry,
    )
    .await
    .unwrap();

    assert!(report.signature_verified);
    assert!(report.content_binding_verified);
    assert_eq!(report.signer, Some(harness.signer.address()));
    assert_eq!(report.root_identity, Some("0xpqr".to_string()));
    assert_eq!(record.content_binding.hash, published.identity.to_hex());
}

#[tokio::test]
async fn test_tampered_record_reports_failure_but_keeps_identity() {
    let harness = Harness::new();
    let registry = MemoryIdentityRegistry::new();
    registry.register(&harness.signer.address(), "0xpqr");

    let published = harness
        .publisher()
        .publish_item(&image_item(PHOTO, "Skyline", at(2024, 3, 9)))
        .await
        .unwrap();
    let (_, mut record) = harness.current(&published.identity).await;
    record.manifest.credited_source = "someone else".to_string();

    let report = verify(&published.identity, &record, &registry).await.unwrap();
    assert!(!report.signature_verified);
    assert!(report.content_binding_verified);
    assert_eq!(report.root_identity, Some("0xpqr".to_string()));

    let report = verify(&AssetId([0; 32]), &record, &registry).await.unwrap();
    assert!(!report.content_binding_verified);
}

#[tokio::test]
async fn test_unknown_asset_is_consistency_error() {
    let harness = Harness::new();
    let registry = MemoryIdentityRegistry::new();

    let err = verify_published(
        &AssetId([7; 32]),
        harness.ledger.as_ref(),
        harness.storage.as_ref(),
        &registry,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, provgraph::error::PublishError::Consistency(_)));
}
