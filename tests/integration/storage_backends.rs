//! Both storage backends behave the same behind RecordStorage

use super::support::*;
use provgraph::diff::Action;
use provgraph::ledger::MemoryLedger;
use provgraph::publish::Publisher;
use provgraph::signing::Signer;
use provgraph::storage::{ContentAddressedStore, ObjectStore, RecordStorage};
use std::sync::Arc;
use tempfile::TempDir;

async fn exercise(storage: Arc<dyn RecordStorage>, scheme: &str) {
    let ledger = Arc::new(MemoryLedger::new());
    let signer: Arc<dyn Signer> = signer();
    let publisher = Publisher::new(
        settings(),
        ledger.clone(),
        storage.clone(),
        Arc::new(fetcher()),
        signer,
    );

    let first = publisher
        .publish_item(&image_item(PHOTO, "Skyline", at(2024, 3, 9)))
        .await
        .unwrap();
    let location = first.record_location.clone().unwrap();
    assert!(location.starts_with(scheme), "{} should use {}", location, scheme);

    let record = storage.get_record(&location).await.unwrap();
    assert!(record.is_signed());

    let unchanged = publisher
        .publish_item(&image_item(PHOTO, "Skyline", at(2024, 3, 9)))
        .await
        .unwrap();
    assert_eq!(unchanged.action, Action::Noop);

    let changed = publisher
        .publish_item(&image_item(PHOTO, "Skyline, retitled", at(2024, 3, 9)))
        .await
        .unwrap();
    assert_eq!(changed.action, Action::SetUri);
    assert_ne!(changed.record_location, first.record_location);

    // The superseded record stays readable
    let old = storage.get_record(&location).await.unwrap();
    assert_eq!(old.manifest.title, "Skyline");
}

#[tokio::test]
async fn test_content_addressed_store() {
    let dir = TempDir::new().unwrap();
    exercise(Arc::new(ContentAddressedStore::new(dir.path()).unwrap()), "cas://").await;
}

#[tokio::test]
async fn test_object_store() {
    let dir = TempDir::new().unwrap();
    exercise(Arc::new(ObjectStore::new(dir.path()).unwrap()), "kv://record/").await;
}
