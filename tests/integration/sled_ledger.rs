//! Publishing against the persistent sled ledger

use super::support::*;
use provgraph::diff::Action;
use provgraph::ledger::{Ledger, SledLedger};
use provgraph::publish::Publisher;
use provgraph::signing::Signer;
use provgraph::storage::{ContentAddressedStore, RecordStorage};
use provgraph::types::NodeId;
use std::sync::Arc;
use tempfile::TempDir;

fn publisher(ledger: Arc<SledLedger>, storage: Arc<dyn RecordStorage>) -> Publisher {
    let signer: Arc<dyn Signer> = signer();
    Publisher::new(settings(), ledger, storage, Arc::new(fetcher()), signer)
}

#[tokio::test]
async fn test_state_survives_reopen() {
    let ledger_dir = TempDir::new().unwrap();
    let storage_dir = TempDir::new().unwrap();
    let storage: Arc<dyn RecordStorage> =
        Arc::new(ContentAddressedStore::new(storage_dir.path()).unwrap());

    let first = {
        let ledger = Arc::new(SledLedger::open(ledger_dir.path(), 1).unwrap());
        let published = publisher(ledger.clone(), storage.clone())
            .publish_item(&image_item(PHOTO, "Skyline", at(2024, 3, 9)))
            .await
            .unwrap();
        ledger.db().flush().unwrap();
        published
    };

    let ledger = Arc::new(SledLedger::open(ledger_dir.path(), 1).unwrap());
    let node = ledger
        .get_node_by_id(&NodeId::from(first.identity))
        .await
        .unwrap()
        .expect("asset node after reopen");
    assert_eq!(Some(node.uri.clone()), first.record_location);

    let again = publisher(ledger.clone(), storage.clone())
        .publish_item(&image_item(PHOTO, "Skyline", at(2024, 3, 9)))
        .await
        .unwrap();
    assert_eq!(again.action, Action::Noop);

    let parent = ledger.parent_of(node.token).await.unwrap().unwrap();
    let siblings = ledger.children_of(parent.token).await.unwrap();
    assert_eq!(siblings.len(), 1);
}

#[tokio::test]
async fn test_text_reanchor_on_sled() {
    let ledger_dir = TempDir::new().unwrap();
    let storage_dir = TempDir::new().unwrap();
    let storage: Arc<dyn RecordStorage> =
        Arc::new(ContentAddressedStore::new(storage_dir.path()).unwrap());
    let ledger = Arc::new(SledLedger::open(ledger_dir.path(), 1).unwrap());
    let publisher = publisher(ledger.clone(), storage.clone());

    let first = publisher
        .publish_item(&text_item("<p>Body</p>", at(2024, 3, 9)))
        .await
        .unwrap();
    let second = publisher
        .publish_item(&text_item("<p>Body</p>", at(2024, 3, 10)))
        .await
        .unwrap();

    assert_eq!(second.action, Action::Publish);
    let node = ledger
        .get_node_by_id(&NodeId::from(second.identity))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(Some(node.uri), second.record_location);
    assert_eq!(
        node.reference_of,
        first.receipt.map(|r| r.token),
        "re-anchored node references the first publication"
    );
}
