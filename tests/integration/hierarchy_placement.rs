//! Hierarchy placement and idempotent segment creation

use super::support::*;
use provgraph::content::ContentItem;
use provgraph::error::{ContentError, PublishError};
use provgraph::hierarchy::{derive_id, HierarchyResolver, PlacementPolicy, Segment, ORIGINAL_MATERIAL};
use provgraph::ledger::{Ledger, MemoryLedger, NodeType};
use std::sync::Arc;

#[tokio::test]
async fn test_ensure_segment_twice_creates_once() {
    let ledger = Arc::new(MemoryLedger::new());
    let resolver = HierarchyResolver::new(ledger.clone(), None);
    let root = Segment::root(ORG);

    let first = resolver.ensure_segment(None, &root).await.unwrap();
    let second = resolver.ensure_segment(None, &root).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first, derive_id(ORG));
    assert_eq!(ledger.create_count(), 1);
}

#[tokio::test]
async fn test_segment_created_by_another_writer_is_reused() {
    let ledger = Arc::new(MemoryLedger::new());
    let root = Segment::root(ORG);
    ledger
        .create_node(root.id, None, NodeType::Org, None)
        .await
        .unwrap();

    let resolver = HierarchyResolver::new(ledger.clone(), None);
    let ids = resolver.resolve_path(&root, &["licensed", "image"]).await.unwrap();

    assert_eq!(ids[0], root.id);
    assert_eq!(ids[2], root.child("licensed").child("image").id);
    assert_eq!(ledger.create_count(), 3);
}

#[tokio::test]
async fn test_owned_image_sits_under_original_material() {
    let harness = Harness::new();
    let published = harness
        .publisher()
        .publish_item(&image_item(PHOTO, "Skyline", at(2024, 3, 9)))
        .await
        .unwrap();

    assert_eq!(published.parent, Some(Segment::root(ORG).child(ORIGINAL_MATERIAL).id));
}

#[tokio::test]
async fn test_dated_placement_reuses_day_container() {
    let harness = Harness::new();
    let mut dated = settings();
    dated.placement = PlacementPolicy::Dated;
    let publisher = harness.publisher_with(dated);

    let first = publisher
        .publish_item(&image_item(PHOTO, "Morning", at(2024, 3, 9)))
        .await
        .unwrap();
    let creates = harness.ledger.create_count();
    let second = publisher
        .publish_item(&image_item(CHART, "Evening", at(2024, 3, 9)))
        .await
        .unwrap();

    let day = Segment::root(ORG)
        .child("owned")
        .child("image")
        .child("2024")
        .child("03")
        .child("2024-03-09");
    assert_eq!(first.parent, Some(day.id));
    assert_eq!(second.parent, Some(day.id));
    assert_eq!(creates, 6);
    assert_eq!(harness.ledger.create_count(), creates);
}

#[tokio::test]
async fn test_owned_text_without_article_is_rejected_up_front() {
    let harness = Harness::new();
    let item = ContentItem::text("orphan paragraph", "Orphan", at(2024, 3, 9));

    let err = harness.publisher().publish_item(&item).await.unwrap_err();

    assert!(matches!(
        err,
        PublishError::Content(ContentError::MissingField("article"))
    ));
    assert_eq!(harness.ledger.write_count(), 0);
}

#[tokio::test]
async fn test_noop_can_resolve_hierarchy_when_configured() {
    let harness = Harness::new();
    let mut eager = settings();
    eager.resolve_hierarchy_on_noop = true;
    let publisher = harness.publisher_with(eager);

    publisher
        .publish_item(&image_item(PHOTO, "Skyline", at(2024, 3, 9)))
        .await
        .unwrap();
    let again = publisher
        .publish_item(&image_item(PHOTO, "Skyline", at(2024, 3, 9)))
        .await
        .unwrap();

    assert_eq!(again.parent, Some(Segment::root(ORG).child(ORIGINAL_MATERIAL).id));
    assert!(again.receipt.is_none());
}
