//! End-to-end publish scenarios over the memory ledger

use super::support::*;
use provgraph::content::{ContentBody, Ownership, TEXT_MIME};
use provgraph::diff::Action;
use provgraph::hierarchy::{article_container_id, license_parent_id};
use provgraph::types::{AssetId, NodeId};

#[tokio::test]
async fn test_new_text_item_is_published() {
    let harness = Harness::new();
    let publisher = harness.publisher();

    let published = publisher
        .publish_item(&text_item("hello world", at(2024, 3, 9)))
        .await
        .unwrap();

    assert_eq!(published.identity, AssetId(*blake3::hash(b"hello world").as_bytes()));
    assert_eq!(published.action, Action::Publish);
    assert_eq!(published.parent, Some(article_container_id(ORIGIN, "1")));
    assert_eq!(harness.ledger.publish_count(), 1);

    let (node, record) = harness.current(&published.identity).await;
    assert!(record.manifest.history.is_empty());
    assert_eq!(record.content_binding.hash, published.identity.to_hex());
    assert_eq!(Some(node.uri), published.record_location);
}

#[tokio::test]
async fn test_text_with_new_timestamp_is_republished() {
    let harness = Harness::new();
    let publisher = harness.publisher();

    let first = publisher
        .publish_item(&text_item("hello world", at(2024, 3, 9)))
        .await
        .unwrap();
    let (first_node, _) = harness.current(&first.identity).await;

    let second = publisher
        .publish_item(&text_item("hello world", at(2024, 3, 10)))
        .await
        .unwrap();

    assert_eq!(second.identity, first.identity);
    assert_eq!(second.action, Action::Publish);
    assert_eq!(harness.ledger.publish_count(), 2);
    assert_eq!(harness.ledger.set_uri_count(), 0);

    let (node, record) = harness.current(&second.identity).await;
    assert_eq!(record.manifest.history, vec![first.record_location.unwrap()]);
    assert_eq!(record.manifest.published, "2024-03-10T12:00:00Z");
    assert_eq!(node.reference_of, Some(first_node.token));
}

#[tokio::test]
async fn test_image_with_new_timestamp_only_is_noop() {
    let harness = Harness::new();
    let publisher = harness.publisher();

    let first = publisher
        .publish_item(&image_item(PHOTO, "Skyline", at(2024, 3, 9)))
        .await
        .unwrap();
    let writes = harness.ledger.write_count();

    let second = publisher
        .publish_item(&image_item(PHOTO, "Skyline", at(2024, 6, 1)))
        .await
        .unwrap();

    assert_eq!(second.action, Action::Noop);
    assert_eq!(second.record_location, first.record_location);
    assert!(second.receipt.is_none());
    assert_eq!(harness.ledger.write_count(), writes);
}

#[tokio::test]
async fn test_image_metadata_change_sets_uri_in_place() {
    let harness = Harness::new();
    let publisher = harness.publisher();

    let first = publisher
        .publish_item(&image_item(PHOTO, "Skyline", at(2024, 3, 9)))
        .await
        .unwrap();
    let (first_node, _) = harness.current(&first.identity).await;

    let second = publisher
        .publish_item(&image_item(PHOTO, "Skyline at dusk", at(2024, 3, 9)))
        .await
        .unwrap();

    assert_eq!(second.action, Action::SetUri);
    assert_eq!(harness.ledger.publish_count(), 1);
    assert_eq!(harness.ledger.set_uri_count(), 1);

    let (node, record) = harness.current(&second.identity).await;
    assert_eq!(node.token, first_node.token);
    assert_eq!(node.parent, first_node.parent);
    assert_eq!(record.manifest.title, "Skyline at dusk");
    assert_eq!(record.manifest.history, vec![first.record_location.unwrap()]);
    assert_eq!(second.parent, first.parent);
}

#[tokio::test]
async fn test_binary_declaring_html_mime_is_updated_in_place() {
    let harness = Harness::new();
    let publisher = harness.publisher();
    let page = |title: &str| {
        let mut item = image_item(PHOTO, title, at(2024, 3, 9));
        item.body = ContentBody::Binary {
            locator: PHOTO.to_string(),
            mime: TEXT_MIME.to_string(),
        };
        item
    };

    let first = publisher.publish_item(&page("Archive page")).await.unwrap();
    assert_eq!(first.action, Action::Publish);

    let second = publisher
        .publish_item(&page("Archive page, corrected"))
        .await
        .unwrap();

    assert_eq!(second.action, Action::SetUri);
    assert_eq!(harness.ledger.publish_count(), 1);
    assert_eq!(harness.ledger.set_uri_count(), 1);

    let (_, record) = harness.current(&second.identity).await;
    assert_eq!(record.mime_type, TEXT_MIME);
    assert_eq!(record.manifest.title, "Archive page, corrected");
}

#[tokio::test]
async fn test_licensed_item_lands_under_license_container() {
    let harness = Harness::new();
    let publisher = harness.publisher();
    let expected = NodeId(*blake3::hash(b"pqr-license-acme").as_bytes());

    let mut photo = image_item(PHOTO, "Wire photo", at(2024, 3, 9));
    photo.ownership = Ownership::Licensed {
        from: "acme".to_string(),
    };
    let mut chart = image_item(CHART, "Wire chart", at(2024, 3, 9));
    chart.ownership = Ownership::Licensed {
        from: " ACME".to_string(),
    };

    let first = publisher.publish_item(&photo).await.unwrap();
    let creates = harness.ledger.create_count();
    let second = publisher.publish_item(&chart).await.unwrap();

    assert_eq!(license_parent_id(ORG, "acme"), expected);
    assert_eq!(first.parent, Some(expected));
    assert_eq!(second.parent, Some(expected));
    assert_eq!(creates, 2, "org root and license container");
    assert_eq!(harness.ledger.create_count(), creates);
}

#[tokio::test]
async fn test_unreachable_locator_fails_before_any_write() {
    let harness = Harness::new();
    let publisher = harness.publisher();

    let err = publisher
        .publish_item(&image_item("https://cdn.pqr.news/missing.jpg", "Gone", at(2024, 3, 9)))
        .await
        .unwrap_err();

    assert!(matches!(err, provgraph::error::PublishError::Fetch(_)));
    assert_eq!(harness.ledger.write_count(), 0);
}
