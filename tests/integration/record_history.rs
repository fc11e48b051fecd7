//! History is append-only across re-publishes of one asset

use super::support::*;
use provgraph::diff::Action;

#[tokio::test]
async fn test_history_grows_by_one_location_per_change() {
    let harness = Harness::new();
    let publisher = harness.publisher();
    let mut locations = Vec::new();

    for step in 1..=5 {
        let title = format!("Skyline, take {}", step);
        let published = publisher
            .publish_item(&image_item(PHOTO, &title, at(2024, 3, 9)))
            .await
            .unwrap();
        let expected_action = if step == 1 { Action::Publish } else { Action::SetUri };
        assert_eq!(published.action, expected_action);

        let (_, record) = harness.current(&published.identity).await;
        assert_eq!(record.manifest.history.len(), step - 1);
        assert_eq!(record.manifest.history, locations);

        locations.push(published.record_location.unwrap());
    }
}

#[tokio::test]
async fn test_text_history_follows_reanchors() {
    let harness = Harness::new();
    let publisher = harness.publisher();

    let mut locations = Vec::new();
    for day in 1..=3 {
        let published = publisher
            .publish_item(&text_item("<p>Body</p>", at(2024, 4, day)))
            .await
            .unwrap();
        let (_, record) = harness.current(&published.identity).await;
        assert_eq!(record.manifest.history, locations);
        locations.push(published.record_location.unwrap());
    }
    assert_eq!(harness.ledger.publish_count(), 3);
}

#[tokio::test]
async fn test_noop_leaves_history_untouched() {
    let harness = Harness::new();
    let publisher = harness.publisher();

    publisher
        .publish_item(&image_item(PHOTO, "Skyline", at(2024, 3, 9)))
        .await
        .unwrap();
    let changed = publisher
        .publish_item(&image_item(PHOTO, "Skyline II", at(2024, 3, 9)))
        .await
        .unwrap();
    let unchanged = publisher
        .publish_item(&image_item(PHOTO, "Skyline II", at(2024, 5, 9)))
        .await
        .unwrap();

    assert_eq!(unchanged.action, Action::Noop);
    let (_, record) = harness.current(&changed.identity).await;
    assert_eq!(record.manifest.history.len(), 1);
}
