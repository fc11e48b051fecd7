//! Batch ordering, failure policies and write guards

use super::support::*;
use provgraph::content::ContentKind;
use provgraph::error::{encode_error_string, CollaboratorErrorKind, PublishError};
use provgraph::publish::FailurePolicy;

fn items() -> Vec<provgraph::content::ContentItem> {
    vec![
        image_item(PHOTO, "Skyline", at(2024, 3, 9)),
        text_item("", at(2024, 3, 9)),
        text_item("<p>Story</p>", at(2024, 3, 9)),
        image_item(CHART, "Chart", at(2024, 3, 9)),
    ]
}

#[tokio::test]
async fn test_continue_reports_every_item_in_order() {
    let harness = Harness::new();
    let report = harness.publisher().publish_batch(&items()).await;

    assert!(!report.aborted);
    assert_eq!(report.results.len(), 4);
    let indexes: Vec<usize> = report.results.iter().map(|r| r.index).collect();
    assert_eq!(indexes, vec![0, 1, 2, 3]);

    let failures: Vec<usize> = report.failures().map(|(i, _)| i).collect();
    assert_eq!(failures, vec![1]);

    let kinds: Vec<ContentKind> = report.published().into_iter().map(|(_, k)| k).collect();
    assert_eq!(kinds, vec![ContentKind::Image, ContentKind::Text, ContentKind::Image]);
}

#[tokio::test]
async fn test_abort_stops_at_first_failure() {
    let harness = Harness::new();
    let mut settings = settings();
    settings.failure_policy = FailurePolicy::Abort;

    let report = harness.publisher_with(settings).publish_batch(&items()).await;

    assert!(report.aborted);
    assert_eq!(report.results.len(), 2);
    assert_eq!(report.failure_count(), 1);
    assert_eq!(harness.ledger.publish_count(), 1);
}

#[tokio::test]
async fn test_price_above_ceiling_blocks_every_write() {
    let harness = Harness::new();
    harness.ledger.set_price(500);
    let mut settings = settings();
    settings.price_ceiling = Some(100);

    let err = harness
        .publisher_with(settings)
        .publish_item(&image_item(PHOTO, "Skyline", at(2024, 3, 9)))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PublishError::PriceCeiling {
            current: 500,
            ceiling: 100
        }
    ));
    assert_eq!(harness.ledger.write_count(), 0);
}

#[tokio::test]
async fn test_ledger_revert_is_decoded_and_not_retried() {
    let harness = Harness::new();
    harness
        .ledger
        .fail_next_write(encode_error_string("org suspended"));

    let report = harness
        .publisher()
        .publish_batch(&[image_item(PHOTO, "Skyline", at(2024, 3, 9))])
        .await;

    let (_, err) = report.failures().next().unwrap();
    match err {
        PublishError::Collaborator(e) => {
            assert_eq!(e.kind, CollaboratorErrorKind::Revert);
            assert_eq!(e.message, "org suspended");
        }
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(harness.ledger.write_count(), 0);
}

#[tokio::test]
async fn test_panic_code_is_decoded() {
    let harness = Harness::new();
    let mut raw = vec![0x4e, 0x48, 0x7b, 0x71];
    let mut word = [0u8; 32];
    word[31] = 0x11;
    raw.extend_from_slice(&word);
    harness.ledger.fail_next_write(raw);

    let err = harness
        .publisher()
        .publish_item(&image_item(PHOTO, "Skyline", at(2024, 3, 9)))
        .await
        .unwrap_err();

    match err {
        PublishError::Collaborator(e) => assert_eq!(e.kind, CollaboratorErrorKind::Panic),
        other => panic!("unexpected error: {}", other),
    }
}
