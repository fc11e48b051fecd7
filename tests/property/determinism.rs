//! Property-based tests for fingerprinting, classification and id derivation

use chrono::{TimeZone, Utc};
use provgraph::canonical::{canonical_json, fingerprint};
use provgraph::content::{ContentItem, ContentKind};
use provgraph::diff::{classify, Action};
use provgraph::hierarchy::{derive_id, normalize};
use provgraph::record::{AssetRecord, Location, RecordBuilder, SigningOrg};
use provgraph::types::AssetId;
use proptest::prelude::*;

fn builder() -> RecordBuilder {
    RecordBuilder::new(SigningOrg {
        name: "pqr".to_string(),
        unit: "newsroom".to_string(),
    })
}

fn record(text: bool, title: &str, description: &str, secs: i64) -> AssetRecord {
    let published = Utc.timestamp_opt(secs, 0).unwrap();
    let mut item = if text {
        ContentItem::text("body", title, published)
    } else {
        ContentItem::image("https://cdn.pqr.news/p.jpg", title, published)
    };
    item.description = description.to_string();
    builder().draft(&item, &AssetId([5; 32]))
}

fn locations() -> impl Strategy<Value = Vec<Location>> {
    prop::collection::vec(
        ("[a-z]{2,5}", "[a-z0-9/]{1,20}").prop_map(|(protocol, path)| Location {
            uri: format!("{}://{}", protocol, path),
            protocol,
        }),
        0..4,
    )
}

proptest! {
    /// Fingerprinting is stable and ignores locations
    #[test]
    fn fingerprint_is_idempotent(
        text in any::<bool>(),
        title in "[ -~]{1,40}",
        description in "[ -~]{1,40}",
        secs in 0i64..4_000_000_000,
        locs in locations(),
    ) {
        let plain = record(text, &title, &description, secs);
        let mut located = plain.clone();
        located.locations = locs;

        prop_assert_eq!(fingerprint(&plain), fingerprint(&plain.clone()));
        prop_assert_eq!(fingerprint(&plain), fingerprint(&located));
    }

    /// Same record with only locations and, for non-text, the timestamp changed is a no-op
    #[test]
    fn noop_stability(
        text in any::<bool>(),
        title in "[ -~]{1,40}",
        secs in 0i64..4_000_000_000,
        shift in 1i64..1_000_000,
        locs in locations(),
    ) {
        let prior = record(text, &title, &title, secs);
        let mut candidate = if text {
            prior.clone()
        } else {
            record(text, &title, &title, secs + shift)
        };
        candidate.locations = locs;

        let kind = if text { ContentKind::Text } else { ContentKind::Image };
        prop_assert_eq!(classify(Some(&prior), &candidate, kind), Action::Noop);
    }

    /// Text records treat a new timestamp as a change
    #[test]
    fn text_timestamp_is_significant(
        secs in 0i64..4_000_000_000,
        shift in 1i64..1_000_000,
    ) {
        let prior = record(true, "t", "d", secs);
        let candidate = record(true, "t", "d", secs + shift);
        prop_assert_ne!(fingerprint(&prior), fingerprint(&candidate));
        prop_assert_eq!(
            classify(Some(&prior), &candidate, ContentKind::Text),
            Action::Publish
        );
    }

    /// Case and whitespace never change a derived id
    #[test]
    fn derived_ids_ignore_case_and_whitespace(label in "[a-z0-9-]{1,24}", pad in " {0,3}") {
        let noisy = format!("{}{}{}", pad, label.to_uppercase(), pad);
        prop_assert_eq!(normalize(&noisy), label.clone());
        prop_assert_eq!(derive_id(&noisy), derive_id(&label));
    }

    /// Canonical JSON does not depend on insertion order
    #[test]
    fn canonical_json_sorts_keys(keys in prop::collection::btree_set("[a-z]{1,8}", 1..8)) {
        let forward: serde_json::Map<String, serde_json::Value> =
            keys.iter().map(|k| (k.clone(), serde_json::Value::from(k.len()))).collect();
        let reverse: serde_json::Map<String, serde_json::Value> =
            keys.iter().rev().map(|k| (k.clone(), serde_json::Value::from(k.len()))).collect();
        prop_assert_eq!(
            canonical_json(&serde_json::Value::Object(forward)),
            canonical_json(&serde_json::Value::Object(reverse))
        );
    }
}

