//! Change classification between a prior record and a new candidate

use crate::canonical::fingerprint;
use crate::content::ContentKind;
use crate::record::AssetRecord;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ledger action chosen for one item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    /// New ledger entry
    Publish,
    /// Pointer update on an existing entry
    SetUri,
    /// No ledger write
    Noop,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::Publish => "PUBLISH",
            Action::SetUri => "SET_URI",
            Action::Noop => "NOOP",
        })
    }
}

/// Classify what must happen on the ledger for `candidate`.
///
/// - no prior record: `Publish`
/// - equal fingerprints: `Noop`
/// - changed text item: `Publish` (re-anchored under its article)
/// - changed item of any other kind: `SetUri` (node and token preserved)
///
/// The branch follows the item's kind, not the record's MIME type; a binary
/// item may legitimately declare `text/html`.
pub fn classify(prior: Option<&AssetRecord>, candidate: &AssetRecord, kind: ContentKind) -> Action {
    let Some(prior) = prior else {
        return Action::Publish;
    };

    if fingerprint(prior) == fingerprint(candidate) {
        return Action::Noop;
    }

    if kind.is_text() {
        Action::Publish
    } else {
        Action::SetUri
    }
}
