//! Canonical digests for content and records
//!
//! `identity` digests the content itself; `fingerprint` digests a record with
//! its volatile fields stripped so that location and clock drift never look
//! like a change.

use crate::content::{ContentBody, ContentItem, TEXT_MIME};
use crate::error::{ContentError, PublishError};
use crate::fetch::ContentFetcher;
use crate::record::AssetRecord;
use crate::types::{AssetId, Fingerprint, Hash};
use blake3::Hasher;
use serde_json::{Map, Value};

/// Content bytes together with their identity
#[derive(Debug, Clone)]
pub struct LoadedContent {
    pub identity: AssetId,
    pub bytes: Vec<u8>,
}

/// Compute a generic hash of arbitrary data
pub fn compute_hash(data: &[u8]) -> Hash {
    let mut hasher = Hasher::new();
    hasher.update(data);
    *hasher.finalize().as_bytes()
}

/// Identity of a text body: the digest of the literal body.
pub fn text_identity(body: &str) -> Result<AssetId, ContentError> {
    if body.is_empty() {
        return Err(ContentError::EmptyBody);
    }
    Ok(AssetId(compute_hash(body.as_bytes())))
}

/// Load an item's bytes and compute its identity.
///
/// Text bodies are digested as-is; binary kinds are fetched from their
/// locator first. An empty fetch result is rejected like an empty body.
pub async fn load(
    item: &ContentItem,
    fetcher: &dyn ContentFetcher,
) -> Result<LoadedContent, PublishError> {
    match &item.body {
        ContentBody::Text { body } => {
            let identity = text_identity(body)?;
            Ok(LoadedContent {
                identity,
                bytes: body.as_bytes().to_vec(),
            })
        }
        ContentBody::Image { locator, .. }
        | ContentBody::Video { locator, .. }
        | ContentBody::Binary { locator, .. } => {
            if locator.trim().is_empty() {
                return Err(ContentError::EmptyLocator.into());
            }
            let bytes = fetcher.fetch(locator).await?;
            if bytes.is_empty() {
                return Err(ContentError::EmptyBody.into());
            }
            Ok(LoadedContent {
                identity: AssetId(compute_hash(&bytes)),
                bytes,
            })
        }
    }
}

/// Identity of an item without keeping its bytes.
pub async fn identity(
    item: &ContentItem,
    fetcher: &dyn ContentFetcher,
) -> Result<AssetId, PublishError> {
    load(item, fetcher).await.map(|c| c.identity)
}

/// Fingerprint of a record for change detection.
///
/// Strips `locations`, and for every type other than the text marker also
/// blanks `manifest.published`. The signature is never part of the
/// fingerprint since it is derived from the rest of the record.
pub fn fingerprint(record: &AssetRecord) -> Fingerprint {
    let mut stripped = record.clone();
    stripped.locations.clear();
    if stripped.mime_type != TEXT_MIME {
        stripped.manifest.published.clear();
    }
    Fingerprint(compute_hash(canonical_json(&stripped.data_portion()).as_bytes()))
}

/// Digest of a record's signed data portion.
pub fn record_digest(record: &AssetRecord) -> Hash {
    compute_hash(canonical_json(&record.data_portion()).as_bytes())
}

/// Serialize a JSON value with object keys in sorted order and no whitespace.
pub fn canonical_json(value: &Value) -> String {
    sorted(value).to_string()
}

fn sorted(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut out = Map::new();
            for key in keys {
                out.insert(key.clone(), sorted(&map[key]));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(sorted).collect()),
        other => other.clone(),
    }
}
