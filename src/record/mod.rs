//! Asset records
//!
//! The signed, versioned metadata envelope describing one asset. The JSON
//! layout produced here is the at-rest format: it is read back by the
//! existence lookup and by third parties verifying a record, so field names
//! and nesting must not drift.

pub mod builder;

pub use builder::RecordBuilder;

use crate::error::ContentError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Digest algorithm name written to `contentBinding.algo`.
pub const BINDING_ALGO: &str = "blake3";

/// Curve name written to `signature.curve`.
pub const SIGNATURE_CURVE: &str = "ed25519";

/// One storage location of the asset bytes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub protocol: String,
    pub uri: String,
}

/// Organization that signed the record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningOrg {
    pub name: String,
    pub unit: String,
}

/// Descriptive manifest
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub uri: String,
    pub title: String,
    pub description: String,
    pub credited_source: String,
    pub signing_org: SigningOrg,
    /// RFC 3339 publication timestamp; blanked before fingerprinting
    /// non-text records.
    pub published: String,
    /// Prior record locations, oldest first. Append-only.
    pub history: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentBinding {
    pub algo: String,
    pub hash: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSignature {
    pub curve: String,
    pub signature: String,
    /// Hex digest of the record's data portion
    pub message: String,
    pub description: String,
}

/// AssetRecord ("AssetNode")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetRecord {
    pub description: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub encrypted: bool,
    pub access: BTreeMap<String, serde_json::Value>,
    pub locations: Vec<Location>,
    pub manifest: Manifest,
    pub content_binding: ContentBinding,
    #[serde(default)]
    pub signature: RecordSignature,
}

impl AssetRecord {
    /// Fields that must be present before a record may be signed.
    pub fn validate(&self) -> Result<(), ContentError> {
        if self.description.trim().is_empty() {
            return Err(ContentError::MissingField("description"));
        }
        if self.manifest.uri.trim().is_empty() {
            return Err(ContentError::MissingField("manifest.uri"));
        }
        if self.content_binding.hash.trim().is_empty() {
            return Err(ContentError::MissingField("contentBinding.hash"));
        }
        if self.encrypted && self.access.is_empty() {
            return Err(ContentError::EncryptedWithoutCiphertext);
        }
        Ok(())
    }

    pub fn is_signed(&self) -> bool {
        !self.signature.signature.is_empty()
    }

    /// The signed portion of the record: everything except `signature`.
    pub fn data_portion(&self) -> serde_json::Value {
        let mut value = serde_json::to_value(self).unwrap_or(serde_json::Value::Null);
        if let Some(map) = value.as_object_mut() {
            map.remove("signature");
        }
        value
    }
}
