//! Record construction and signing
//!
//! construct → sign → persist is the only path a record takes. A change to
//! an existing asset produces a new record that lists the superseded
//! record's location at the end of `manifest.history`.

use crate::canonical::record_digest;
use crate::content::ContentItem;
use crate::diff::Action;
use crate::error::PublishError;
use crate::record::{
    AssetRecord, ContentBinding, Location, Manifest, RecordSignature, SigningOrg, BINDING_ALGO,
    SIGNATURE_CURVE,
};
use crate::signing::Signer;
use crate::types::AssetId;
use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::BTreeMap;

/// A record already on storage, with the location it was read from
#[derive(Debug, Clone, PartialEq)]
pub struct PriorRecord {
    pub record: AssetRecord,
    pub location: String,
}

fn system_clock() -> DateTime<Utc> {
    Utc::now()
}

/// Builds unsigned records from content items and signs them
pub struct RecordBuilder {
    org: SigningOrg,
    signature_description: String,
    clock: fn() -> DateTime<Utc>,
}

impl RecordBuilder {
    pub fn new(org: SigningOrg) -> Self {
        Self {
            signature_description: format!("Signed by {} ({})", org.name, org.unit),
            org,
            clock: system_clock,
        }
    }

    pub fn with_signature_description(mut self, description: impl Into<String>) -> Self {
        self.signature_description = description.into();
        self
    }

    /// Replace the clock used to restamp superseded non-text records.
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    /// Fresh, unsigned record describing `item`.
    ///
    /// `locations` starts empty; only stored copies made by the engine (such
    /// as ciphertext) are ever listed there.
    pub fn draft(&self, item: &ContentItem, identity: &AssetId) -> AssetRecord {
        let manifest_uri = item
            .article
            .as_ref()
            .map(|a| a.uri.clone())
            .or_else(|| item.body.locator().map(str::to_string))
            .unwrap_or_else(|| format!("urn:blake3:{}", identity));

        AssetRecord {
            description: item.description.clone(),
            mime_type: item.body.mime().to_string(),
            encrypted: false,
            access: BTreeMap::new(),
            locations: Vec::new(),
            manifest: Manifest {
                uri: manifest_uri,
                title: item.title.clone(),
                description: item.description.clone(),
                credited_source: item
                    .credited_source
                    .clone()
                    .unwrap_or_else(|| self.org.name.clone()),
                signing_org: self.org.clone(),
                published: item.published.to_rfc3339_opts(SecondsFormat::Secs, true),
                history: Vec::new(),
            },
            content_binding: ContentBinding {
                algo: BINDING_ALGO.to_string(),
                hash: identity.to_hex(),
            },
            signature: RecordSignature::default(),
        }
    }

    /// Candidate record for change classification.
    ///
    /// Starts from the item's metadata and copies forward from the prior
    /// record what belongs to the stored bytes rather than the metadata:
    /// locations, access tokens, the encrypted flag and the lineage.
    pub fn candidate(
        &self,
        item: &ContentItem,
        identity: &AssetId,
        prior: Option<&AssetRecord>,
    ) -> AssetRecord {
        let mut record = self.draft(item, identity);
        if let Some(prior) = prior {
            record.locations = prior.locations.clone();
            record.access = prior.access.clone();
            record.encrypted = prior.encrypted;
            record.manifest.history = prior.manifest.history.clone();
        }
        record
    }

    /// Unsigned record to persist for `action`.
    ///
    /// When an existing record is superseded its location is appended to
    /// `history`, and non-text records are restamped with the current time.
    pub fn build(
        &self,
        item: &ContentItem,
        identity: &AssetId,
        action: Action,
        prior: Option<&PriorRecord>,
    ) -> AssetRecord {
        let mut record = self.candidate(item, identity, prior.map(|p| &p.record));
        if let (Some(prior), true) = (prior, action != Action::Noop) {
            if !item.kind().is_text() {
                record.manifest.published = (self.clock)().to_rfc3339_opts(SecondsFormat::Secs, true);
            }
            record.manifest.history.push(prior.location.clone());
        }
        record
    }

    /// Record the encryption service's access token and ciphertext location.
    pub fn attach_encryption(
        &self,
        record: &mut AssetRecord,
        protocol: &str,
        access_token: serde_json::Value,
        ciphertext: Location,
    ) {
        record.encrypted = true;
        record.access.insert(protocol.to_string(), access_token);
        record.locations.push(ciphertext);
    }

    /// Validate, digest and sign a record.
    pub fn finalize(
        &self,
        mut record: AssetRecord,
        signer: &dyn Signer,
    ) -> Result<AssetRecord, PublishError> {
        record.validate()?;

        let digest = record_digest(&record);
        let signature = signer.sign(&digest)?;
        record.signature = RecordSignature {
            curve: SIGNATURE_CURVE.to_string(),
            signature,
            message: hex::encode(digest),
            description: self.signature_description.clone(),
        };
        Ok(record)
    }
}
