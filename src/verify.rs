//! Independent verification of stored records
//!
//! Re-derives the record digest and checks it against the signed message,
//! checks the content binding, recovers the signer and resolves the signer's
//! root identity. Identity resolution runs even when a check fails; callers
//! must read the booleans.

use crate::canonical::record_digest;
use crate::error::{CollaboratorError, PublishError};
use crate::identity::IdentityRegistry;
use crate::ledger::Ledger;
use crate::record::AssetRecord;
use crate::signing::recover_signer;
use crate::storage::RecordStorage;
use crate::types::{AssetId, NodeId};
use serde::Serialize;
use tracing::debug;

/// Outcome of verifying one record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationReport {
    pub signature_verified: bool,
    pub content_binding_verified: bool,
    /// Address recovered from the signature, if it could be recovered
    pub signer: Option<String>,
    pub root_identity: Option<String>,
}

impl VerificationReport {
    pub fn is_valid(&self) -> bool {
        self.signature_verified && self.content_binding_verified && self.signer.is_some()
    }
}

/// Verify `record` as the record of `identity`.
pub async fn verify(
    identity: &AssetId,
    record: &AssetRecord,
    registry: &dyn IdentityRegistry,
) -> Result<VerificationReport, CollaboratorError> {
    let digest = record_digest(record);
    let signature_verified = hex::encode(digest) == record.signature.message.to_lowercase();
    let content_binding_verified = identity.to_hex() == record.content_binding.hash.to_lowercase();

    let signer = match hex::decode(&record.signature.message) {
        Ok(message) => match recover_signer(&message, &record.signature.signature) {
            Ok(address) => Some(address),
            Err(e) => {
                debug!(asset_id = %identity, error = %e, "Signer recovery failed");
                None
            }
        },
        Err(_) => None,
    };

    let root_identity = match &signer {
        Some(address) => registry.who_is(address).await?,
        None => None,
    };

    Ok(VerificationReport {
        signature_verified,
        content_binding_verified,
        signer,
        root_identity,
    })
}

/// Look up the current record of `identity` on the ledger and verify it.
pub async fn verify_published(
    identity: &AssetId,
    ledger: &dyn Ledger,
    storage: &dyn RecordStorage,
    registry: &dyn IdentityRegistry,
) -> Result<(AssetRecord, VerificationReport), PublishError> {
    let node = ledger
        .get_node_by_id(&NodeId::from(*identity))
        .await?
        .ok_or_else(|| PublishError::Consistency(format!("no node for asset {}", identity)))?;
    let record = storage.get_record(&node.uri).await?;
    let report = verify(identity, &record, registry).await?;
    Ok((record, report))
}
