//! Publish orchestration
//!
//! Items are processed strictly in input order, one at a time: the ledger
//! write for one item may create hierarchy nodes the next item depends on.
//! Each item runs identity → existence → classification → record → storage →
//! hierarchy → exactly one ledger write (none for `Noop`). A ledger write is
//! never retried or rolled back; a record persisted before a failed write is
//! left orphaned.

use crate::canonical::{self, LoadedContent};
use crate::content::{ContentItem, ContentKind};
use crate::diff::{classify, Action};
use crate::encryption::EncryptionHandle;
use crate::error::PublishError;
use crate::existence::{self, Existence};
use crate::fetch::ContentFetcher;
use crate::hierarchy::{plan_path, HierarchyResolver, PlacementPolicy, Segment};
use crate::ledger::{check_price, Ledger, PublishPayload, Receipt};
use crate::record::{AssetRecord, RecordBuilder, SigningOrg};
use crate::signing::Signer;
use crate::storage::{ObjectKind, RecordStorage};
use crate::types::{to_hex, AssetId, NodeId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// What a batch does after an item fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop at the first failed item
    Abort,
    /// Attempt every item and report failures alongside successes
    #[default]
    Continue,
}

/// Per-orchestrator settings
#[derive(Debug, Clone)]
pub struct PublishSettings {
    pub org: String,
    pub unit: String,
    /// Origin prefix used to derive article container ids
    pub origin: String,
    pub price_ceiling: Option<u64>,
    pub failure_policy: FailurePolicy,
    pub placement: PlacementPolicy,
    /// Resolve (and create) the hierarchy even when nothing changed
    pub resolve_hierarchy_on_noop: bool,
}

impl PublishSettings {
    pub fn new(org: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            org: org.into(),
            unit: unit.into(),
            origin: String::new(),
            price_ceiling: None,
            failure_policy: FailurePolicy::default(),
            placement: PlacementPolicy::default(),
            resolve_hierarchy_on_noop: false,
        }
    }
}

/// Successful outcome for one item
#[derive(Debug, Clone, PartialEq)]
pub struct Published {
    pub identity: AssetId,
    pub kind: ContentKind,
    pub action: Action,
    /// Location of the record now current for this asset
    pub record_location: Option<String>,
    pub parent: Option<NodeId>,
    pub receipt: Option<Receipt>,
}

/// Outcome for one item of a batch
#[derive(Debug)]
pub struct ItemResult {
    pub index: usize,
    pub outcome: Result<Published, PublishError>,
}

/// Result of a batch run
#[derive(Debug, Default)]
pub struct BatchReport {
    pub results: Vec<ItemResult>,
    /// True when the abort policy stopped the batch early
    pub aborted: bool,
}

impl BatchReport {
    /// `(identity, kind)` of every item that completed, in input order
    pub fn published(&self) -> Vec<(AssetId, ContentKind)> {
        self.results
            .iter()
            .filter_map(|r| r.outcome.as_ref().ok())
            .map(|p| (p.identity, p.kind))
            .collect()
    }

    pub fn failures(&self) -> impl Iterator<Item = (usize, &PublishError)> {
        self.results
            .iter()
            .filter_map(|r| r.outcome.as_ref().err().map(|e| (r.index, e)))
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }
}

/// The single ledger write a changed item needs
enum LedgerWrite {
    Publish,
    SetUri,
}

/// Publish orchestrator
pub struct Publisher {
    settings: PublishSettings,
    ledger: Arc<dyn Ledger>,
    storage: Arc<dyn RecordStorage>,
    fetcher: Arc<dyn ContentFetcher>,
    signer: Arc<dyn Signer>,
    encryption: Option<EncryptionHandle>,
    builder: RecordBuilder,
    hierarchy: HierarchyResolver,
}

impl Publisher {
    pub fn new(
        settings: PublishSettings,
        ledger: Arc<dyn Ledger>,
        storage: Arc<dyn RecordStorage>,
        fetcher: Arc<dyn ContentFetcher>,
        signer: Arc<dyn Signer>,
    ) -> Self {
        let builder = RecordBuilder::new(SigningOrg {
            name: settings.org.clone(),
            unit: settings.unit.clone(),
        });
        let hierarchy = HierarchyResolver::new(ledger.clone(), settings.price_ceiling);
        Self {
            settings,
            ledger,
            storage,
            fetcher,
            signer,
            encryption: None,
            builder,
            hierarchy,
        }
    }

    pub fn with_encryption(mut self, handle: EncryptionHandle) -> Self {
        self.encryption = Some(handle);
        self
    }

    pub fn with_builder(mut self, builder: RecordBuilder) -> Self {
        self.builder = builder;
        self
    }

    pub fn settings(&self) -> &PublishSettings {
        &self.settings
    }

    /// Publish `items` in order, one at a time.
    pub async fn publish_batch(&self, items: &[ContentItem]) -> BatchReport {
        info!(
            items = items.len(),
            policy = ?self.settings.failure_policy,
            "Publishing batch"
        );
        let mut report = BatchReport::default();

        for (index, item) in items.iter().enumerate() {
            let outcome = self.publish_item(item).await;
            let failed = outcome.is_err();
            if let Err(e) = &outcome {
                warn!(index, kind = %item.kind(), error = %e, "Item failed");
            }
            report.results.push(ItemResult { index, outcome });

            if failed && self.settings.failure_policy == FailurePolicy::Abort {
                error!(index, "Aborting batch after failed item");
                report.aborted = true;
                break;
            }
        }

        if let Some(encryption) = &self.encryption {
            if let Err(e) = encryption.disconnect().await {
                warn!(error = %e, "Failed to disconnect encryption service");
            }
        }

        info!(
            attempted = report.results.len(),
            failed = report.failure_count(),
            aborted = report.aborted,
            "Batch finished"
        );
        report
    }

    /// Publish a single item through the whole pipeline.
    pub async fn publish_item(&self, item: &ContentItem) -> Result<Published, PublishError> {
        item.validate()?;
        let path = plan_path(
            item,
            &self.settings.org,
            &self.settings.origin,
            self.settings.placement,
        )?;

        let content = canonical::load(item, self.fetcher.as_ref()).await?;
        let identity = content.identity;
        debug!(asset_id = %identity, kind = %item.kind(), "Computed identity");

        let existence = existence::resolve(&identity, self.ledger.as_ref(), self.storage.as_ref()).await?;
        let prior_record = existence.prior.as_ref().map(|p| &p.record);

        let candidate = self.builder.candidate(item, &identity, prior_record);
        let action = classify(prior_record, &candidate, item.kind());
        check_transition(action, item.kind(), &existence)?;
        debug!(asset_id = %identity, %action, "Classified");

        let write = match action {
            Action::Publish => LedgerWrite::Publish,
            Action::SetUri => LedgerWrite::SetUri,
            Action::Noop => {
                let parent = if self.settings.resolve_hierarchy_on_noop {
                    self.resolve_parent(&path).await?
                } else {
                    None
                };
                info!(asset_id = %identity, "Unchanged, no ledger write");
                return Ok(Published {
                    identity,
                    kind: item.kind(),
                    action,
                    record_location: existence.prior_location().map(str::to_string),
                    parent,
                    receipt: None,
                });
            }
        };

        let mut record = self
            .builder
            .build(item, &identity, action, existence.prior.as_ref());
        if existence.is_new() && item.storage.encrypt {
            self.encrypt_into(&mut record, &content).await?;
        }

        let record = self.builder.finalize(record, self.signer.as_ref())?;
        let location = self
            .storage
            .put_record(&record_name(&identity, &record), &record)
            .await?;
        debug!(asset_id = %identity, location = %location.uri, "Persisted record");

        let (parent, receipt) = match write {
            LedgerWrite::Publish => {
                let parent = self
                    .resolve_parent(&path)
                    .await?
                    .ok_or_else(|| PublishError::Consistency("empty hierarchy path".to_string()))?;
                check_price(self.ledger.as_ref(), self.settings.price_ceiling).await?;
                let receipt = self
                    .ledger
                    .publish(
                        parent,
                        PublishPayload {
                            id: identity.into(),
                            uri: location.uri.clone(),
                            reference_of: existence.node.as_ref().map(|n| n.token),
                        },
                    )
                    .await?;
                (Some(parent), receipt)
            }
            LedgerWrite::SetUri => {
                let node = existence.node.as_ref().ok_or_else(|| {
                    PublishError::Consistency(format!("SET_URI for unknown asset {}", identity))
                })?;
                check_price(self.ledger.as_ref(), self.settings.price_ceiling).await?;
                let receipt = self.ledger.set_uri(&identity.into(), &location.uri).await?;
                let parent = self.ledger.parent_of(node.token).await?.map(|n| n.id);
                (parent, receipt)
            }
        };

        info!(
            asset_id = %identity,
            %action,
            token = receipt.token,
            tx = %receipt.tx_hash,
            "Ledger write confirmed"
        );
        Ok(Published {
            identity,
            kind: item.kind(),
            action,
            record_location: Some(location.uri),
            parent,
            receipt: Some(receipt),
        })
    }

    async fn resolve_parent(&self, path: &[Segment]) -> Result<Option<NodeId>, PublishError> {
        let ids = self.hierarchy.ensure_path(path).await?;
        Ok(ids.last().copied())
    }

    async fn encrypt_into(
        &self,
        record: &mut AssetRecord,
        content: &LoadedContent,
    ) -> Result<(), PublishError> {
        let handle = self.encryption.as_ref().ok_or_else(|| {
            PublishError::Config("item requires encryption but no service is configured".to_string())
        })?;
        let encrypted = handle.encrypt(&content.bytes, &content.identity).await?;
        let location = self
            .storage
            .put(
                &ciphertext_name(&content.identity, &encrypted.ciphertext),
                &encrypted.ciphertext,
                ObjectKind::Asset,
            )
            .await?;
        self.builder
            .attach_encryption(record, handle.protocol(), encrypted.access_token, location);
        Ok(())
    }
}

/// Storage name of one ciphertext. Each encryption yields fresh bytes, so a
/// retried item never collides with the orphan of a failed attempt.
fn ciphertext_name(identity: &AssetId, ciphertext: &[u8]) -> String {
    format!("{}.{}.enc", identity, to_hex(&canonical::compute_hash(ciphertext)))
}

/// Storage name of a record version; unique per signed content.
fn record_name(identity: &AssetId, record: &AssetRecord) -> String {
    format!("{}/{}", identity, record.signature.message)
}

/// Refuse transitions the ledger would reject.
///
/// `Publish` on an existing node is only a re-anchor of a text asset;
/// `SetUri` needs an existing node.
fn check_transition(
    action: Action,
    kind: ContentKind,
    existence: &Existence,
) -> Result<(), PublishError> {
    match action {
        Action::Publish if !existence.is_new() && !kind.is_text() => Err(PublishError::Consistency(
            format!("PUBLISH for existing {} asset", kind),
        )),
        Action::SetUri if existence.is_new() => Err(PublishError::Consistency(
            "SET_URI for an asset with no node".to_string(),
        )),
        Action::Noop if existence.prior.is_none() => Err(PublishError::Consistency(
            "NOOP without a prior record".to_string(),
        )),
        _ => Ok(()),
    }
}
