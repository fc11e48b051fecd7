//! Deterministic placement of assets in the content graph
//!
//! Every container node id is derived from a normalized key, so resolving the
//! same logical path for the same organization always lands on the same
//! nodes. Creating a segment that already exists is a no-op.
//!
//! Segment id = hash(normalize(parent_key + "-" + label)), where the org
//! root's key is the org name and every other segment's key is its id hex.

use crate::canonical::compute_hash;
use crate::content::{ContentItem, Ownership};
use crate::error::{CollaboratorErrorKind, ContentError, PublishError};
use crate::ledger::{check_price, Ledger, NodeType};
use crate::types::NodeId;
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};
use unicode_normalization::UnicodeNormalization;

/// Label of the container for owned material
pub const ORIGINAL_MATERIAL: &str = "originalMaterial";

/// Lower-case, NFC-normalize and strip all whitespace.
pub fn normalize(label: &str) -> String {
    label
        .nfc()
        .flat_map(char::to_lowercase)
        .filter(|c| !c.is_whitespace())
        .collect()
}

/// Id derived from a key: hash(normalize(key)).
pub fn derive_id(key: &str) -> NodeId {
    NodeId(compute_hash(normalize(key).as_bytes()))
}

/// Container id for content licensed from `licensed_from`.
pub fn license_parent_id(org: &str, licensed_from: &str) -> NodeId {
    derive_id(&format!("{}-license-{}", org, licensed_from))
}

/// Container id for an article published at `origin`.
pub fn article_container_id(origin: &str, article_id: &str) -> NodeId {
    derive_id(&format!("{}{}", origin, article_id))
}

/// One container node on a path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub id: NodeId,
    /// Key children derive their ids from
    pub key: String,
}

impl Segment {
    /// Root organizational node
    pub fn root(org: &str) -> Self {
        Self {
            id: derive_id(org),
            key: org.to_string(),
        }
    }

    /// Segment with an id that is not derived from its parent
    pub fn fixed(id: NodeId) -> Self {
        Self {
            key: id.to_hex(),
            id,
        }
    }

    pub fn child(&self, label: &str) -> Self {
        Self::fixed(derive_id(&format!("{}-{}", self.key, label)))
    }
}

/// How assets are placed under their organization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlacementPolicy {
    /// owned text: org → originalMaterial → article;
    /// owned non-text: org → originalMaterial;
    /// licensed: org → license
    #[default]
    Article,
    /// org → license-type → content-kind → year → month → date
    Dated,
}

/// Compute the container path (root first) an item must live under.
pub fn plan_path(
    item: &ContentItem,
    org: &str,
    origin: &str,
    policy: PlacementPolicy,
) -> Result<Vec<Segment>, ContentError> {
    let root = Segment::root(org);
    let mut path = vec![root.clone()];

    match policy {
        PlacementPolicy::Article => match &item.ownership {
            Ownership::Licensed { from } => {
                path.push(Segment::fixed(license_parent_id(org, from)));
            }
            Ownership::Owned => {
                let original = root.child(ORIGINAL_MATERIAL);
                path.push(original);
                if item.kind().is_text() {
                    let article = item
                        .article
                        .as_ref()
                        .ok_or(ContentError::MissingField("article"))?;
                    path.push(Segment::fixed(article_container_id(origin, &article.id)));
                }
            }
        },
        PlacementPolicy::Dated => {
            let license_type = match &item.ownership {
                Ownership::Owned => "owned",
                Ownership::Licensed { .. } => "licensed",
            };
            let date = item.published.date_naive();
            let labels = [
                license_type.to_string(),
                item.kind().as_str().to_string(),
                format!("{:04}", date.year()),
                format!("{:02}", date.month()),
                date.format("%Y-%m-%d").to_string(),
            ];
            for label in labels {
                let next = path[path.len() - 1].child(&label);
                path.push(next);
            }
        }
    }

    Ok(path)
}

/// Get-or-create resolver for container nodes
pub struct HierarchyResolver {
    ledger: Arc<dyn Ledger>,
    price_ceiling: Option<u64>,
}

impl HierarchyResolver {
    pub fn new(ledger: Arc<dyn Ledger>, price_ceiling: Option<u64>) -> Self {
        Self {
            ledger,
            price_ceiling,
        }
    }

    /// Ensure `segment` exists under `parent`, creating it if absent.
    ///
    /// Safe to repeat: an existing node is returned as-is, and a creation
    /// that loses a race to another writer is treated as success.
    pub async fn ensure_segment(
        &self,
        parent: Option<&Segment>,
        segment: &Segment,
    ) -> Result<NodeId, PublishError> {
        if self.ledger.get_node_by_id(&segment.id).await?.is_some() {
            debug!(segment = %segment.id, "Segment exists");
            return Ok(segment.id);
        }

        check_price(self.ledger.as_ref(), self.price_ceiling).await?;
        match self
            .ledger
            .create_node(segment.id, parent.map(|p| p.id), NodeType::Org, None)
            .await
        {
            Ok(receipt) => {
                info!(segment = %segment.id, token = receipt.token, "Created segment");
                Ok(segment.id)
            }
            Err(e) if e.kind == CollaboratorErrorKind::Revert => {
                if self.ledger.get_node_by_id(&segment.id).await?.is_some() {
                    debug!(segment = %segment.id, reason = %e.message, "Segment created concurrently");
                    Ok(segment.id)
                } else {
                    Err(e.into())
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Ensure the child `label` of `parent` exists and return it.
    pub async fn ensure_child(&self, parent: &Segment, label: &str) -> Result<Segment, PublishError> {
        let child = parent.child(label);
        self.ensure_segment(Some(parent), &child).await?;
        Ok(child)
    }

    /// Ensure every segment of a planned path exists, root first.
    pub async fn ensure_path(&self, path: &[Segment]) -> Result<Vec<NodeId>, PublishError> {
        let mut ids = Vec::with_capacity(path.len());
        let mut parent: Option<&Segment> = None;
        for segment in path {
            ids.push(self.ensure_segment(parent, segment).await?);
            parent = Some(segment);
        }
        Ok(ids)
    }

    /// Resolve a label path below `root`, creating missing nodes.
    pub async fn resolve_path(
        &self,
        root: &Segment,
        labels: &[&str],
    ) -> Result<Vec<NodeId>, PublishError> {
        let mut path = vec![root.clone()];
        for label in labels {
            let next = path[path.len() - 1].child(label);
            path.push(next);
        }
        self.ensure_path(&path).await
    }
}
