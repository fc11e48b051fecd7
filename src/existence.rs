//! Existence lookup for assets
//!
//! A missing node is the normal state before first publication and resolves
//! to "new". A node whose record cannot be read back is a consistency error.

use crate::error::{PublishError, StorageError};
use crate::ledger::{GraphNode, Ledger};
use crate::record::builder::PriorRecord;
use crate::storage::RecordStorage;
use crate::types::{AssetId, NodeId};
use tracing::debug;

/// What the graph knows about an asset
#[derive(Debug, Clone)]
pub struct Existence {
    pub node: Option<GraphNode>,
    pub prior: Option<PriorRecord>,
}

impl Existence {
    pub fn is_new(&self) -> bool {
        self.node.is_none()
    }

    pub fn prior_location(&self) -> Option<&str> {
        self.prior.as_ref().map(|p| p.location.as_str())
    }
}

/// Resolve whether `identity` already exists and load its last record.
pub async fn resolve(
    identity: &AssetId,
    ledger: &dyn Ledger,
    storage: &dyn RecordStorage,
) -> Result<Existence, PublishError> {
    let Some(node) = ledger.get_node_by_id(&NodeId::from(*identity)).await? else {
        debug!(asset_id = %identity, "Asset is new");
        return Ok(Existence {
            node: None,
            prior: None,
        });
    };

    if node.uri.is_empty() {
        return Err(PublishError::Consistency(format!(
            "node {} for asset {} has no record location",
            node.token, identity
        )));
    }

    let record = match storage.get_record(&node.uri).await {
        Ok(record) => record,
        Err(StorageError::NotFound(uri)) => {
            return Err(PublishError::Consistency(format!(
                "ledger points asset {} at {} but no record is stored there",
                identity, uri
            )))
        }
        Err(e) => return Err(e.into()),
    };

    debug!(asset_id = %identity, location = %node.uri, "Found prior record");
    Ok(Existence {
        prior: Some(PriorRecord {
            location: node.uri.clone(),
            record,
        }),
        node: Some(node),
    })
}
