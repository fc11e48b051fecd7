//! Content graph ledger
//!
//! The ledger owns graph nodes; this engine only reads them and issues
//! creation and URI-update writes. Every write returns once it has a receipt.

pub mod memory;
pub mod persistence;

pub use memory::MemoryLedger;
pub use persistence::SledLedger;

use crate::error::{CollaboratorError, PublishError};
use crate::types::NodeId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Node type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeType {
    /// Organizational container (org root or hierarchy segment)
    Org,
    /// Re-anchored pointer to another node
    Reference,
    Asset,
}

impl NodeType {
    /// Type of the node a `publish` write creates
    pub fn for_payload(payload: &PublishPayload) -> Self {
        if payload.reference_of.is_some() {
            NodeType::Reference
        } else {
            NodeType::Asset
        }
    }
}

/// A node in the content graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    pub token: u64,
    pub node_type: NodeType,
    pub id: NodeId,
    pub parent: Option<u64>,
    /// Token of the node this one supersedes or points at
    pub reference_of: Option<u64>,
    pub uri: String,
    pub access_auth: bool,
    pub reference_auth: bool,
}

/// Payload of a `publish` write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishPayload {
    pub id: NodeId,
    pub uri: String,
    /// Token of the existing node with this id when re-anchoring it
    pub reference_of: Option<u64>,
}

/// Proof that a write reached finality
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub token: u64,
    pub tx_hash: String,
}

impl Receipt {
    pub(crate) fn new(action: &str, id: &NodeId, uri: &str, token: u64) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(action.as_bytes());
        hasher.update(b":");
        hasher.update(id.as_bytes());
        hasher.update(b":");
        hasher.update(uri.as_bytes());
        hasher.update(&token.to_be_bytes());
        Self {
            token,
            tx_hash: format!("0x{}", hasher.finalize().to_hex()),
        }
    }
}

/// Ledger client interface
#[async_trait]
pub trait Ledger: Send + Sync {
    async fn get_node_by_id(&self, id: &NodeId) -> Result<Option<GraphNode>, CollaboratorError>;

    async fn create_node(
        &self,
        id: NodeId,
        parent: Option<NodeId>,
        node_type: NodeType,
        reference_of: Option<u64>,
    ) -> Result<Receipt, CollaboratorError>;

    async fn publish(
        &self,
        parent: NodeId,
        payload: PublishPayload,
    ) -> Result<Receipt, CollaboratorError>;

    async fn set_uri(&self, id: &NodeId, uri: &str) -> Result<Receipt, CollaboratorError>;

    async fn parent_of(&self, token: u64) -> Result<Option<GraphNode>, CollaboratorError>;

    async fn children_of(&self, token: u64) -> Result<Vec<GraphNode>, CollaboratorError>;

    /// Current network cost of a write
    async fn current_price(&self) -> Result<u64, CollaboratorError>;
}

/// Refuse to write when the network cost exceeds `ceiling`.
///
/// Consulted immediately before every write; a `None` ceiling disables it.
pub async fn check_price(ledger: &dyn Ledger, ceiling: Option<u64>) -> Result<(), PublishError> {
    let Some(ceiling) = ceiling else {
        return Ok(());
    };
    let current = ledger.current_price().await?;
    if current > ceiling {
        warn!(current, ceiling, "Network price above ceiling, refusing write");
        return Err(PublishError::PriceCeiling { current, ceiling });
    }
    Ok(())
}
