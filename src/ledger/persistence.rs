//! Persistence layer for the local content graph

use crate::error::CollaboratorError;
use crate::ledger::{GraphNode, Ledger, NodeType, PublishPayload, Receipt};
use crate::types::NodeId;
use async_trait::async_trait;
use bincode;
use parking_lot::Mutex;
use sled;
use std::path::Path;

/// Sled-backed ledger
///
/// Layout:
/// - `nodes`: token (u64 BE) -> bincode(GraphNode)
/// - `ids`: NodeId -> token of the current node with that id
/// - `children`: parent token ++ child token -> ()
pub struct SledLedger {
    db: sled::Db,
    nodes: sled::Tree,
    ids: sled::Tree,
    children: sled::Tree,
    price: u64,
    write_lock: Mutex<()>,
}

fn backend_error(context: &str, err: impl std::fmt::Display) -> CollaboratorError {
    CollaboratorError::from_message(&format!("{}: {}", context, err))
}

impl SledLedger {
    /// Open (or create) a ledger database at `path`
    pub fn open<P: AsRef<Path>>(path: P, price: u64) -> Result<Self, CollaboratorError> {
        let db = sled::open(path).map_err(|e| backend_error("Failed to open sled database", e))?;
        let nodes = db
            .open_tree("nodes")
            .map_err(|e| backend_error("Failed to open nodes tree", e))?;
        let ids = db
            .open_tree("ids")
            .map_err(|e| backend_error("Failed to open ids tree", e))?;
        let children = db
            .open_tree("children")
            .map_err(|e| backend_error("Failed to open children tree", e))?;
        Ok(Self {
            db,
            nodes,
            ids,
            children,
            price,
            write_lock: Mutex::new(()),
        })
    }

    /// Get the underlying sled database (for advanced operations)
    pub fn db(&self) -> &sled::Db {
        &self.db
    }

    fn node(&self, token: u64) -> Result<Option<GraphNode>, CollaboratorError> {
        match self
            .nodes
            .get(token.to_be_bytes())
            .map_err(|e| backend_error("Failed to get node", e))?
        {
            Some(value) => {
                let node: GraphNode = bincode::deserialize(&value)
                    .map_err(|e| backend_error("Failed to deserialize node", e))?;
                Ok(Some(node))
            }
            None => Ok(None),
        }
    }

    fn token_of(&self, id: &NodeId) -> Result<Option<u64>, CollaboratorError> {
        Ok(self
            .ids
            .get(id.as_bytes())
            .map_err(|e| backend_error("Failed to get id mapping", e))?
            .and_then(|v| <[u8; 8]>::try_from(&v[..]).ok())
            .map(u64::from_be_bytes))
    }

    fn insert(
        &self,
        id: NodeId,
        parent: Option<u64>,
        node_type: NodeType,
        reference_of: Option<u64>,
        uri: &str,
    ) -> Result<u64, CollaboratorError> {
        let token = self
            .db
            .generate_id()
            .map_err(|e| backend_error("Failed to allocate token", e))?
            + 1;
        let node = GraphNode {
            token,
            node_type,
            id,
            parent,
            reference_of,
            uri: uri.to_string(),
            access_auth: false,
            reference_auth: false,
        };
        self.write_node(&node)?;
        self.ids
            .insert(id.as_bytes(), token.to_be_bytes().to_vec())
            .map_err(|e| backend_error("Failed to store id mapping", e))?;
        if let Some(parent) = parent {
            let mut key = parent.to_be_bytes().to_vec();
            key.extend_from_slice(&token.to_be_bytes());
            self.children
                .insert(key, Vec::<u8>::new())
                .map_err(|e| backend_error("Failed to store child link", e))?;
        }
        self.db
            .flush()
            .map_err(|e| backend_error("Failed to flush ledger", e))?;
        Ok(token)
    }

    fn write_node(&self, node: &GraphNode) -> Result<(), CollaboratorError> {
        let value =
            bincode::serialize(node).map_err(|e| backend_error("Failed to serialize node", e))?;
        self.nodes
            .insert(node.token.to_be_bytes(), value)
            .map_err(|e| backend_error("Failed to put node", e))?;
        Ok(())
    }
}

#[async_trait]
impl Ledger for SledLedger {
    async fn get_node_by_id(&self, id: &NodeId) -> Result<Option<GraphNode>, CollaboratorError> {
        match self.token_of(id)? {
            Some(token) => self.node(token),
            None => Ok(None),
        }
    }

    async fn create_node(
        &self,
        id: NodeId,
        parent: Option<NodeId>,
        node_type: NodeType,
        reference_of: Option<u64>,
    ) -> Result<Receipt, CollaboratorError> {
        let _guard = self.write_lock.lock();
        if self.token_of(&id)?.is_some() {
            return Err(CollaboratorError::revert("node already exists"));
        }
        let parent_token = match parent {
            Some(p) => Some(
                self.token_of(&p)?
                    .ok_or_else(|| CollaboratorError::revert("parent not found"))?,
            ),
            None => None,
        };
        let token = self.insert(id, parent_token, node_type, reference_of, "")?;
        Ok(Receipt::new("createNode", &id, "", token))
    }

    async fn publish(
        &self,
        parent: NodeId,
        payload: PublishPayload,
    ) -> Result<Receipt, CollaboratorError> {
        let _guard = self.write_lock.lock();
        let parent_token = self
            .token_of(&parent)?
            .ok_or_else(|| CollaboratorError::revert("parent not found"))?;
        if let Some(existing) = self.token_of(&payload.id)? {
            if payload.reference_of != Some(existing) {
                return Err(CollaboratorError::revert("node already exists"));
            }
        }
        let token = self.insert(
            payload.id,
            Some(parent_token),
            NodeType::for_payload(&payload),
            payload.reference_of,
            &payload.uri,
        )?;
        Ok(Receipt::new("publish", &payload.id, &payload.uri, token))
    }

    async fn set_uri(&self, id: &NodeId, uri: &str) -> Result<Receipt, CollaboratorError> {
        let _guard = self.write_lock.lock();
        let token = self
            .token_of(id)?
            .ok_or_else(|| CollaboratorError::revert("node not found"))?;
        let mut node = self
            .node(token)?
            .ok_or_else(|| CollaboratorError::revert("node not found"))?;
        node.uri = uri.to_string();
        self.write_node(&node)?;
        self.db
            .flush()
            .map_err(|e| backend_error("Failed to flush ledger", e))?;
        Ok(Receipt::new("setUri", id, uri, token))
    }

    async fn parent_of(&self, token: u64) -> Result<Option<GraphNode>, CollaboratorError> {
        let node = self
            .node(token)?
            .ok_or_else(|| CollaboratorError::revert("token not found"))?;
        match node.parent {
            Some(parent) => self.node(parent),
            None => Ok(None),
        }
    }

    async fn children_of(&self, token: u64) -> Result<Vec<GraphNode>, CollaboratorError> {
        if self.node(token)?.is_none() {
            return Err(CollaboratorError::revert("token not found"));
        }
        let mut children = Vec::new();
        for item in self.children.scan_prefix(token.to_be_bytes()) {
            let (key, _) = item.map_err(|e| backend_error("Failed to iterate children", e))?;
            let child = <[u8; 8]>::try_from(&key[8..])
                .map(u64::from_be_bytes)
                .map_err(|e| backend_error("Malformed child key", e))?;
            if let Some(node) = self.node(child)? {
                children.push(node);
            }
        }
        Ok(children)
    }

    async fn current_price(&self) -> Result<u64, CollaboratorError> {
        Ok(self.price)
    }
}
