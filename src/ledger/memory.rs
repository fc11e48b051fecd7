//! In-process ledger
//!
//! Holds the graph in memory behind a lock. Counts writes and can be told to
//! fail the next write with raw revert data, which is how the engine's
//! failure paths are exercised without a network.

use crate::error::CollaboratorError;
use crate::ledger::{GraphNode, Ledger, NodeType, PublishPayload, Receipt};
use crate::types::NodeId;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap, VecDeque};

#[derive(Default)]
struct GraphState {
    nodes: BTreeMap<u64, GraphNode>,
    ids: HashMap<NodeId, u64>,
    next_token: u64,
    price: u64,
    creates: usize,
    publishes: usize,
    set_uris: usize,
    pending_failures: VecDeque<Vec<u8>>,
}

impl GraphState {
    fn take_failure(&mut self) -> Result<(), CollaboratorError> {
        match self.pending_failures.pop_front() {
            Some(raw) => Err(CollaboratorError::decode(&raw)),
            None => Ok(()),
        }
    }

    fn node_by_id(&self, id: &NodeId) -> Option<&GraphNode> {
        self.ids.get(id).and_then(|t| self.nodes.get(t))
    }

    fn insert(
        &mut self,
        id: NodeId,
        parent: Option<u64>,
        node_type: NodeType,
        reference_of: Option<u64>,
        uri: String,
    ) -> u64 {
        self.next_token += 1;
        let token = self.next_token;
        self.nodes.insert(
            token,
            GraphNode {
                token,
                node_type,
                id,
                parent,
                reference_of,
                uri,
                access_auth: false,
                reference_auth: false,
            },
        );
        self.ids.insert(id, token);
        token
    }
}

/// In-memory ledger
#[derive(Default)]
pub struct MemoryLedger {
    state: RwLock<GraphState>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_price(&self, price: u64) {
        self.state.write().price = price;
    }

    /// Make the next write fail with the given raw revert data.
    pub fn fail_next_write(&self, raw: Vec<u8>) {
        self.state.write().pending_failures.push_back(raw);
    }

    pub fn create_count(&self) -> usize {
        self.state.read().creates
    }

    pub fn publish_count(&self) -> usize {
        self.state.read().publishes
    }

    pub fn set_uri_count(&self) -> usize {
        self.state.read().set_uris
    }

    /// Total writes of any kind
    pub fn write_count(&self) -> usize {
        let state = self.state.read();
        state.creates + state.publishes + state.set_uris
    }

    pub fn node_count(&self) -> usize {
        self.state.read().nodes.len()
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn get_node_by_id(&self, id: &NodeId) -> Result<Option<GraphNode>, CollaboratorError> {
        Ok(self.state.read().node_by_id(id).cloned())
    }

    async fn create_node(
        &self,
        id: NodeId,
        parent: Option<NodeId>,
        node_type: NodeType,
        reference_of: Option<u64>,
    ) -> Result<Receipt, CollaboratorError> {
        let mut state = self.state.write();
        state.take_failure()?;

        if state.ids.contains_key(&id) {
            return Err(CollaboratorError::revert("node already exists"));
        }
        let parent_token = match parent {
            Some(p) => Some(
                *state
                    .ids
                    .get(&p)
                    .ok_or_else(|| CollaboratorError::revert("parent not found"))?,
            ),
            None => None,
        };

        let token = state.insert(id, parent_token, node_type, reference_of, String::new());
        state.creates += 1;
        Ok(Receipt::new("createNode", &id, "", token))
    }

    async fn publish(
        &self,
        parent: NodeId,
        payload: PublishPayload,
    ) -> Result<Receipt, CollaboratorError> {
        let mut state = self.state.write();
        state.take_failure()?;

        let parent_token = *state
            .ids
            .get(&parent)
            .ok_or_else(|| CollaboratorError::revert("parent not found"))?;

        if let Some(existing) = state.node_by_id(&payload.id) {
            if payload.reference_of != Some(existing.token) {
                return Err(CollaboratorError::revert("node already exists"));
            }
        }

        let token = state.insert(
            payload.id,
            Some(parent_token),
            NodeType::for_payload(&payload),
            payload.reference_of,
            payload.uri.clone(),
        );
        state.publishes += 1;
        Ok(Receipt::new("publish", &payload.id, &payload.uri, token))
    }

    async fn set_uri(&self, id: &NodeId, uri: &str) -> Result<Receipt, CollaboratorError> {
        let mut state = self.state.write();
        state.take_failure()?;

        let token = *state
            .ids
            .get(id)
            .ok_or_else(|| CollaboratorError::revert("node not found"))?;
        if let Some(node) = state.nodes.get_mut(&token) {
            node.uri = uri.to_string();
        }
        state.set_uris += 1;
        Ok(Receipt::new("setUri", id, uri, token))
    }

    async fn parent_of(&self, token: u64) -> Result<Option<GraphNode>, CollaboratorError> {
        let state = self.state.read();
        let node = state
            .nodes
            .get(&token)
            .ok_or_else(|| CollaboratorError::revert("token not found"))?;
        Ok(node.parent.and_then(|p| state.nodes.get(&p)).cloned())
    }

    async fn children_of(&self, token: u64) -> Result<Vec<GraphNode>, CollaboratorError> {
        let state = self.state.read();
        if !state.nodes.contains_key(&token) {
            return Err(CollaboratorError::revert("token not found"));
        }
        Ok(state
            .nodes
            .values()
            .filter(|n| n.parent == Some(token))
            .cloned()
            .collect())
    }

    async fn current_price(&self) -> Result<u64, CollaboratorError> {
        Ok(self.state.read().price)
    }
}
