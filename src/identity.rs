//! Signer identity registry
//!
//! Maps a signer address to the root identity it is registered under. Only
//! consulted when verifying records, never while publishing.

use crate::error::CollaboratorError;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

#[async_trait]
pub trait IdentityRegistry: Send + Sync {
    /// Root address registered for `address`, if any
    async fn who_is(&self, address: &str) -> Result<Option<String>, CollaboratorError>;
}

/// In-memory registry
#[derive(Default)]
pub struct MemoryIdentityRegistry {
    parents: RwLock<HashMap<String, String>>,
}

impl MemoryIdentityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, address: &str, parent: &str) {
        self.parents
            .write()
            .insert(address.to_lowercase(), parent.to_lowercase());
    }
}

#[async_trait]
impl IdentityRegistry for MemoryIdentityRegistry {
    /// Follows parent links up to the root; unregistered addresses have none.
    async fn who_is(&self, address: &str) -> Result<Option<String>, CollaboratorError> {
        let parents = self.parents.read();
        let mut current = address.to_lowercase();
        let mut found = false;
        // Bounded walk guards against registration cycles
        for _ in 0..=parents.len() {
            match parents.get(&current) {
                Some(parent) if *parent != current => {
                    current = parent.clone();
                    found = true;
                }
                _ => break,
            }
        }
        Ok(found.then_some(current))
    }
}
