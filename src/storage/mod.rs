//! Record and asset storage
//!
//! Two interchangeable backends sit behind `RecordStorage`: a file-system
//! content-addressed store and a sled key-value object store. Objects are
//! never overwritten by the engine; every record version gets its own name.

pub mod cas;
pub mod object_store;

pub use cas::ContentAddressedStore;
pub use object_store::ObjectStore;

use crate::error::StorageError;
use crate::record::{AssetRecord, Location};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// What an object holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    /// A serialized AssetRecord
    Record,
    /// Asset bytes (plain or ciphertext)
    Asset,
}

impl ObjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::Record => "record",
            ObjectKind::Asset => "asset",
        }
    }
}

/// Storage backend interface
#[async_trait]
pub trait RecordStorage: Send + Sync {
    /// Store `body` and return where it can be read back.
    async fn put(&self, name: &str, body: &[u8], kind: ObjectKind) -> Result<Location, StorageError>;

    /// Read the object at `uri`.
    async fn get(&self, uri: &str, kind: ObjectKind) -> Result<Vec<u8>, StorageError>;

    async fn put_record(&self, name: &str, record: &AssetRecord) -> Result<Location, StorageError> {
        let body = serde_json::to_vec(record)
            .map_err(|e| StorageError::Serialization(format!("Failed to serialize record: {}", e)))?;
        self.put(name, &body, ObjectKind::Record).await
    }

    async fn get_record(&self, uri: &str) -> Result<AssetRecord, StorageError> {
        let body = self.get(uri, ObjectKind::Record).await?;
        serde_json::from_slice(&body).map_err(|e| {
            StorageError::Serialization(format!("Failed to deserialize record at {}: {}", uri, e))
        })
    }
}
