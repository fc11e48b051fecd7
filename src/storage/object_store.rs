//! Key-value object store backed by sled

use crate::error::StorageError;
use crate::record::Location;
use crate::storage::{ObjectKind, RecordStorage};
use async_trait::async_trait;
use sled;
use std::path::Path;

pub const KV_PROTOCOL: &str = "kv";

/// Sled-based implementation of RecordStorage
///
/// Keys are `{kind}/{name}`; locations are `kv://{kind}/{name}`. Writing an
/// existing key with different bytes is refused.
pub struct ObjectStore {
    db: sled::Db,
}

impl ObjectStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let db = sled::open(path)
            .map_err(|e| StorageError::backend("Failed to open sled database", e))?;
        Ok(Self { db })
    }

    fn key_from_uri(uri: &str) -> Result<&str, StorageError> {
        uri.strip_prefix("kv://")
            .filter(|k| !k.is_empty())
            .ok_or_else(|| StorageError::InvalidLocation(uri.to_string()))
    }
}

#[async_trait]
impl RecordStorage for ObjectStore {
    async fn put(&self, name: &str, body: &[u8], kind: ObjectKind) -> Result<Location, StorageError> {
        if name.is_empty() {
            return Err(StorageError::InvalidLocation("empty object name".to_string()));
        }
        let key = format!("{}/{}", kind.as_str(), name);

        let previous = self
            .db
            .compare_and_swap(key.as_bytes(), None as Option<&[u8]>, Some(body))
            .map_err(|e| StorageError::backend("Failed to put object", e))?;
        if let Err(existing) = previous {
            if existing.current.as_deref() != Some(body) {
                return Err(StorageError::backend(
                    "Failed to put object",
                    format!("{} already holds different bytes", key),
                ));
            }
        }
        self.db
            .flush()
            .map_err(|e| StorageError::backend("Failed to flush object store", e))?;

        Ok(Location {
            protocol: KV_PROTOCOL.to_string(),
            uri: format!("kv://{}", key),
        })
    }

    async fn get(&self, uri: &str, kind: ObjectKind) -> Result<Vec<u8>, StorageError> {
        let key = Self::key_from_uri(uri)?;
        if !key.starts_with(&format!("{}/", kind.as_str())) {
            return Err(StorageError::InvalidLocation(uri.to_string()));
        }
        match self
            .db
            .get(key.as_bytes())
            .map_err(|e| StorageError::backend("Failed to get object", e))?
        {
            Some(value) => Ok(value.to_vec()),
            None => Err(StorageError::NotFound(uri.to_string())),
        }
    }
}
