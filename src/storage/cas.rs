//! Content-addressed object storage
//!
//! Objects are stored on the filesystem at paths derived from the BLAKE3 hash
//! of their bytes, so storing the same bytes twice is a no-op and every read
//! can be checked against its address.

use crate::canonical::compute_hash;
use crate::error::StorageError;
use crate::record::Location;
use crate::storage::{ObjectKind, RecordStorage};
use crate::types::{from_hex, to_hex, Hash};
use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const CAS_PROTOCOL: &str = "cas";

/// Content-addressed object store
///
/// Layout: `{root}/objects/{hex[0..2]}/{hex[2..4]}/{hex}`
pub struct ContentAddressedStore {
    root: PathBuf,
}

impl ContentAddressedStore {
    /// Create a new store at the given root path
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self, StorageError> {
        let root = root.as_ref().to_path_buf();
        let objects_dir = root.join("objects");
        fs::create_dir_all(&objects_dir).map_err(|e| {
            StorageError::backend(
                &format!("Failed to create objects directory at {:?}", objects_dir),
                e,
            )
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, hash: &Hash) -> PathBuf {
        let hex = to_hex(hash);
        self.root
            .join("objects")
            .join(&hex[0..2])
            .join(&hex[2..4])
            .join(hex)
    }

    fn parse_uri(uri: &str) -> Result<Hash, StorageError> {
        let hex = uri
            .strip_prefix("cas://")
            .ok_or_else(|| StorageError::InvalidLocation(uri.to_string()))?;
        from_hex(hex).map_err(|_| StorageError::InvalidLocation(uri.to_string()))
    }

    fn write_object(&self, hash: &Hash, body: &[u8]) -> Result<(), StorageError> {
        let path = self.object_path(hash);
        if path.exists() {
            return Ok(());
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                StorageError::backend(&format!("Failed to create parent directory {:?}", parent), e)
            })?;
        }

        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, body)
            .map_err(|e| StorageError::backend(&format!("Failed to write {:?}", temp_path), e))?;
        fs::rename(&temp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            StorageError::backend(&format!("Failed to rename temp file to {:?}", path), e)
        })?;
        Ok(())
    }
}

#[async_trait]
impl RecordStorage for ContentAddressedStore {
    async fn put(&self, name: &str, body: &[u8], kind: ObjectKind) -> Result<Location, StorageError> {
        let hash = compute_hash(body);
        self.write_object(&hash, body)?;
        let uri = format!("cas://{}", to_hex(&hash));
        debug!(name, kind = kind.as_str(), %uri, "Stored object");
        Ok(Location {
            protocol: CAS_PROTOCOL.to_string(),
            uri,
        })
    }

    async fn get(&self, uri: &str, _kind: ObjectKind) -> Result<Vec<u8>, StorageError> {
        let hash = Self::parse_uri(uri)?;
        let path = self.object_path(&hash);
        if !path.exists() {
            return Err(StorageError::NotFound(uri.to_string()));
        }
        let body = fs::read(&path)
            .map_err(|e| StorageError::backend(&format!("Failed to read {:?}", path), e))?;

        let actual = compute_hash(&body);
        if actual != hash {
            return Err(StorageError::HashMismatch {
                expected: hash,
                actual,
            });
        }
        Ok(body)
    }
}
