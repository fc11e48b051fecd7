//! Encryption service client handle
//!
//! The service connection is owned by an `EncryptionHandle`: it connects on
//! first use, every call is bounded by a timeout, and the owner disconnects
//! it explicitly when the run that needed it is over.

use crate::error::{CollaboratorError, PublishError};
use crate::types::AssetId;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Default bound on a single encryption call
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Result of encrypting an asset
#[derive(Debug, Clone, PartialEq)]
pub struct EncryptedAsset {
    /// Opaque token recorded under the record's `access` map
    pub access_token: serde_json::Value,
    /// Bytes to persist in place of the plaintext
    pub ciphertext: Vec<u8>,
}

/// Remote encryption service
#[async_trait]
pub trait EncryptionService: Send + Sync {
    /// Key under which access tokens are recorded
    fn protocol(&self) -> &str;

    async fn connect(&self) -> Result<(), CollaboratorError>;

    async fn disconnect(&self) -> Result<(), CollaboratorError>;

    async fn encrypt(
        &self,
        bytes: &[u8],
        identity: &AssetId,
    ) -> Result<EncryptedAsset, CollaboratorError>;
}

/// Lazily connected, explicitly disconnected service handle
pub struct EncryptionHandle {
    service: Arc<dyn EncryptionService>,
    timeout: Duration,
    connected: Mutex<bool>,
}

impl EncryptionHandle {
    pub fn new(service: Arc<dyn EncryptionService>, timeout: Duration) -> Self {
        Self {
            service,
            timeout,
            connected: Mutex::new(false),
        }
    }

    pub fn protocol(&self) -> &str {
        self.service.protocol()
    }

    pub async fn is_connected(&self) -> bool {
        *self.connected.lock().await
    }

    /// Encrypt asset bytes, connecting first if needed.
    pub async fn encrypt(
        &self,
        bytes: &[u8],
        identity: &AssetId,
    ) -> Result<EncryptedAsset, PublishError> {
        {
            let mut connected = self.connected.lock().await;
            if !*connected {
                self.bounded("encryption connect", self.service.connect())
                    .await?;
                *connected = true;
                info!(protocol = self.protocol(), "Encryption service connected");
            }
        }

        debug!(asset_id = %identity, bytes = bytes.len(), "Encrypting asset");
        self.bounded("encryption", self.service.encrypt(bytes, identity))
            .await
    }

    /// Close the connection if one is open.
    pub async fn disconnect(&self) -> Result<(), PublishError> {
        let mut connected = self.connected.lock().await;
        if *connected {
            self.bounded("encryption disconnect", self.service.disconnect())
                .await?;
            *connected = false;
            info!(protocol = self.protocol(), "Encryption service disconnected");
        }
        Ok(())
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        call: impl std::future::Future<Output = Result<T, CollaboratorError>>,
    ) -> Result<T, PublishError> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result.map_err(PublishError::from),
            Err(_) => Err(PublishError::Timeout {
                operation,
                secs: self.timeout.as_secs(),
            }),
        }
    }
}
