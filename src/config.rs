//! Configuration System
//!
//! Layered configuration for the publish engine. Sources, lowest precedence
//! first: built-in defaults, the user config file, the workspace
//! `config/config.toml`, the workspace `config/{PROVGRAPH_ENV}.toml`, and
//! `PROVGRAPH__*` environment variables. The loaded value is handed to the
//! orchestrator at construction.

use crate::hierarchy::PlacementPolicy;
use crate::logging::LoggingConfig;
use crate::publish::{FailurePolicy, PublishSettings};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;
pub use sources::global_file::global_config_path;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvgraphConfig {
    #[serde(default)]
    pub publisher: PublisherConfig,

    #[serde(default)]
    pub ledger: LedgerConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub encryption: EncryptionConfig,

    #[serde(default)]
    pub batch: BatchConfig,

    /// Signer address → parent registrations used by `verify`
    #[serde(default)]
    pub identity: IdentityConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// The publishing organization
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PublisherConfig {
    #[serde(default)]
    pub org: String,

    #[serde(default)]
    pub unit: String,

    /// 32-byte Ed25519 seed as 64 hex characters
    #[serde(default)]
    pub signing_key_hex: Option<String>,

    /// Origin prefix for article container ids
    #[serde(default)]
    pub origin: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    #[serde(default = "default_ledger_path")]
    pub path: PathBuf,

    /// Highest acceptable price per write; unset means no ceiling
    #[serde(default)]
    pub price_ceiling: Option<u64>,

    /// Flat price the local ledger quotes for every write
    #[serde(default = "default_local_price")]
    pub local_price: u64,
}

fn default_ledger_path() -> PathBuf {
    PathBuf::from(".provgraph/ledger")
}

fn default_local_price() -> u64 {
    1
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            path: default_ledger_path(),
            price_ceiling: None,
            local_price: default_local_price(),
        }
    }
}

/// Which record storage to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    #[default]
    ContentAddressed,
    ObjectStore,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    #[serde(default = "default_storage_path")]
    pub path: PathBuf,
}

fn default_storage_path() -> PathBuf {
    PathBuf::from(".provgraph/storage")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            path: default_storage_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptionConfig {
    /// Upper bound on each encryption call
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    60
}

impl EncryptionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for EncryptionConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchConfig {
    #[serde(default)]
    pub failure_policy: FailurePolicy,

    #[serde(default)]
    pub placement: PlacementPolicy,

    /// Create missing hierarchy nodes for unchanged items too
    #[serde(default)]
    pub resolve_hierarchy_on_noop: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentityConfig {
    #[serde(default)]
    pub registrations: BTreeMap<String, String>,
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Publisher(String),
    Ledger(String),
    Storage(String),
    Encryption(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Publisher(msg) => write!(f, "Publisher: {}", msg),
            ValidationError::Ledger(msg) => write!(f, "Ledger: {}", msg),
            ValidationError::Storage(msg) => write!(f, "Storage: {}", msg),
            ValidationError::Encryption(msg) => write!(f, "Encryption: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl ProvgraphConfig {
    /// Validate the entire configuration, collecting every problem.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.publisher.org.trim().is_empty() {
            errors.push(ValidationError::Publisher(
                "org cannot be empty".to_string(),
            ));
        }
        if let Some(key) = &self.publisher.signing_key_hex {
            let key = key.strip_prefix("0x").unwrap_or(key);
            if key.len() != 64 || hex::decode(key).is_err() {
                errors.push(ValidationError::Publisher(
                    "signing_key_hex must be 64 hex characters".to_string(),
                ));
            }
        }

        if self.ledger.path.as_os_str().is_empty() {
            errors.push(ValidationError::Ledger("path cannot be empty".to_string()));
        }
        if self.ledger.price_ceiling == Some(0) {
            errors.push(ValidationError::Ledger(
                "price_ceiling of 0 rejects every write".to_string(),
            ));
        }

        if self.storage.path.as_os_str().is_empty() {
            errors.push(ValidationError::Storage("path cannot be empty".to_string()));
        }

        if self.encryption.timeout_secs == 0 {
            errors.push(ValidationError::Encryption(
                "timeout_secs must be positive".to_string(),
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Orchestrator settings derived from this configuration
    pub fn publish_settings(&self) -> PublishSettings {
        PublishSettings {
            org: self.publisher.org.clone(),
            unit: self.publisher.unit.clone(),
            origin: self.publisher.origin.clone(),
            price_ceiling: self.ledger.price_ceiling,
            failure_policy: self.batch.failure_policy,
            placement: self.batch.placement,
            resolve_hierarchy_on_noop: self.batch.resolve_hierarchy_on_noop,
        }
    }

    /// Ledger path, relative paths resolved against `workspace_root`
    pub fn ledger_path(&self, workspace_root: &Path) -> PathBuf {
        workspace_root.join(&self.ledger.path)
    }

    /// Storage path, relative paths resolved against `workspace_root`
    pub fn storage_path(&self, workspace_root: &Path) -> PathBuf {
        workspace_root.join(&self.storage.path)
    }
}
