//! CLI route: builds collaborators from configuration and dispatches commands.

use crate::cli::output::{format_batch_report, format_verification};
use crate::cli::parse::{Commands, ConfigCommands};
use crate::config::{ConfigLoader, ProvgraphConfig, StorageBackend};
use crate::content::ContentItem;
use crate::fetch::HttpFetcher;
use crate::identity::MemoryIdentityRegistry;
use crate::ledger::SledLedger;
use crate::publish::Publisher;
use crate::signing::{Ed25519Signer, Signer};
use crate::storage::{ContentAddressedStore, ObjectStore, RecordStorage};
use crate::types::AssetId;
use crate::verify::verify_published;
use anyhow::{anyhow, bail, Context, Result};
use parking_lot::Mutex;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Rendered command result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub text: String,
    /// False when the command ran but reported failures
    pub success: bool,
}

impl CommandOutput {
    fn ok(text: String) -> Self {
        Self {
            text,
            success: true,
        }
    }
}

/// Loaded configuration plus the workspace it applies to
///
/// Sled databases hold an exclusive file lock, so the ledger and storage are
/// opened at most once per context and shared between commands.
pub struct RunContext {
    workspace_root: PathBuf,
    config: ProvgraphConfig,
    ledger: Mutex<Option<Arc<SledLedger>>>,
    storage: Mutex<Option<Arc<dyn RecordStorage>>>,
}

impl RunContext {
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self> {
        let config = match &config_path {
            Some(path) => ConfigLoader::load_from_file(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => ConfigLoader::load(&workspace_root).context("Failed to load configuration")?,
        };
        Ok(Self::from_config(workspace_root, config))
    }

    pub fn from_config(workspace_root: PathBuf, config: ProvgraphConfig) -> Self {
        Self {
            workspace_root,
            config,
            ledger: Mutex::new(None),
            storage: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &ProvgraphConfig {
        &self.config
    }

    pub async fn execute(&self, command: &Commands) -> Result<CommandOutput> {
        match command {
            Commands::Publish { items } => self.publish(items).await,
            Commands::Verify { asset_id, format } => self.verify(asset_id, format).await,
            Commands::Config { command } => match command {
                ConfigCommands::Show => Ok(CommandOutput::ok(
                    toml::to_string_pretty(&self.config).context("Failed to render config")?,
                )),
                ConfigCommands::Validate => {
                    self.validated()?;
                    Ok(CommandOutput::ok("Configuration is valid".to_string()))
                }
            },
        }
    }

    async fn publish(&self, items_path: &Path) -> Result<CommandOutput> {
        self.validated()?;
        let key = self
            .config
            .publisher
            .signing_key_hex
            .as_deref()
            .ok_or_else(|| anyhow!("publisher.signing_key_hex is required to publish"))?;
        let signer = Ed25519Signer::from_seed_hex(key)?;

        let raw = tokio::fs::read_to_string(items_path)
            .await
            .with_context(|| format!("Failed to read {}", items_path.display()))?;
        let items: Vec<ContentItem> = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid items file {}", items_path.display()))?;
        info!(items = items.len(), signer = %signer.address(), "Loaded items");

        let publisher = Publisher::new(
            self.config.publish_settings(),
            self.open_ledger()?,
            self.open_storage()?,
            Arc::new(HttpFetcher::new()?),
            Arc::new(signer),
        );
        let report = publisher.publish_batch(&items).await;

        Ok(CommandOutput {
            text: format_batch_report(&report),
            success: report.failure_count() == 0,
        })
    }

    async fn verify(&self, asset_id: &str, format: &str) -> Result<CommandOutput> {
        let identity: AssetId = asset_id
            .parse()
            .with_context(|| format!("Invalid asset id '{}'", asset_id))?;

        let registry = MemoryIdentityRegistry::new();
        for (address, parent) in &self.config.identity.registrations {
            registry.register(address, parent);
        }

        let ledger = self.open_ledger()?;
        let storage = self.open_storage()?;
        let (record, report) =
            verify_published(&identity, ledger.as_ref(), storage.as_ref(), &registry).await?;

        let text = match format {
            "json" => serde_json::to_string_pretty(&json!({
                "record": record,
                "verification": report,
            }))?,
            "text" => format_verification(&record, &report),
            other => bail!("Unknown output format '{}' (expected text or json)", other),
        };
        Ok(CommandOutput {
            text,
            success: report.is_valid(),
        })
    }

    fn validated(&self) -> Result<()> {
        self.config.validate().map_err(|errors| {
            let msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            anyhow!("Configuration validation failed:\n{}", msgs.join("\n"))
        })
    }

    fn open_ledger(&self) -> Result<Arc<SledLedger>> {
        let mut slot = self.ledger.lock();
        if let Some(ledger) = slot.as_ref() {
            return Ok(ledger.clone());
        }
        let path = self.config.ledger_path(&self.workspace_root);
        let ledger = Arc::new(
            SledLedger::open(&path, self.config.ledger.local_price)
                .with_context(|| format!("Failed to open ledger at {}", path.display()))?,
        );
        *slot = Some(ledger.clone());
        Ok(ledger)
    }

    fn open_storage(&self) -> Result<Arc<dyn RecordStorage>> {
        let mut slot = self.storage.lock();
        if let Some(storage) = slot.as_ref() {
            return Ok(storage.clone());
        }
        let path = self.config.storage_path(&self.workspace_root);
        let storage: Arc<dyn RecordStorage> = match self.config.storage.backend {
            StorageBackend::ContentAddressed => Arc::new(ContentAddressedStore::new(&path)?),
            StorageBackend::ObjectStore => Arc::new(ObjectStore::new(&path)?),
        };
        *slot = Some(storage.clone());
        Ok(storage)
    }
}
