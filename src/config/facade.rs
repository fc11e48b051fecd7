//! Entry points for loading configuration.

use super::merge::builder_with_defaults;
use super::sources::{global_file, workspace_file};
use super::ProvgraphConfig;
use config::{ConfigError, Environment, File};
use std::path::Path;
use tracing::debug;

/// Loads [`ProvgraphConfig`] from layered sources
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a workspace.
    ///
    /// Later sources override earlier ones: defaults, user file, workspace
    /// files, then `PROVGRAPH__SECTION__KEY` environment variables.
    pub fn load(workspace_root: &Path) -> Result<ProvgraphConfig, ConfigError> {
        let builder = builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        let config = builder
            .add_source(environment())
            .build()?
            .try_deserialize()?;
        debug!(workspace = %workspace_root.display(), "Configuration loaded");
        Ok(config)
    }

    /// Load configuration from one explicit file plus environment overrides.
    pub fn load_from_file(path: &Path) -> Result<ProvgraphConfig, ConfigError> {
        builder_with_defaults()?
            .add_source(File::from(path))
            .add_source(environment())
            .build()?
            .try_deserialize()
    }
}

fn environment() -> Environment {
    Environment::with_prefix("PROVGRAPH")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}
