//! Merge rules: defaults, override order, conflict handling.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("ledger.path", ".provgraph/ledger")?
        .set_default("ledger.local_price", 1)?
        .set_default("storage.backend", "content_addressed")?
        .set_default("storage.path", ".provgraph/storage")?
        .set_default("encryption.timeout_secs", 60)?
        .set_default("batch.failure_policy", "continue")?
        .set_default("batch.placement", "article")
}
