//! CLI parse: clap types for provgraph. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Provgraph CLI - signed content provenance publishing
#[derive(Parser)]
#[command(name = "provgraph")]
#[command(about = "Publish signed provenance records into a hierarchical content graph")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Publish every item of a JSON array, in order
    Publish {
        /// Path to a JSON file holding an array of content items
        items: PathBuf,
    },
    /// Verify the current record of an asset
    Verify {
        /// Asset id as 64 hex characters
        asset_id: String,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Configuration commands
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration as TOML
    Show,
    /// Validate the effective configuration
    Validate,
}
