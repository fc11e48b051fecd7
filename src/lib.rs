//! Provgraph: Signed Content Provenance Publishing
//!
//! Publishes content items as signed, append-only provenance records
//! anchored in a hierarchical content graph. Each item is identified by the
//! hash of its canonical bytes, compared with what the graph already holds,
//! and written with at most one ledger operation.

pub mod canonical;
pub mod cli;
pub mod config;
pub mod content;
pub mod diff;
pub mod encryption;
pub mod error;
pub mod existence;
pub mod fetch;
pub mod hierarchy;
pub mod identity;
pub mod ledger;
pub mod logging;
pub mod publish;
pub mod record;
pub mod signing;
pub mod storage;
pub mod types;
pub mod verify;
