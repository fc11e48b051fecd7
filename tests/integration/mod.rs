//! Integration tests for the provgraph publish engine

mod batch_policy;
mod hierarchy_placement;
mod record_history;
mod scenarios;
mod sled_ledger;
mod storage_backends;
mod support;
mod verification;
