//! Shared asset-hierarchy and bulk-load domain primitives.
//!
//! This crate owns the declarative configuration, the run-scoped lookup tables,
//! remote status vocabularies and the historical data generator. It
//! intentionally excludes AWS SDK and runtime concerns; those live in
//! `bulk_load_runner`.

pub mod contract;
pub mod lookup;
pub mod partitioning;
pub mod settings;
pub mod simulation;
pub mod status;
pub mod storage_keys;
