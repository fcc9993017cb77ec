//! Shared document generation domain primitives.
//!
//! This crate owns request contracts, the error taxonomy and its status table,
//! storage key conventions, and template rendering. It intentionally excludes
//! AWS SDK and Lambda runtime concerns, which live in `docgen_lambda`.

pub mod contract;
pub mod error;
pub mod render;
pub mod storage_keys;
