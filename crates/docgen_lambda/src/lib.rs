//! AWS-oriented adapters and handlers for document generation.
//!
//! This crate owns runtime integration details (Lambda handlers, handler
//! configuration, and storage adapters). Request contracts, the error
//! taxonomy, and rendering live in `docgen_core`.

pub mod adapters;
pub mod config;
pub mod handlers;
pub mod telemetry;
