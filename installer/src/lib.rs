//! modsync installer library.
//!
//! This crate saves the set of installed manifest-driven modules to a plain
//! text profile and restores them elsewhere by fetching each module's remote
//! manifest and artefact. It backs the `modsync` CLI binary and can be used
//! programmatically for testing or custom workflows.
//!
//! # Modules
//!
//! - [`artefact`] - Retrieval, extraction, and layout normalisation of module archives
//! - [`cli`] - Command-line argument definitions
//! - [`config`] - TOML configuration for timeouts and retry budgets
//! - [`discovery`] - Local manifest scan for the save command
//! - [`error`] - Run-scoped and record-scoped error types with recovery hints
//! - [`identifier`] - Sanitised module identifiers used as directory names
//! - [`load`] - The load command
//! - [`manifest`] - Remote and local manifest parsing
//! - [`output`] - Stderr output helpers
//! - [`pipeline`] - Per-record install orchestration
//! - [`preflight`] - Install root checks run before any record
//! - [`profile`] - Profile file format
//! - [`resolution`] - Remote manifest resolution
//! - [`save`] - The save command
//! - [`transfer`] - Idempotency check and artefact acquisition

pub mod artefact;
pub mod cli;
pub mod config;
pub mod discovery;
pub mod error;
pub mod identifier;
pub mod load;
pub mod manifest;
pub mod output;
pub mod pipeline;
pub mod preflight;
pub mod profile;
pub mod resolution;
pub mod save;
pub mod transfer;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
