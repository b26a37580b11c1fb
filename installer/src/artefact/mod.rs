//! Module archive handling.
//!
//! # Sub-modules
//!
//! - [`download`] - Manifest and artefact retrieval over HTTP.
//! - [`extraction`] - Zip extraction with path traversal protection.
//! - [`normalise`] - Lifting a single wrapper directory after extraction.
//! - [`retry`] - Bounded retries with linear backoff.

pub mod download;
pub mod extraction;
pub mod normalise;
pub mod retry;
