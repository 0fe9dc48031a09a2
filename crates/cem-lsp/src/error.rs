//! Error types for the cem-lsp server.
//!
//! The server doesn't define its own error enum: every failure mode it can
//! hit (manifest parsing, query compilation, stale document versions, I/O)
//! is already a variant of [`cem_core::CemError`], so handlers and the
//! document store share that type directly.

pub use cem_core::{CemError, Result};
