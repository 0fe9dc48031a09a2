//! Tree-sitter plumbing shared by every language handler: compiled query
//! caching, a small parser pool, and HTML `<script>` extraction.
//!
//! This crate knows nothing about documents, LSP requests, or the manifest
//! registry — it is a thin, reusable layer over `tree-sitter` itself.

pub mod grammar;
pub mod parser_pool;
pub mod queries;
pub mod query_registry;
pub mod script_tags;

pub use grammar::tree_sitter_language;
pub use parser_pool::{ParserPool, PooledParser};
pub use query_registry::{CaptureMap, CaptureRecord, Matcher, QueryRegistry};
pub use script_tags::{extract_script_tags, scan_import_specifiers, ScriptTag};
