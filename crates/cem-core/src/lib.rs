//! Shared data model for the CEM-aware LSP server.
//!
//! `cem-core` has no knowledge of tree-sitter parsing or the LSP wire
//! protocol beyond the `lsp_types` position/range vocabulary it shares with
//! every other crate in the workspace. It owns:
//!
//! - [`manifest`]: the Custom Elements Manifest JSON schema.
//! - [`element`]: the resolved, registry-facing view of a declaration.
//! - [`language`]: the three document languages the server understands.
//! - [`position`]: UTF-8 byte-offset conversions shared by the analyzer and
//!   every handler that reports a `Range`.
//! - [`autofix`]: the diagnostic `data` payload shape and fuzzy-match helper
//!   consumed by the diagnostics and code action handlers.
//! - [`cache`]: the mtime-validated manifest cache used by the registry.
//! - [`error`]: the unified error enum returned across the workspace.
//! - [`html_attrs`]: the embedded MDN global-attribute allow-list consulted
//!   by the unknown-attribute diagnostic.

pub mod autofix;
pub mod cache;
pub mod element;
pub mod error;
pub mod html_attrs;
pub mod language;
pub mod manifest;
pub mod position;

pub use autofix::{AutofixData, AutofixKind};
pub use cache::ManifestCache;
pub use element::ElementDefinition;
pub use error::{CemError, Result};
pub use html_attrs::is_common_attribute;
pub use language::Language;
pub use manifest::{
    Attribute, ClassDeclaration, Declaration, Deprecated, Event, Manifest, Module, Slot,
    SuperclassRef, TypeDescriptor, parse_manifest,
};
