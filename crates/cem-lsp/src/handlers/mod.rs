//! LSP protocol handlers.
//!
//! Each handler is responsible for one LSP feature and is a pure function
//! over [`crate::state::AppState`] plus the request's params, returning an
//! LSP-compliant response type:
//!
//! - [`completion`]: tag/attribute/attribute-value completion (§4.5.2)
//! - [`hover`]: element and attribute documentation (§4.5.1)
//! - [`diagnostics`]: unknown tag/attribute/value/slot warnings with
//!   autofix `data` (§4.5.3)
//! - [`code_actions`]: quick fixes built from a diagnostic's autofix
//!   `data` (§4.5.4)
//! - [`references`]: cross-file tag-name occurrences (§4.5.5)
//! - [`definition`]: go-to the defining class/decorator (§4.5.6)
//! - [`workspace_symbol`]: element definitions and duplicate-tag
//!   collisions (§4.5.7)
//!
//! Handlers gracefully degrade on missing documents or parse failures
//! (return an empty/`None` response) rather than panicking; network or
//! filesystem I/O they need (workspace scans, go-to-definition target
//! reads) is awaited inline since there is no background cache to warm.

pub mod code_actions;
pub mod completion;
pub mod definition;
pub mod diagnostics;
pub mod hover;
pub mod references;
pub mod workspace_symbol;
