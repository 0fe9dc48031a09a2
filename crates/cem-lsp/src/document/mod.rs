//! Document management module.
//!
//! - `languages`: the per-language parse/analyze dispatch table
//! - `store`: the URI-keyed map of open documents, cold-start loading included

mod languages;
mod store;

pub use languages::{LanguageHandler, LanguageHandlerRegistry};
pub use store::{ColdStartLimiter, Document, DocumentStore, LARGE_FILE_THRESHOLD, MAX_FILE_SIZE};
