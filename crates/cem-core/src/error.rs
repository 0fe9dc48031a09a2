use thiserror::Error;

/// Error types shared across the cem-lsp workspace.
///
/// All fallible operations in the manifest model, registry, and syntax
/// layers return this enum, giving every caller a single `match` surface
/// with source-error tracking via `thiserror`.
///
/// # Examples
///
/// ```
/// use cem_core::error::CemError;
///
/// fn parse_manifest(text: &str) -> Result<(), CemError> {
///     serde_json::from_str::<serde_json::Value>(text)
///         .map(|_| ())
///         .map_err(CemError::from)
/// }
/// ```
#[derive(Error, Debug)]
pub enum CemError {
    #[error("failed to parse manifest at {path}: {source}")]
    ManifestParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("manifest schema error in {path}: {reason}")]
    ManifestSchema { path: String, reason: String },

    #[error("cache error: {0}")]
    Cache(String),

    #[error("unknown tree-sitter query: {language}/{name}")]
    UnknownQuery { language: String, name: String },

    #[error("failed to compile tree-sitter query {language}/{name}: {source}")]
    QueryCompile {
        language: String,
        name: String,
        #[source]
        source: tree_sitter_query_error::QueryErrorShim,
    },

    #[error("document {uri} has an out-of-order version: got {got}, current {current}")]
    StaleVersion {
        uri: String,
        got: i32,
        current: i32,
    },

    #[error("document {uri} has no recognized language and is not tracked")]
    UnsupportedLanguage { uri: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias for `Result<T, CemError>`, used throughout the workspace.
pub type Result<T> = std::result::Result<T, CemError>;

/// Wraps `tree_sitter::QueryError` so this crate does not need a direct
/// dependency on `tree-sitter` just to report compile failures; `cem-syntax`
/// constructs this shim when a query fails to compile.
pub mod tree_sitter_query_error {
    use std::fmt;

    #[derive(Debug)]
    pub struct QueryErrorShim(pub String);

    impl fmt::Display for QueryErrorShim {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(&self.0)
        }
    }

    impl std::error::Error for QueryErrorShim {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_error_display() {
        let error = CemError::Cache("entry evicted".into());
        assert_eq!(error.to_string(), "cache error: entry evicted");
    }

    #[test]
    fn test_stale_version_display() {
        let error = CemError::StaleVersion {
            uri: "file:///a.html".into(),
            got: 1,
            current: 3,
        };
        assert!(error.to_string().contains("out-of-order version"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error: CemError = json_err.into();
        assert!(error.to_string().contains("JSON error"));
    }
}
