//! Compiles and caches the named tree-sitter queries each language handler
//! runs against its parse trees.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use cem_core::error::tree_sitter_query_error::QueryErrorShim;
use cem_core::{CemError, Language, Result};
use streaming_iterator::StreamingIterator;
use tree_sitter::{Node, Query, QueryCursor, Tree};

use crate::grammar::tree_sitter_language;
use crate::queries;

/// One capture within a query match: the byte range it spans and the text
/// it covers.
#[derive(Debug, Clone)]
pub struct CaptureRecord {
    pub start_byte: usize,
    pub end_byte: usize,
    pub text: String,
}

impl CaptureRecord {
    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.start_byte && offset < self.end_byte
    }
}

/// One query match, as a capture-name → records map. A capture name can
/// appear more than once in a single match (e.g. repeated `attr.name`
/// captures inside one `start_tag`), so each entry is a `Vec`.
pub type CaptureMap = HashMap<String, Vec<CaptureRecord>>;

/// A compiled query ready to run against parse trees of one language.
///
/// Not thread-safe: `QueryCursor` carries mutable iteration state, so each
/// caller obtains its own `Matcher` from the registry rather than sharing
/// one across threads.
pub struct Matcher {
    query: Arc<Query>,
}

impl std::fmt::Debug for Matcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Matcher").finish_non_exhaustive()
    }
}

impl Matcher {
    /// Runs the query over `tree`, yielding one [`CaptureMap`] per match
    /// whose captures are grouped under `parent_capture_name` (e.g.
    /// `"element"`, `"start.tag"`). Matches without that parent capture are
    /// skipped.
    pub fn parent_captures(
        &self,
        tree: &Tree,
        content: &str,
        parent_capture_name: &str,
    ) -> Vec<CaptureMap> {
        let mut cursor = QueryCursor::new();
        let bytes = content.as_bytes();
        let capture_names = self.query.capture_names();
        let mut results = Vec::new();

        let mut matches = cursor.matches(&self.query, tree.root_node(), bytes);
        while let Some(m) = matches.next() {
            let mut map: CaptureMap = HashMap::new();
            let mut has_parent = false;
            for capture in m.captures {
                let name = capture_names[capture.index as usize];
                if name == parent_capture_name {
                    has_parent = true;
                }
                map.entry(name.to_string())
                    .or_default()
                    .push(record_for(capture.node, bytes));
            }
            if has_parent {
                results.push(map);
            }
        }
        results
    }

    /// Runs the query over `tree`, returning every match as a flat
    /// [`CaptureMap`] regardless of which captures are present. Useful for
    /// queries like `scriptTags` whose matches don't need parent filtering.
    pub fn all_captures(&self, tree: &Tree, content: &str) -> Vec<CaptureMap> {
        let mut cursor = QueryCursor::new();
        let bytes = content.as_bytes();
        let capture_names = self.query.capture_names();
        let mut results = Vec::new();

        let mut matches = cursor.matches(&self.query, tree.root_node(), bytes);
        while let Some(m) = matches.next() {
            let mut map: CaptureMap = HashMap::new();
            for capture in m.captures {
                let name = capture_names[capture.index as usize];
                map.entry(name.to_string())
                    .or_default()
                    .push(record_for(capture.node, bytes));
            }
            results.push(map);
        }
        results
    }
}

fn record_for(node: Node<'_>, bytes: &[u8]) -> CaptureRecord {
    CaptureRecord {
        start_byte: node.start_byte(),
        end_byte: node.end_byte(),
        text: String::from_utf8_lossy(&bytes[node.start_byte()..node.end_byte()]).into_owned(),
    }
}

/// Compiles and caches named queries, keyed by `(language, name)`.
///
/// Compile failures are reported once, at the point a handler first asks
/// for that query, and cached as an error so repeated lookups don't retry
/// a query that will never compile (see the Query Registry's `CompileFailure`
/// contract).
pub struct QueryRegistry {
    compiled: RwLock<HashMap<(Language, &'static str), Arc<Query>>>,
}

impl QueryRegistry {
    pub fn new() -> Self {
        Self {
            compiled: RwLock::new(HashMap::new()),
        }
    }

    /// Returns a fresh [`Matcher`] for the named query, compiling and
    /// caching it on first use.
    pub fn matcher(&self, language: Language, name: &str) -> Result<Matcher> {
        if let Some(query) = self.compiled.read().unwrap().get(&(language, name)) {
            return Ok(Matcher {
                query: Arc::clone(query),
            });
        }

        let source = queries::lookup(language, name).ok_or_else(|| CemError::UnknownQuery {
            language: language.id().to_string(),
            name: name.to_string(),
        })?;
        let ts_language = tree_sitter_language(language);
        let query =
            Query::new(&ts_language, source).map_err(|err| CemError::QueryCompile {
                language: language.id().to_string(),
                name: name.to_string(),
                source: QueryErrorShim(err.to_string()),
            })?;
        let query = Arc::new(query);

        self.compiled
            .write()
            .unwrap()
            .insert((language, static_name(name)), Arc::clone(&query));
        Ok(Matcher { query })
    }
}

impl Default for QueryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Interns `name` against the fixed set of known query names so it can live
/// in the cache key as `&'static str`. All query names are compile-time
/// constants looked up via [`queries::lookup`], so this always succeeds for
/// names that reached this point.
fn static_name(name: &str) -> &'static str {
    match name {
        "customElements" => "customElements",
        "completionContext" => "completionContext",
        "scriptTags" => "scriptTags",
        "htmlTemplates" => "htmlTemplates",
        "classes" => "classes",
        other => Box::leak(other.to_string().into_boxed_str()),
    }
}
