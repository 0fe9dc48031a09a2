//! The Document Store (component D): a URI-keyed map of open documents,
//! each holding its content, version, syntax tree, and (for HTML) the
//! `<script>` tags found in it. Cold-start loading is grounded on the
//! teacher's `document/loader.rs` (same 10 MiB hard cap and 1 MiB warning
//! threshold) and `document/state.rs`'s `ColdStartLimiter`.

use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tower_lsp_server::ls_types::Uri;
use tree_sitter::Tree;

use cem_core::{CemError, Language, Result};
use cem_syntax::{extract_script_tags, ParserPool, QueryRegistry, ScriptTag};

use crate::semantic::SemanticContext;

use super::languages::LanguageHandlerRegistry;

/// Files larger than this are rejected outright for cold-start loading.
pub const MAX_FILE_SIZE: u64 = 10_000_000;
/// Files larger than this still load, but a warning is logged.
pub const LARGE_FILE_THRESHOLD: u64 = 1_000_000;

struct DocumentInner {
    content: String,
    version: i32,
    language: Language,
    tree: Option<Tree>,
    script_tags: Vec<ScriptTag>,
}

/// A single open (or cold-started) document. Content, version, tree, and
/// script-tag list are behind one rw-lock, per §5: a query iteration must
/// hold the read lock for its full duration so a concurrent close can't
/// free the tree mid-iteration.
pub struct Document {
    uri: Uri,
    inner: RwLock<DocumentInner>,
}

impl Document {
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn language(&self) -> Language {
        self.inner.read().unwrap().language
    }

    pub fn version(&self) -> i32 {
        self.inner.read().unwrap().version
    }

    pub fn content(&self) -> String {
        self.inner.read().unwrap().content.clone()
    }

    pub fn script_tags(&self) -> Vec<ScriptTag> {
        self.inner.read().unwrap().script_tags.clone()
    }

    /// Runs `f` with the document's content and tree for the full duration
    /// of the call, under one read-lock acquisition.
    pub fn with_tree<R>(&self, f: impl FnOnce(&str, Option<&Tree>) -> R) -> R {
        let guard = self.inner.read().unwrap();
        f(&guard.content, guard.tree.as_ref())
    }
}

/// Rate-limits cold-start disk reads to at most one per `min_interval` per
/// URI, guarding against a misbehaving client causing a pathological
/// re-read loop.
pub struct ColdStartLimiter {
    last_attempts: DashMap<Uri, Instant>,
    min_interval: Duration,
}

impl ColdStartLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            last_attempts: DashMap::new(),
            min_interval,
        }
    }

    /// Returns `true` if a cold-start load for `uri` is allowed right now,
    /// recording the attempt if so.
    pub fn allow(&self, uri: &Uri) -> bool {
        let now = Instant::now();
        if let Some(last) = self.last_attempts.get(uri) {
            if now.duration_since(*last) < self.min_interval {
                return false;
            }
        }
        self.last_attempts.insert(uri.clone(), now);
        true
    }
}

/// URI→Document map plus the parser pool and compiled query registry
/// shared across every document, mirroring the teacher's
/// `ServerState::documents` `DashMap`.
pub struct DocumentStore {
    documents: DashMap<Uri, Arc<Document>>,
    parsers: ParserPool,
    queries: QueryRegistry,
    languages: LanguageHandlerRegistry,
    cold_start_limiter: ColdStartLimiter,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self {
            documents: DashMap::new(),
            parsers: ParserPool::new(),
            queries: QueryRegistry::new(),
            languages: LanguageHandlerRegistry::new(),
            cold_start_limiter: ColdStartLimiter::new(Duration::from_millis(100)),
        }
    }

    pub fn queries(&self) -> &QueryRegistry {
        &self.queries
    }

    pub fn languages(&self) -> &LanguageHandlerRegistry {
        &self.languages
    }

    /// Opens (or replaces) the document at `uri`, returning `None` without
    /// tracking it if `uri`'s extension isn't one of the recognized
    /// languages (§4.2: unrecognized extensions are ignored, never treated
    /// as HTML).
    pub fn open(&self, uri: Uri, text: String, version: i32) -> Option<Arc<Document>> {
        let language = infer_language(&uri)?;
        let document = Arc::new(self.build(uri.clone(), text, version, language));
        self.documents.insert(uri, Arc::clone(&document));
        Some(document)
    }

    /// Applies a content change, rejecting an out-of-order version. A
    /// document with no prior open is treated as an implicit open.
    pub fn update(&self, uri: &Uri, text: String, version: i32) -> Result<Arc<Document>> {
        let (language, current_version) = match self.documents.get(uri) {
            Some(entry) => (entry.language(), entry.version()),
            None => {
                return self
                    .open(uri.clone(), text, version)
                    .ok_or_else(|| CemError::UnsupportedLanguage { uri: format!("{uri:?}") });
            }
        };
        if version < current_version {
            return Err(CemError::StaleVersion {
                uri: format!("{uri:?}"),
                got: version,
                current: current_version,
            });
        }
        let document = Arc::new(self.build(uri.clone(), text, version, language));
        self.documents.insert(uri.clone(), Arc::clone(&document));
        Ok(document)
    }

    pub fn close(&self, uri: &Uri) {
        self.documents.remove(uri);
    }

    pub fn document(&self, uri: &Uri) -> Option<Arc<Document>> {
        self.documents.get(uri).map(|entry| Arc::clone(entry.value()))
    }

    pub fn all_documents(&self) -> Vec<Arc<Document>> {
        self.documents.iter().map(|entry| Arc::clone(entry.value())).collect()
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    /// Dispatches to the registered [`LanguageHandler`](super::languages::LanguageHandler)
    /// for `document`'s language and returns its classification at `offset`.
    pub fn analyze(&self, document: &Document, offset: usize) -> SemanticContext {
        let Some(handler) = self.languages.get(document.language()) else {
            return SemanticContext::None;
        };
        document.with_tree(|content, tree| match tree {
            Some(tree) => handler.analyze(content, tree, &self.queries, offset),
            None => SemanticContext::None,
        })
    }

    fn build(&self, uri: Uri, text: String, version: i32, language: Language) -> Document {
        let tree = {
            let mut parser = self.parsers.checkout(language);
            parser.parse(&text, None)
        };

        let script_tags = if language == Language::Html {
            tree.as_ref()
                .and_then(|tree| {
                    let matcher = self.queries.matcher(Language::Html, "scriptTags").ok()?;
                    Some(extract_script_tags(&matcher, tree, &text))
                })
                .unwrap_or_default()
        } else {
            Vec::new()
        };

        Document {
            uri,
            inner: RwLock::new(DocumentInner {
                content: text,
                version,
                language,
                tree,
                script_tags,
            }),
        }
    }

    /// Loads `uri` from disk if it isn't already open (§3.1). Never treats
    /// a cold-started document as authoritative over a later real open —
    /// callers still go through [`Self::open`]/[`Self::update`] for that.
    pub async fn ensure_document_loaded(&self, uri: &Uri, cold_start_enabled: bool) -> Option<Arc<Document>> {
        if let Some(document) = self.document(uri) {
            return Some(document);
        }
        if !cold_start_enabled || !self.cold_start_limiter.allow(uri) {
            return None;
        }
        infer_language(uri)?;
        let text = load_document_from_disk(uri).await.ok()?;
        self.open(uri.clone(), text, 0)
    }
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

fn infer_language(uri: &Uri) -> Option<Language> {
    Language::from_path(uri.path().as_str())
}

async fn load_document_from_disk(uri: &Uri) -> Result<String> {
    let path: PathBuf = uri
        .to_file_path()
        .ok_or_else(|| CemError::Cache(format!("not a file:// URI: {uri:?}")))?
        .into_owned();

    let metadata = tokio::fs::metadata(&path).await.map_err(|err| {
        tracing::debug!(path = %path.display(), error = %err, "cold-start load failed");
        CemError::Io(err)
    })?;

    if metadata.len() > MAX_FILE_SIZE {
        return Err(CemError::Cache(format!(
            "{} exceeds the {} byte cold-start size limit",
            path.display(),
            MAX_FILE_SIZE
        )));
    }
    if metadata.len() > LARGE_FILE_THRESHOLD {
        tracing::warn!(path = %path.display(), size = metadata.len(), "cold-starting large file");
    }

    tokio::fs::read_to_string(&path).await.map_err(CemError::Io)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn uri(s: &str) -> Uri {
        Uri::from_str(s).unwrap()
    }

    #[test]
    fn test_open_then_document_round_trip() {
        let store = DocumentStore::new();
        let u = uri("file:///test.html");
        store.open(u.clone(), "<my-card></my-card>".into(), 1).unwrap();
        let doc = store.document(&u).expect("document should be present");
        assert_eq!(doc.version(), 1);
        assert_eq!(doc.language(), Language::Html);
    }

    #[test]
    fn test_open_rejects_unrecognized_extension() {
        let store = DocumentStore::new();
        let u = uri("file:///README.md");
        assert!(store.open(u.clone(), "# hi".into(), 1).is_none());
        assert!(store.document(&u).is_none());
    }

    #[test]
    fn test_update_rejects_stale_version() {
        let store = DocumentStore::new();
        let u = uri("file:///test.html");
        store.open(u.clone(), "<a></a>".into(), 5).unwrap();
        let result = store.update(&u, "<b></b>".into(), 3);
        assert!(matches!(result, Err(CemError::StaleVersion { .. })));
        assert_eq!(store.document(&u).unwrap().version(), 5);
    }

    #[test]
    fn test_update_on_unrecognized_extension_is_unsupported_language() {
        let store = DocumentStore::new();
        let u = uri("file:///README.md");
        let result = store.update(&u, "# hi".into(), 1);
        assert!(matches!(result, Err(CemError::UnsupportedLanguage { .. })));
    }

    #[test]
    fn test_close_removes_document() {
        let store = DocumentStore::new();
        let u = uri("file:///test.html");
        store.open(u.clone(), "<a></a>".into(), 1).unwrap();
        store.close(&u);
        assert!(store.document(&u).is_none());
    }

    #[test]
    fn test_html_document_extracts_script_tags() {
        let store = DocumentStore::new();
        let u = uri("file:///test.html");
        let doc = store
            .open(
                u,
                r#"<script type="module">import "./x.js";</script>"#.into(),
                1,
            )
            .unwrap();
        assert_eq!(doc.script_tags().len(), 1);
        assert!(doc.script_tags()[0].is_module);
    }

    #[test]
    fn test_cold_start_limiter_blocks_rapid_repeats() {
        let limiter = ColdStartLimiter::new(Duration::from_millis(500));
        let u = uri("file:///x.html");
        assert!(limiter.allow(&u));
        assert!(!limiter.allow(&u));
    }

    #[test]
    fn test_cold_start_limiter_tracks_uris_independently() {
        let limiter = ColdStartLimiter::new(Duration::from_millis(500));
        assert!(limiter.allow(&uri("file:///a.html")));
        assert!(limiter.allow(&uri("file:///b.html")));
    }

    #[tokio::test]
    async fn test_ensure_document_loaded_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cold.html");
        std::fs::write(&path, "<my-card></my-card>").unwrap();
        let file_uri = Uri::from_str(&format!("file://{}", path.display())).unwrap();

        let store = DocumentStore::new();
        let document = store
            .ensure_document_loaded(&file_uri, true)
            .await
            .expect("cold start should succeed");
        assert_eq!(document.version(), 0);
        assert_eq!(document.content(), "<my-card></my-card>");
    }

    #[tokio::test]
    async fn test_ensure_document_loaded_disabled_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cold.html");
        std::fs::write(&path, "<my-card></my-card>").unwrap();
        let file_uri = Uri::from_str(&format!("file://{}", path.display())).unwrap();

        let store = DocumentStore::new();
        assert!(store.ensure_document_loaded(&file_uri, false).await.is_none());
    }
}
