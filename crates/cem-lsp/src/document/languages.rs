//! The pluggable per-language interface the Document Store dispatches
//! through, mirroring the teacher's `Ecosystem` trait registered in an
//! `EcosystemRegistry` keyed by manifest filename — here keyed by language
//! tag instead.

use std::collections::HashMap;
use std::sync::Arc;

use cem_core::Language;
use cem_syntax::QueryRegistry;
use tree_sitter::Tree;

use crate::semantic::{self, SemanticContext};

/// A single supported source language: how to parse it, and how to answer
/// the Semantic Analyzer's "what's at this offset" question for it.
pub trait LanguageHandler: Send + Sync {
    fn language(&self) -> Language;
    fn file_extensions(&self) -> &'static [&'static str];
    fn parser_language(&self) -> tree_sitter::Language;
    fn analyze(
        &self,
        content: &str,
        tree: &Tree,
        queries: &QueryRegistry,
        offset: usize,
    ) -> SemanticContext;
}

struct HtmlHandler;

impl LanguageHandler for HtmlHandler {
    fn language(&self) -> Language {
        Language::Html
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["html", "htm"]
    }

    fn parser_language(&self) -> tree_sitter::Language {
        cem_syntax::tree_sitter_language(Language::Html)
    }

    fn analyze(
        &self,
        content: &str,
        tree: &Tree,
        queries: &QueryRegistry,
        offset: usize,
    ) -> SemanticContext {
        semantic::analyze_html(content, tree, queries, offset)
    }
}

struct TypeScriptHandler;

impl LanguageHandler for TypeScriptHandler {
    fn language(&self) -> Language {
        Language::TypeScript
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["ts", "js", "mjs", "cjs"]
    }

    fn parser_language(&self) -> tree_sitter::Language {
        cem_syntax::tree_sitter_language(Language::TypeScript)
    }

    fn analyze(
        &self,
        content: &str,
        tree: &Tree,
        queries: &QueryRegistry,
        offset: usize,
    ) -> SemanticContext {
        semantic::analyze_typescript(content, tree, queries, offset)
    }
}

struct TsxHandler;

impl LanguageHandler for TsxHandler {
    fn language(&self) -> Language {
        Language::Tsx
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["tsx", "jsx"]
    }

    fn parser_language(&self) -> tree_sitter::Language {
        cem_syntax::tree_sitter_language(Language::Tsx)
    }

    fn analyze(
        &self,
        content: &str,
        tree: &Tree,
        queries: &QueryRegistry,
        offset: usize,
    ) -> SemanticContext {
        semantic::analyze_tsx(content, tree, queries, offset)
    }
}

/// Keyed by language tag, so a future language registers without touching
/// the Document Store's core open/update/close logic.
pub struct LanguageHandlerRegistry {
    handlers: HashMap<Language, Arc<dyn LanguageHandler>>,
}

impl LanguageHandlerRegistry {
    pub fn new() -> Self {
        let mut handlers: HashMap<Language, Arc<dyn LanguageHandler>> = HashMap::new();
        handlers.insert(Language::Html, Arc::new(HtmlHandler));
        handlers.insert(Language::TypeScript, Arc::new(TypeScriptHandler));
        handlers.insert(Language::Tsx, Arc::new(TsxHandler));
        Self { handlers }
    }

    pub fn get(&self, language: Language) -> Option<&Arc<dyn LanguageHandler>> {
        self.handlers.get(&language)
    }
}

impl Default for LanguageHandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
