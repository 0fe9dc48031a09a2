//! Named tree-sitter query sources, one module per grammar.
//!
//! [`crate::query_registry::QueryRegistry`] compiles these against the
//! matching `tree_sitter::Language` on first use and caches the result;
//! nothing here touches `tree_sitter` directly so the source text stays
//! easy to read and diff independent of the compiled form.

pub mod html;
pub mod tsx;
pub mod typescript;

use cem_core::Language;

/// Looks up a named query's source text for `language`.
///
/// Returns `None` for an unknown `(language, name)` pair; the caller turns
/// that into [`cem_core::CemError::UnknownQuery`].
pub fn lookup(language: Language, name: &str) -> Option<&'static str> {
    match (language, name) {
        (Language::Html, "customElements") => Some(html::CUSTOM_ELEMENTS),
        (Language::Html, "completionContext") => Some(html::COMPLETION_CONTEXT),
        (Language::Html, "scriptTags") => Some(html::SCRIPT_TAGS),
        (Language::TypeScript, "htmlTemplates") => Some(typescript::HTML_TEMPLATES),
        (Language::TypeScript, "classes") => Some(typescript::CLASSES),
        (Language::Tsx, "customElements") => Some(tsx::CUSTOM_ELEMENTS),
        (Language::Tsx, "completionContext") => Some(tsx::COMPLETION_CONTEXT),
        _ => None,
    }
}
