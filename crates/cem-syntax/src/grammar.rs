//! Maps [`cem_core::Language`] to its compiled `tree_sitter::Language`.

use cem_core::Language;

/// Returns the tree-sitter grammar backing `language`.
pub fn tree_sitter_language(language: Language) -> tree_sitter::Language {
    match language {
        Language::Html => tree_sitter_html::LANGUAGE.into(),
        Language::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
        Language::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
    }
}
