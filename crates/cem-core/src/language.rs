//! Language inference and the per-language tag used throughout the crate.

/// The languages the server understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Html,
    TypeScript,
    Tsx,
}

impl Language {
    /// Returns the stable identifier used in logs and configuration.
    pub fn id(self) -> &'static str {
        match self {
            Language::Html => "html",
            Language::TypeScript => "typescript",
            Language::Tsx => "tsx",
        }
    }

    /// Infers a language from a document URI's file extension.
    ///
    /// `.html`/`.htm` → HTML, `.ts`/`.js` → TypeScript, `.tsx`/`.jsx` → TSX.
    /// Any other extension (or none) returns `None`, and such documents are
    /// ignored by the Document Store.
    ///
    /// # Examples
    ///
    /// ```
    /// use cem_core::language::Language;
    ///
    /// assert_eq!(Language::from_path("src/app.tsx"), Some(Language::Tsx));
    /// assert_eq!(Language::from_path("index.html"), Some(Language::Html));
    /// assert_eq!(Language::from_path("README.md"), None);
    /// ```
    pub fn from_path(path: &str) -> Option<Self> {
        let ext = path.rsplit('.').next()?.to_lowercase();
        match ext.as_str() {
            "html" | "htm" => Some(Language::Html),
            "ts" | "js" | "mjs" | "cjs" => Some(Language::TypeScript),
            "tsx" | "jsx" => Some(Language::Tsx),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_path_html_variants() {
        assert_eq!(Language::from_path("a.html"), Some(Language::Html));
        assert_eq!(Language::from_path("a.htm"), Some(Language::Html));
        assert_eq!(Language::from_path("a.HTML"), Some(Language::Html));
    }

    #[test]
    fn test_from_path_typescript_and_tsx() {
        assert_eq!(Language::from_path("a.ts"), Some(Language::TypeScript));
        assert_eq!(Language::from_path("a.js"), Some(Language::TypeScript));
        assert_eq!(Language::from_path("a.tsx"), Some(Language::Tsx));
        assert_eq!(Language::from_path("a.jsx"), Some(Language::Tsx));
    }

    #[test]
    fn test_from_path_unknown_extension_is_none() {
        assert_eq!(Language::from_path("a.md"), None);
        assert_eq!(Language::from_path("no-extension"), None);
    }
}
