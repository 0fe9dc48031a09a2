//! A small per-language pool of `tree_sitter::Parser`s.
//!
//! `Parser` is cheap to construct but not `Sync`: only one document can be
//! parsed with a given instance at a time. Rather than build (and throw
//! away) a parser on every keystroke, the Document Store checks one out of
//! the pool for the duration of a parse and returns it on drop.

use std::sync::Mutex;

use cem_core::Language;
use tree_sitter::Parser;

use crate::grammar::tree_sitter_language;

pub struct ParserPool {
    html: Mutex<Vec<Parser>>,
    typescript: Mutex<Vec<Parser>>,
    tsx: Mutex<Vec<Parser>>,
}

impl ParserPool {
    pub fn new() -> Self {
        Self {
            html: Mutex::new(Vec::new()),
            typescript: Mutex::new(Vec::new()),
            tsx: Mutex::new(Vec::new()),
        }
    }

    fn bucket(&self, language: Language) -> &Mutex<Vec<Parser>> {
        match language {
            Language::Html => &self.html,
            Language::TypeScript => &self.typescript,
            Language::Tsx => &self.tsx,
        }
    }

    /// Checks out a parser for `language`, creating one if the pool is
    /// empty. The parser is returned to the pool when the guard drops.
    pub fn checkout(&self, language: Language) -> PooledParser<'_> {
        let mut parser = self
            .bucket(language)
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| new_parser(language));
        // Defensive: a pooled parser always carries its own language, but
        // re-assert it in case a future language variant shares a bucket.
        parser
            .set_language(&tree_sitter_language(language))
            .expect("grammar is statically known to be valid");
        PooledParser {
            pool: self,
            language,
            parser: Some(parser),
        }
    }
}

impl Default for ParserPool {
    fn default() -> Self {
        Self::new()
    }
}

fn new_parser(language: Language) -> Parser {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_language(language))
        .expect("grammar is statically known to be valid");
    parser
}

/// A checked-out parser. Returned to its pool on drop.
pub struct PooledParser<'a> {
    pool: &'a ParserPool,
    language: Language,
    parser: Option<Parser>,
}

impl std::ops::Deref for PooledParser<'_> {
    type Target = Parser;

    fn deref(&self) -> &Parser {
        self.parser.as_ref().expect("parser present until drop")
    }
}

impl std::ops::DerefMut for PooledParser<'_> {
    fn deref_mut(&mut self) -> &mut Parser {
        self.parser.as_mut().expect("parser present until drop")
    }
}

impl Drop for PooledParser<'_> {
    fn drop(&mut self) {
        if let Some(parser) = self.parser.take() {
            self.pool.bucket(self.language).lock().unwrap().push(parser);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkout_parses_document() {
        let pool = ParserPool::new();
        let mut parser = pool.checkout(Language::Html);
        let tree = parser.parse("<my-card></my-card>", None).unwrap();
        assert_eq!(tree.root_node().kind(), "document");
    }

    #[test]
    fn test_parser_is_reused_after_drop() {
        let pool = ParserPool::new();
        {
            let _parser = pool.checkout(Language::Html);
        }
        assert_eq!(pool.html.lock().unwrap().len(), 1);
        {
            let _parser = pool.checkout(Language::Html);
        }
        assert_eq!(pool.html.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_languages_use_separate_buckets() {
        let pool = ParserPool::new();
        drop(pool.checkout(Language::Html));
        drop(pool.checkout(Language::Tsx));
        assert_eq!(pool.html.lock().unwrap().len(), 1);
        assert_eq!(pool.tsx.lock().unwrap().len(), 1);
    }
}
