//! Extracts `<script>` elements from an HTML document and the import
//! specifiers referenced from their bodies.

use crate::query_registry::Matcher;
use tree_sitter::Tree;

/// A single `<script>` element found in an HTML document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptTag {
    pub start_byte: usize,
    pub end_byte: usize,
    pub is_module: bool,
    pub src: Option<String>,
    /// Import specifiers found in the script body by [`scan_import_specifiers`].
    /// Empty for an external script (one with `src`).
    pub imports: Vec<String>,
}

/// Runs the `scriptTags` query over `tree` and returns one [`ScriptTag`] per
/// `<script>` element, in document order.
pub fn extract_script_tags(matcher: &Matcher, tree: &Tree, content: &str) -> Vec<ScriptTag> {
    matcher
        .all_captures(tree, content)
        .into_iter()
        .filter_map(|captures| {
            let element = captures.get("script.element")?.first()?;
            let mut is_module = false;
            let mut src = None;

            if let (Some(names), Some(values)) =
                (captures.get("attr.name"), captures.get("attr.value"))
            {
                for (name, value) in names.iter().zip(values.iter()) {
                    match name.text.as_str() {
                        "type" if value.text.trim() == "module" => is_module = true,
                        "src" => src = Some(value.text.clone()),
                        _ => {}
                    }
                }
            }

            let imports = if src.is_none() {
                captures
                    .get("script.body")
                    .and_then(|bodies| bodies.first())
                    .map(|body| scan_import_specifiers(&body.text))
                    .unwrap_or_default()
            } else {
                Vec::new()
            };

            Some(ScriptTag {
                start_byte: element.start_byte,
                end_byte: element.end_byte,
                is_module,
                src,
                imports,
            })
        })
        .collect()
}

/// Scans `text` for import specifiers, without a full parse:
///
/// - `import '<spec>'` / `import "<spec>"` — bare side-effecting import
/// - `import X from '<spec>'`, `import { a, b } from '<spec>'`,
///   `import * as X from '<spec>'` — binding import
/// - `import('<spec>')` — dynamic import
///
/// Anything that doesn't match one of these shapes (re-exports, comments
/// that happen to contain the word "import", etc.) is silently skipped;
/// this is a best-effort scan feeding "missing import" diagnostics, not a
/// module resolver.
pub fn scan_import_specifiers(text: &str) -> Vec<String> {
    let bytes = text.as_bytes();
    let mut specifiers = Vec::new();
    let mut search_from = 0;

    while let Some(rel) = text[search_from..].find("import") {
        let start = search_from + rel;
        let keyword_end = start + "import".len();
        let is_word_start = start == 0 || !is_ident_byte(bytes[start - 1]);
        let is_word_end = keyword_end >= bytes.len() || !is_ident_byte(bytes[keyword_end]);
        if !is_word_start || !is_word_end {
            search_from = keyword_end;
            continue;
        }

        let rest = &text[keyword_end..];
        let trimmed = rest.trim_start();
        let skipped = rest.len() - trimmed.len();
        let cursor = keyword_end + skipped;

        if trimmed.starts_with('(') {
            if let Some(spec) = extract_quoted(&text[cursor + 1..]) {
                specifiers.push(spec);
            }
        } else if trimmed.starts_with('\'') || trimmed.starts_with('"') {
            if let Some(spec) = extract_quoted(&text[cursor..]) {
                specifiers.push(spec);
            }
        } else {
            // Binding import: look for `from` before the statement ends.
            let stop = text[cursor..]
                .find([';', '\n'])
                .map_or(text.len(), |rel| cursor + rel);
            if let Some(from_rel) = text[cursor..stop].find("from") {
                let after_from = cursor + from_rel + "from".len();
                if let Some(spec) = extract_quoted(&text[after_from..]) {
                    specifiers.push(spec);
                }
            }
        }

        search_from = keyword_end;
    }

    specifiers
}

fn is_ident_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'$'
}

/// Finds the first quoted string literal in `text` and returns its
/// contents, stopping the search if a non-whitespace, non-quote character
/// is seen first (so `from somethingElse` doesn't match a later literal).
fn extract_quoted(text: &str) -> Option<String> {
    let trimmed = text.trim_start();
    let quote = trimmed.chars().next()?;
    if quote != '\'' && quote != '"' {
        return None;
    }
    let rest = &trimmed[quote.len_utf8()..];
    let end = rest.find(quote)?;
    Some(rest[..end].to_string())
}
