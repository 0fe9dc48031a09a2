//! Position-sensitive semantic analysis: given a document and a byte
//! offset, classifies what's there (a custom-element tag name, an
//! attribute name, an attribute value, or a nested HTML fragment inside a
//! template literal) and, separately, resolves whole elements/attributes at
//! a position for hover/references/definition.
//!
//! There's no teacher counterpart for this module — it's the domain-
//! specific core the rest of the server is built around — so it's grounded
//! directly in the query shapes `cem-syntax` compiles and the priority
//! rules spelled out for each language.

use std::collections::HashMap;

use cem_core::position::range_from_bytes;
use cem_core::Language;
use cem_syntax::{CaptureMap, CaptureRecord, QueryRegistry};
use tower_lsp_server::ls_types::Range;
use tree_sitter::Tree;

/// What the cursor is resting on, for completion/diagnostics dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SemanticContext {
    TagName {
        name: String,
        range: Range,
    },
    AttributeName {
        owner: String,
        name: String,
        range: Range,
    },
    AttributeValue {
        owner: String,
        attr: String,
        value: String,
        range: Range,
    },
    None,
}

/// Byte-offset-based intermediate form. Kept separate from
/// [`SemanticContext`] so template-literal composition (§4.4.3) can shift
/// offsets before ever touching line/column positions.
#[derive(Debug, Clone, PartialEq, Eq)]
enum RawContext {
    TagName {
        name: String,
        start: usize,
        end: usize,
    },
    AttributeName {
        owner: String,
        name: String,
        start: usize,
        end: usize,
    },
    AttributeValue {
        owner: String,
        attr: String,
        value: String,
        start: usize,
        end: usize,
    },
    None,
}

impl RawContext {
    fn shift(self, by: usize) -> Self {
        match self {
            RawContext::TagName { name, start, end } => RawContext::TagName {
                name,
                start: start + by,
                end: end + by,
            },
            RawContext::AttributeName {
                owner,
                name,
                start,
                end,
            } => RawContext::AttributeName {
                owner,
                name,
                start: start + by,
                end: end + by,
            },
            RawContext::AttributeValue {
                owner,
                attr,
                value,
                start,
                end,
            } => RawContext::AttributeValue {
                owner,
                attr,
                value,
                start: start + by,
                end: end + by,
            },
            RawContext::None => RawContext::None,
        }
    }
}

fn raw_to_context(content: &str, raw: RawContext) -> SemanticContext {
    match raw {
        RawContext::None => SemanticContext::None,
        RawContext::TagName { name, start, end } => match range_from_bytes(content, start, end) {
            Some(range) => SemanticContext::TagName { name, range },
            None => SemanticContext::None,
        },
        RawContext::AttributeName {
            owner,
            name,
            start,
            end,
        } => match range_from_bytes(content, start, end) {
            Some(range) => SemanticContext::AttributeName { owner, name, range },
            None => SemanticContext::None,
        },
        RawContext::AttributeValue {
            owner,
            attr,
            value,
            start,
            end,
        } => match range_from_bytes(content, start, end) {
            Some(range) => SemanticContext::AttributeValue {
                owner,
                attr,
                value,
                range,
            },
            None => SemanticContext::None,
        },
    }
}

fn is_pure_identifier(text: &str) -> bool {
    !text.is_empty()
        && text
            .chars()
            .all(|c| !c.is_whitespace() && c != '=' && c != '>')
}

fn contains(record: &CaptureRecord, offset: usize) -> bool {
    record.start_byte <= offset && offset <= record.end_byte
}

fn latest_ending_before<'a>(
    records: &'a [&'a CaptureRecord],
    offset: usize,
) -> Option<&'a CaptureRecord> {
    records
        .iter()
        .filter(|r| r.end_byte <= offset)
        .max_by_key(|r| r.end_byte)
        .copied()
}

fn flatten<'a>(maps: &'a [CaptureMap], name: &str) -> Vec<&'a CaptureRecord> {
    maps.iter()
        .flat_map(|m| m.get(name).into_iter().flatten())
        .collect()
}

/// Shared priority-ordered classification for HTML and TSX's
/// `completionContext` captures. TSX's query uses the same capture names
/// for context and adds scored `.completion`-suffixed duplicates, handled
/// separately by [`classify_tsx`].
fn classify_completion_context(content: &str, maps: &[CaptureMap], offset: usize) -> RawContext {
    let tag_names = flatten(maps, "tag.name");
    let attr_names = flatten(maps, "attr.name");
    let attr_values = flatten(maps, "attr.value");

    // 1. Pure-identifier tag name containing the cursor.
    if let Some(record) = tag_names
        .iter()
        .find(|r| contains(r, offset) && is_pure_identifier(&r.text))
    {
        return RawContext::TagName {
            name: record.text.clone(),
            start: record.start_byte,
            end: record.end_byte,
        };
    }

    // 2. Attribute value containing the cursor (guarded against overly
    //    broad ERROR-node captures).
    if let Some(record) = attr_values.iter().find(|r| {
        contains(r, offset) && r.text.matches('<').count() <= 1 && r.text.matches('\n').count() <= 1
    }) {
        let owner = latest_ending_before(&tag_names, offset)
            .map(|r| r.text.clone())
            .unwrap_or_default();
        let attr = latest_ending_before(&attr_names, offset)
            .map(|r| r.text.clone())
            .unwrap_or_default();
        return RawContext::AttributeValue {
            owner,
            attr,
            value: strip_quotes(&record.text).to_string(),
            start: record.start_byte,
            end: record.end_byte,
        };
    }

    // 3. Pure-identifier attribute name containing the cursor.
    if let Some(record) = attr_names
        .iter()
        .find(|r| contains(r, offset) && is_pure_identifier(&r.text))
    {
        let owner = latest_ending_before(&tag_names, record.start_byte)
            .map(|r| r.text.clone())
            .unwrap_or_default();
        return RawContext::AttributeName {
            owner,
            name: record.text.clone(),
            start: record.start_byte,
            end: record.end_byte,
        };
    }

    // 4. Just after a tag name, only whitespace between: attribute-name
    //    completion on that tag.
    if let Some(record) = tag_names.iter().find(|r| {
        offset >= r.end_byte
            && offset.saturating_sub(r.end_byte) <= 3
            && content
                .get(r.end_byte..offset)
                .is_some_and(|s| s.chars().all(char::is_whitespace))
    }) {
        return RawContext::AttributeName {
            owner: record.text.clone(),
            name: String::new(),
            start: offset,
            end: offset,
        };
    }

    // 5. Just after a closing attribute-value quote, only whitespace
    //    between: attribute-name completion.
    if let Some(record) = attr_values.iter().find(|r| {
        offset >= r.end_byte
            && offset.saturating_sub(r.end_byte) <= 5
            && content
                .get(r.end_byte..offset)
                .is_some_and(|s| s.chars().all(char::is_whitespace))
    }) {
        let owner = latest_ending_before(&tag_names, record.start_byte)
            .map(|r| r.text.clone())
            .unwrap_or_default();
        return RawContext::AttributeName {
            owner,
            name: String::new(),
            start: offset,
            end: offset,
        };
    }

    // 6. Fallback: walk backwards to the nearest `<`; if only identifier
    //    characters lie between, this is a partial tag name for prefix
    //    completion.
    if let Some(lt) = content[..offset.min(content.len())].rfind('<') {
        let between = &content[lt + 1..offset.min(content.len())];
        if between.chars().all(|c| c.is_alphanumeric() || c == '-') {
            return RawContext::TagName {
                name: between.to_string(),
                start: lt + 1,
                end: offset,
            };
        }
    }

    RawContext::None
}

fn strip_quotes(text: &str) -> &str {
    let trimmed = text.trim();
    let without_prefix = trimmed
        .strip_prefix('"')
        .or_else(|| trimmed.strip_prefix('\''))
        .unwrap_or(trimmed);
    without_prefix
        .strip_suffix('"')
        .or_else(|| without_prefix.strip_suffix('\''))
        .unwrap_or(without_prefix)
}

/// HTML `completionContext` analysis (§4.4.1).
pub fn analyze_html(content: &str, tree: &Tree, queries: &QueryRegistry, offset: usize) -> SemanticContext {
    let Ok(matcher) = queries.matcher(Language::Html, "completionContext") else {
        return SemanticContext::None;
    };
    let maps = matcher.all_captures(tree, content);
    raw_to_context(content, classify_completion_context(content, &maps, offset))
}

const TSX_SCORE_NAMES: [(&str, i64); 3] = [
    ("tag.name.completion", 10),
    ("attr.name.completion", 20),
    ("attr.value.completion", 30),
];

/// TSX `completionContext` analysis (§4.4.2): every scored capture across
/// every match is a candidate; the lowest score wins.
pub fn analyze_tsx(content: &str, tree: &Tree, queries: &QueryRegistry, offset: usize) -> SemanticContext {
    let Ok(matcher) = queries.matcher(Language::Tsx, "completionContext") else {
        return SemanticContext::None;
    };
    let maps = matcher.all_captures(tree, content);

    let mut best: Option<(i64, &str, &CaptureRecord, &CaptureMap)> = None;
    for map in &maps {
        let breadth_penalty = if map.len() > 2 { 5 * map.len() as i64 } else { 0 };
        for (key, base_score) in TSX_SCORE_NAMES {
            let Some(records) = map.get(key) else { continue };
            for record in records {
                if key == "tag.name.completion" && !record.text.contains('-') {
                    continue;
                }
                let mut score = base_score;
                if contains(record, offset) {
                    score -= 50;
                }
                score += breadth_penalty;
                let len = (record.end_byte.saturating_sub(record.start_byte)) as i64;
                if len > 10 {
                    score += len;
                }
                if best.as_ref().is_none_or(|(b, ..)| score < *b) {
                    best = Some((score, key, record, map));
                }
            }
        }
    }

    let Some((_, key, record, map)) = best else {
        return SemanticContext::None;
    };

    let owner_candidates: Vec<&CaptureRecord> = map
        .get("tag.name.completion")
        .into_iter()
        .flatten()
        .collect();
    let owner = latest_ending_before(&owner_candidates, offset)
        .map(|r| r.text.clone())
        .unwrap_or_default();

    let raw = match key {
        "tag.name.completion" => RawContext::TagName {
            name: record.text.clone(),
            start: record.start_byte,
            end: record.end_byte,
        },
        "attr.name.completion" => RawContext::AttributeName {
            owner,
            name: record.text.clone(),
            start: record.start_byte,
            end: record.end_byte,
        },
        _ => {
            let attr_candidates: Vec<&CaptureRecord> = map
                .get("attr.name.completion")
                .into_iter()
                .flatten()
                .collect();
            RawContext::AttributeValue {
                owner,
                attr: latest_ending_before(&attr_candidates, record.start_byte)
                    .map(|r| r.text.clone())
                    .unwrap_or_default(),
                value: strip_quotes(&record.text).to_string(),
                start: record.start_byte,
                end: record.end_byte,
            }
        }
    };
    raw_to_context(content, raw)
}

/// TypeScript (non-TSX) analysis (§4.4.3): finds the innermost tagged-
/// template-literal (or `innerHTML` assignment) HTML fragment containing
/// the cursor, re-parses it as HTML, and composes the offset back.
pub fn analyze_typescript(
    content: &str,
    tree: &Tree,
    queries: &QueryRegistry,
    offset: usize,
) -> SemanticContext {
    let Ok(matcher) = queries.matcher(Language::TypeScript, "htmlTemplates") else {
        return SemanticContext::None;
    };
    let maps = matcher.all_captures(tree, content);

    let mut innermost: Option<&CaptureRecord> = None;
    for map in &maps {
        let Some(bodies) = map.get("template.body") else {
            continue;
        };
        for body in bodies {
            if contains(body, offset)
                && innermost.is_none_or(|cur| {
                    (body.end_byte - body.start_byte) < (cur.end_byte - cur.start_byte)
                })
            {
                innermost = Some(body);
            }
        }
    }

    let Some(body) = innermost else {
        return SemanticContext::None;
    };
    let Some(sub_content) = content.get(body.start_byte..body.end_byte) else {
        return SemanticContext::None;
    };
    let sub_offset = offset.saturating_sub(body.start_byte);

    let mut parser = tree_sitter::Parser::new();
    if parser
        .set_language(&cem_syntax::tree_sitter_language(Language::Html))
        .is_err()
    {
        return SemanticContext::None;
    }
    let Some(sub_tree) = parser.parse(sub_content, None) else {
        return SemanticContext::None;
    };
    let Ok(html_matcher) = queries.matcher(Language::Html, "completionContext") else {
        return SemanticContext::None;
    };
    let sub_maps = html_matcher.all_captures(&sub_tree, sub_content);
    let raw = classify_completion_context(sub_content, &sub_maps, sub_offset).shift(body.start_byte);
    raw_to_context(content, raw)
}

/// A whole custom-element occurrence found by the `customElements` query,
/// in byte-offset space (so nested-element "innermost wins" comparisons
/// don't need line/column arithmetic).
#[derive(Debug, Clone)]
pub struct ElementAtPosition {
    pub tag_name: String,
    pub tag_range: Range,
    pub attributes: HashMap<String, AttributeAtPosition>,
    start_byte: usize,
    end_byte: usize,
    tag_name_start: usize,
    tag_name_end: usize,
}

impl ElementAtPosition {
    /// The byte offset of the tag-name token, used to deduplicate the same
    /// occurrence surfaced via two different captures (e.g. a start tag
    /// re-walked inside a template literal).
    pub fn start_byte(&self) -> usize {
        self.start_byte
    }

    /// The byte offset just past the element's closing tag (or past the
    /// start tag for void/self-closing elements), used for containment
    /// checks such as locating the custom element that owns a nested
    /// `slot` attribute.
    pub fn end_byte(&self) -> usize {
        self.end_byte
    }

    /// Re-bases an element found against a template literal's extracted
    /// substring back onto the outer document, by shifting every byte
    /// offset by `by` and recomputing ranges against `outer_content`.
    fn rebase(self, outer_content: &str, by: usize) -> Option<Self> {
        let tag_range = range_from_bytes(
            outer_content,
            self.tag_name_start + by,
            self.tag_name_end + by,
        )?;
        let attributes = self
            .attributes
            .into_iter()
            .filter_map(|(name, attr)| Some((name, attr.rebase(outer_content, by)?)))
            .collect();
        Some(ElementAtPosition {
            tag_name: self.tag_name,
            tag_range,
            attributes,
            start_byte: self.start_byte + by,
            end_byte: self.end_byte + by,
            tag_name_start: self.tag_name_start + by,
            tag_name_end: self.tag_name_end + by,
        })
    }
}

#[derive(Debug, Clone)]
pub struct AttributeAtPosition {
    pub name: String,
    pub name_range: Range,
    pub value: Option<String>,
    pub value_range: Option<Range>,
    name_start: usize,
    name_end: usize,
    value_start: Option<usize>,
    value_end: Option<usize>,
}

impl AttributeAtPosition {
    fn rebase(self, outer_content: &str, by: usize) -> Option<Self> {
        let name_range = range_from_bytes(outer_content, self.name_start + by, self.name_end + by)?;
        let value_range = match (self.value_start, self.value_end) {
            (Some(s), Some(e)) => range_from_bytes(outer_content, s + by, e + by),
            _ => None,
        };
        Some(AttributeAtPosition {
            name: self.name,
            name_range,
            value: self.value,
            value_range,
            name_start: self.name_start + by,
            name_end: self.name_end + by,
            value_start: self.value_start.map(|v| v + by),
            value_end: self.value_end.map(|v| v + by),
        })
    }
}

fn associate_attributes(
    content: &str,
    names: &[&CaptureRecord],
    values: &[&CaptureRecord],
) -> HashMap<String, AttributeAtPosition> {
    let mut used = vec![false; values.len()];
    let mut sorted_names = names.to_vec();
    sorted_names.sort_by_key(|r| r.start_byte);

    let mut out = HashMap::new();
    for name in sorted_names {
        let mut best: Option<(usize, i64)> = None;
        for (i, value) in values.iter().enumerate() {
            if used[i] {
                continue;
            }
            let distance = value.start_byte as i64 - name.end_byte as i64;
            if distance > 0 && best.is_none_or(|(_, best_distance)| distance < best_distance) {
                best = Some((i, distance));
            }
        }

        let (value_text, value_start, value_end, value_range) = if let Some((i, _)) = best {
            used[i] = true;
            let record = values[i];
            (
                Some(strip_quotes(&record.text).to_string()),
                Some(record.start_byte),
                Some(record.end_byte),
                range_from_bytes(content, record.start_byte, record.end_byte),
            )
        } else {
            (None, None, None, None)
        };

        let Some(name_range) = range_from_bytes(content, name.start_byte, name.end_byte) else {
            continue;
        };
        out.insert(
            name.text.clone(),
            AttributeAtPosition {
                name: name.text.clone(),
                name_range,
                value: value_text,
                value_range,
                name_start: name.start_byte,
                name_end: name.end_byte,
                value_start,
                value_end,
            },
        );
    }
    out
}

/// Returns every custom-element instance the `customElements` query finds
/// in `tree`, in document order. Shared by hover/references/diagnostics —
/// each handler filters or resolves the subset it needs.
pub fn find_elements(
    content: &str,
    tree: &Tree,
    queries: &QueryRegistry,
    language: Language,
) -> Vec<ElementAtPosition> {
    let Ok(matcher) = queries.matcher(language, "customElements") else {
        return Vec::new();
    };
    let maps = matcher.all_captures(tree, content);

    maps.iter()
        .filter_map(|map| {
            let element = map.get("element")?.first()?;
            let tag_name = map.get("tag.name")?.first()?;
            let names: Vec<&CaptureRecord> = map.get("attr.name").into_iter().flatten().collect();
            let values: Vec<&CaptureRecord> = map.get("attr.value").into_iter().flatten().collect();
            let attributes = associate_attributes(content, &names, &values);
            let tag_range = range_from_bytes(content, tag_name.start_byte, tag_name.end_byte)?;
            Some(ElementAtPosition {
                tag_name: tag_name.text.clone(),
                tag_range,
                attributes,
                start_byte: element.start_byte,
                end_byte: element.end_byte,
                tag_name_start: tag_name.start_byte,
                tag_name_end: tag_name.end_byte,
            })
        })
        .collect()
}

/// Walks every tagged-template-literal (or `innerHTML`-assignment) HTML
/// fragment in a TypeScript/JavaScript document, re-parses each as HTML,
/// and returns every custom-element instance found inside, rebased onto
/// the outer document's byte offsets. Used by diagnostics and references,
/// which (unlike the cursor-based completion analyzer) need every
/// occurrence rather than just the one nearest the cursor.
pub fn find_elements_in_templates(
    content: &str,
    tree: &Tree,
    queries: &QueryRegistry,
) -> Vec<ElementAtPosition> {
    let Ok(matcher) = queries.matcher(Language::TypeScript, "htmlTemplates") else {
        return Vec::new();
    };
    let maps = matcher.all_captures(tree, content);
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();

    for map in &maps {
        let Some(bodies) = map.get("template.body") else {
            continue;
        };
        for body in bodies {
            if !seen.insert(body.start_byte) {
                continue;
            }
            let Some(sub_content) = content.get(body.start_byte..body.end_byte) else {
                continue;
            };
            let mut parser = tree_sitter::Parser::new();
            if parser
                .set_language(&cem_syntax::tree_sitter_language(Language::Html))
                .is_err()
            {
                continue;
            }
            let Some(sub_tree) = parser.parse(sub_content, None) else {
                continue;
            };
            for element in find_elements(sub_content, &sub_tree, queries, Language::Html) {
                if let Some(rebased) = element.rebase(content, body.start_byte) {
                    out.push(rebased);
                }
            }
        }
    }
    out
}

/// Returns the smallest element whose range contains `offset` — the
/// innermost wins for nested custom elements (§4.4.4).
pub fn find_element_at_position(
    content: &str,
    tree: &Tree,
    queries: &QueryRegistry,
    language: Language,
    offset: usize,
) -> Option<ElementAtPosition> {
    find_elements(content, tree, queries, language)
        .into_iter()
        .filter(|el| el.start_byte <= offset && offset <= el.end_byte)
        .min_by_key(|el| el.end_byte - el.start_byte)
}

/// Returns the attribute (name or value) whose range contains `offset`,
/// along with the tag name of its owning element. Innermost element wins.
pub fn find_attribute_at_position(
    content: &str,
    tree: &Tree,
    queries: &QueryRegistry,
    language: Language,
    offset: usize,
) -> Option<(String, AttributeAtPosition)> {
    let mut elements = find_elements(content, tree, queries, language);
    elements.sort_by_key(|el| el.end_byte - el.start_byte);
    for element in elements {
        for attribute in element.attributes.into_values() {
            let in_name = attribute.name_start <= offset && offset <= attribute.name_end;
            let in_value = attribute
                .value_start
                .zip(attribute.value_end)
                .is_some_and(|(s, e)| s <= offset && offset <= e);
            if in_name || in_value {
                return Some((element.tag_name.clone(), attribute));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use cem_syntax::ParserPool;

    fn parse_html(text: &str) -> Tree {
        let pool = ParserPool::new();
        let mut parser = pool.checkout(Language::Html);
        parser.parse(text, None).unwrap()
    }

    #[test]
    fn test_tag_name_completion_context() {
        let content = "<my-c";
        let tree = parse_html(content);
        let queries = QueryRegistry::new();
        match analyze_html(content, &tree, &queries, 5) {
            SemanticContext::TagName { name, .. } => assert_eq!(name, "my-c"),
            other => panic!("expected TagName, got {other:?}"),
        }
    }

    #[test]
    fn test_attribute_value_completion_context() {
        let content = r#"<my-card variant="p"></my-card>"#;
        let tree = parse_html(content);
        let queries = QueryRegistry::new();
        let offset = content.find('p').unwrap() + 1;
        match analyze_html(content, &tree, &queries, offset) {
            SemanticContext::AttributeValue { owner, attr, .. } => {
                assert_eq!(owner, "my-card");
                assert_eq!(attr, "variant");
            }
            other => panic!("expected AttributeValue, got {other:?}"),
        }
    }

    #[test]
    fn test_find_element_at_position_resolves_attributes() {
        let content = r#"<my-card variant="primary"></my-card>"#;
        let tree = parse_html(content);
        let queries = QueryRegistry::new();
        let offset = content.find("my-card").unwrap() + 2;
        let element = find_element_at_position(content, &tree, &queries, Language::Html, offset)
            .expect("element expected");
        assert_eq!(element.tag_name, "my-card");
        assert!(element.attributes.contains_key("variant"));
        assert_eq!(
            element.attributes["variant"].value.as_deref(),
            Some("primary")
        );
    }

    #[test]
    fn test_nested_elements_innermost_wins() {
        let content = "<my-outer><my-inner></my-inner></my-outer>";
        let tree = parse_html(content);
        let queries = QueryRegistry::new();
        let offset = content.find("my-inner").unwrap() + 2;
        let element = find_element_at_position(content, &tree, &queries, Language::Html, offset)
            .expect("element expected");
        assert_eq!(element.tag_name, "my-inner");
    }

    fn parse_ts(text: &str) -> Tree {
        let pool = ParserPool::new();
        let mut parser = pool.checkout(Language::TypeScript);
        parser.parse(text, None).unwrap()
    }

    #[test]
    fn test_find_elements_in_templates_rebases_offsets() {
        let content = r#"const view = html`<my-card variant="primary"></my-card>`;"#;
        let tree = parse_ts(content);
        let queries = QueryRegistry::new();
        let elements = find_elements_in_templates(content, &tree, &queries);
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].tag_name, "my-card");
        let tag_offset = content.find("my-card").unwrap();
        assert_eq!(
            elements[0].tag_range.start,
            cem_core::position::position_at_offset(content, tag_offset).unwrap()
        );
        assert_eq!(
            elements[0].attributes["variant"].value.as_deref(),
            Some("primary")
        );
    }
}
