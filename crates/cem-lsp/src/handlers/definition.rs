//! Go-to-definition handler implementation (§4.5.6).
//!
//! Resolves a custom-element tag to the declaration site of the class that
//! defines it, following the Registry's `modulePath` to the owning file and
//! then narrowing to the exact decorator or class-name token inside it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tower_lsp_server::ls_types::{
    GotoDefinitionParams, GotoDefinitionResponse, Location, Position, Range, Uri,
};

use cem_core::position::{offset_at_position, range_from_bytes};
use cem_core::Language;
use cem_syntax::ParserPool;

use crate::semantic::find_element_at_position;
use crate::state::AppState;

pub async fn handle_definition(
    state: Arc<AppState>,
    params: GotoDefinitionParams,
) -> Option<GotoDefinitionResponse> {
    let uri = params.text_document_position_params.text_document.uri;
    let position = params.text_document_position_params.position;

    let document = state.documents.ensure_document_loaded(&uri, true).await?;
    let language = document.language();
    let offset = offset_at_position(&document.content(), position)?;
    let tag_name = document.with_tree(|content, tree| {
        let tree = tree?;
        find_element_at_position(content, tree, state.documents.queries(), language, offset)
            .map(|el| el.tag_name)
    })?;

    let definition = state.registry.element(&tag_name)?;
    if definition.module_path.is_empty() {
        return None;
    }

    let target_path = resolve_module_path(&state.workspace_root, &definition.module_path)?;
    let target_uri = Uri::from_file_path(&target_path)?;
    let content = tokio::fs::read_to_string(&target_path).await.ok()?;

    let range = locate_declaration(&content, &tag_name, &definition.class_name, &target_path)
        .unwrap_or(Range {
            start: Position::new(0, 0),
            end: Position::new(0, 0),
        });

    Some(GotoDefinitionResponse::Scalar(Location {
        uri: target_uri,
        range,
    }))
}

/// Resolves `modulePath` relative to the workspace root. Already-absolute
/// paths and `file://` URIs are used as-is.
pub(crate) fn resolve_module_path(workspace_root: &Path, module_path: &str) -> Option<PathBuf> {
    if let Some(stripped) = module_path.strip_prefix("file://") {
        return Some(PathBuf::from(stripped));
    }
    let path = Path::new(module_path);
    if path.is_absolute() {
        Some(path.to_path_buf())
    } else {
        Some(workspace_root.join(path))
    }
}

/// Finds the best location for `tag_name`/`class_name` inside the target
/// module's source: a `@customElement('tag')` decorator string literal
/// first, then a `customElements.define('tag', Class)` call's class
/// reference, then the plain class declaration.
pub(crate) fn locate_declaration(
    content: &str,
    tag_name: &str,
    class_name: &str,
    _target_path: &Path,
) -> Option<Range> {
    // The `classes` query is only compiled for the TypeScript grammar
    // (decorator/class syntax doesn't need JSX support), so class
    // declarations are located with it regardless of the target file's
    // extension.
    let pool = ParserPool::new();
    let mut parser = pool.checkout(Language::TypeScript);
    let tree = parser.parse(content, None)?;

    let queries = cem_syntax::QueryRegistry::new();
    let matcher = queries.matcher(Language::TypeScript, "classes").ok()?;
    let maps = matcher.all_captures(&tree, content);

    for map in &maps {
        if let Some(decorator) = map.get("tag.name.decorator").and_then(|r| r.first()) {
            if decorator.text == tag_name {
                return range_from_bytes(content, decorator.start_byte, decorator.end_byte);
            }
        }
    }

    let mut defined_class = None;
    for map in &maps {
        let Some(literal) = map.get("tag.name.literal").and_then(|r| r.first()) else {
            continue;
        };
        if strip_quotes(&literal.text) == tag_name {
            if let Some(class_ref) = map.get("class.name.ref").and_then(|r| r.first()) {
                defined_class = Some(class_ref.text.clone());
            }
        }
    }

    let target_class_name = defined_class.as_deref().unwrap_or(class_name);
    for map in &maps {
        if let Some(name) = map.get("class.name").and_then(|r| r.first()) {
            if name.text == target_class_name {
                return range_from_bytes(content, name.start_byte, name.end_byte);
            }
        }
        if let Some(name) = map.get("class.name.decorated").and_then(|r| r.first()) {
            if name.text == target_class_name {
                return range_from_bytes(content, name.start_byte, name.end_byte);
            }
        }
    }

    None
}

fn strip_quotes(text: &str) -> &str {
    text.trim_matches(|c| c == '"' || c == '\'')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locate_declaration_finds_decorator_literal() {
        let content = r#"
@customElement('my-card')
class MyCard extends HTMLElement {}
"#;
        let range = locate_declaration(content, "my-card", "MyCard", Path::new("my-card.ts"))
            .expect("decorator location expected");
        let text = &content[cem_core::position::offset_at_position(content, range.start).unwrap()
            ..cem_core::position::offset_at_position(content, range.end).unwrap()];
        assert_eq!(text, "my-card");
    }

    #[test]
    fn test_locate_declaration_falls_back_to_class_name() {
        let content = "class MyCard extends HTMLElement {}\n";
        let range = locate_declaration(content, "my-card", "MyCard", Path::new("my-card.ts"))
            .expect("class name location expected");
        let text = &content[cem_core::position::offset_at_position(content, range.start).unwrap()
            ..cem_core::position::offset_at_position(content, range.end).unwrap()];
        assert_eq!(text, "MyCard");
    }

    #[test]
    fn test_locate_declaration_resolves_via_define_call() {
        let content = "class MyCard extends HTMLElement {}\ncustomElements.define('my-card', MyCard);\n";
        let range = locate_declaration(content, "my-card", "SomeOtherName", Path::new("my-card.ts"))
            .expect("define-call location expected");
        let text = &content[cem_core::position::offset_at_position(content, range.start).unwrap()
            ..cem_core::position::offset_at_position(content, range.end).unwrap()];
        assert_eq!(text, "MyCard");
    }

    #[test]
    fn test_resolve_module_path_relative() {
        let workspace = Path::new("/workspace");
        assert_eq!(
            resolve_module_path(workspace, "./my-card.js"),
            Some(PathBuf::from("/workspace/my-card.js"))
        );
    }

    #[test]
    fn test_resolve_module_path_absolute_unchanged() {
        let workspace = Path::new("/workspace");
        assert_eq!(
            resolve_module_path(workspace, "/pkg/my-card.js"),
            Some(PathBuf::from("/pkg/my-card.js"))
        );
    }
}
