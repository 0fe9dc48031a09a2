//! Workspace symbol handler implementation (§4.5.7).
//!
//! Returns one `SymbolInformation` per Element Definition in the Registry,
//! located at its declaring class (falling back to the start of its
//! module file when the declaration can't be pinpointed), plus a
//! synthetic entry per tag name the last reload reported as a duplicate so
//! editor symbol search surfaces the conflict even though it isn't a
//! diagnostic against any single open document.

// `SymbolInformation::deprecated` is marked deprecated upstream in favor of
// `tags`, but the field is still part of the wire type we must populate.
#![allow(deprecated)]

use std::sync::Arc;

use tower_lsp_server::ls_types::{
    Location, Position, Range, SymbolInformation, SymbolKind, Uri, WorkspaceSymbolParams,
};

use crate::handlers::definition::{locate_declaration, resolve_module_path};
use crate::state::AppState;

pub async fn handle_workspace_symbol(
    state: Arc<AppState>,
    params: WorkspaceSymbolParams,
) -> Vec<SymbolInformation> {
    let query = params.query.to_lowercase();
    let mut symbols = Vec::new();

    for tag_name in state.registry.tag_names() {
        if !query.is_empty() && !tag_name.contains(&query) {
            continue;
        }
        let Some(definition) = state.registry.element(&tag_name) else {
            continue;
        };
        let location = element_location(&state, &tag_name, &definition.class_name, &definition.module_path).await;
        symbols.push(symbol(tag_name, location));
    }

    let report = state.registry.last_reload_report();
    for tag_name in report.duplicate_tags {
        if !query.is_empty() && !tag_name.to_lowercase().contains(&query) {
            continue;
        }
        let location = Location {
            uri: Uri::from_file_path(&state.workspace_root).unwrap_or_else(placeholder_uri),
            range: zero_range(),
        };
        symbols.push(SymbolInformation {
            name: format!("{tag_name} (duplicate tag definition)"),
            kind: SymbolKind::CLASS,
            tags: None,
            deprecated: None,
            location,
            container_name: None,
        });
    }

    symbols
}

async fn element_location(
    state: &AppState,
    tag_name: &str,
    class_name: &str,
    module_path: &str,
) -> Location {
    let fallback = Location {
        uri: Uri::from_file_path(&state.workspace_root).unwrap_or_else(placeholder_uri),
        range: zero_range(),
    };

    let Some(target_path) = resolve_module_path(&state.workspace_root, module_path) else {
        return fallback;
    };
    let Some(uri) = Uri::from_file_path(&target_path) else {
        return fallback;
    };
    let Ok(content) = tokio::fs::read_to_string(&target_path).await else {
        return Location {
            uri,
            range: zero_range(),
        };
    };

    let range = locate_declaration(&content, tag_name, class_name, &target_path).unwrap_or_else(zero_range);
    Location { uri, range }
}

fn symbol(tag_name: String, location: Location) -> SymbolInformation {
    SymbolInformation {
        name: tag_name,
        kind: SymbolKind::CLASS,
        tags: None,
        deprecated: None,
        location,
        container_name: None,
    }
}

fn zero_range() -> Range {
    Range {
        start: Position::new(0, 0),
        end: Position::new(0, 0),
    }
}

fn placeholder_uri() -> Uri {
    Uri::from_file_path("/").expect("root path is always a valid file URI")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with_card() -> (tempfile::TempDir, AppState) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("custom-elements.json"),
            r#"{"modules":[{"path":"my-card.js","declarations":[{
                "kind":"class","name":"MyCard","tagName":"my-card"
            }]}]}"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("my-card.js"),
            "class MyCard extends HTMLElement {}\ncustomElements.define('my-card', MyCard);\n",
        )
        .unwrap();
        let state = AppState::new(dir.path().to_path_buf(), Vec::new());
        state.registry.reload().unwrap();
        (dir, state)
    }

    #[tokio::test]
    async fn test_workspace_symbol_filters_by_query() {
        let (_dir, state) = state_with_card();
        let state = Arc::new(state);
        let symbols = handle_workspace_symbol(
            Arc::clone(&state),
            WorkspaceSymbolParams {
                query: "card".into(),
                work_done_progress_params: Default::default(),
                partial_result_params: Default::default(),
            },
        )
        .await;
        assert!(symbols.iter().any(|s| s.name == "my-card"));
    }

    #[tokio::test]
    async fn test_workspace_symbol_excludes_non_matching_query() {
        let (_dir, state) = state_with_card();
        let state = Arc::new(state);
        let symbols = handle_workspace_symbol(
            Arc::clone(&state),
            WorkspaceSymbolParams {
                query: "unrelated".into(),
                work_done_progress_params: Default::default(),
                partial_result_params: Default::default(),
            },
        )
        .await;
        assert!(symbols.is_empty());
    }

    #[tokio::test]
    async fn test_workspace_symbol_surfaces_duplicate_tags() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("a")).unwrap();
        std::fs::create_dir_all(dir.path().join("b")).unwrap();
        std::fs::write(
            dir.path().join("a").join("custom-elements.json"),
            r#"{"modules":[{"path":"a.js","declarations":[{"kind":"class","name":"A","tagName":"my-card"}]}]}"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("b").join("custom-elements.json"),
            r#"{"modules":[{"path":"b.js","declarations":[{"kind":"class","name":"B","tagName":"my-card"}]}]}"#,
        )
        .unwrap();
        let state = Arc::new(AppState::new(dir.path().to_path_buf(), Vec::new()));
        state.registry.reload().unwrap();
        let symbols = handle_workspace_symbol(
            Arc::clone(&state),
            WorkspaceSymbolParams {
                query: String::new(),
                work_done_progress_params: Default::default(),
                partial_result_params: Default::default(),
            },
        )
        .await;
        assert!(symbols.iter().any(|s| s.name.contains("duplicate tag definition")));
    }
}
