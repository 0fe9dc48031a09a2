//! References handler implementation (§4.5.5).
//!
//! Finds every occurrence of a custom-element tag name across the open
//! documents and the workspace's on-disk `.html/.htm/.ts/.js` files,
//! honoring `.gitignore`. Start tags only, per the duplicate-capture Open
//! Question decision recorded in DESIGN.md.

use std::path::Path;
use std::sync::Arc;

use ignore::WalkBuilder;
use tower_lsp_server::ls_types::{Location, ReferenceParams, Uri};

use cem_core::position::offset_at_position;
use cem_core::Language;
use cem_syntax::ParserPool;

use crate::semantic::{find_element_at_position, find_elements, find_elements_in_templates};
use crate::state::AppState;

const REFERENCE_EXTENSIONS: &[&str] = &["html", "htm", "ts", "js"];

pub async fn handle_references(state: Arc<AppState>, params: ReferenceParams) -> Vec<Location> {
    let uri = params.text_document_position.text_document.uri;
    let position = params.text_document_position.position;

    let Some(tag_name) = tag_name_at(&state, &uri, position).await else {
        return Vec::new();
    };

    let mut locations = Vec::new();

    for document in state.documents.all_documents() {
        let language = document.language();
        document.with_tree(|content, tree| {
            let Some(tree) = tree else { return };
            for element in elements_for(content, tree, language, state.documents.queries()) {
                if element.tag_name == tag_name {
                    locations.push(Location {
                        uri: document.uri().clone(),
                        range: element.tag_range,
                    });
                }
            }
        });
    }

    let open_paths: std::collections::HashSet<std::path::PathBuf> = state
        .documents
        .all_documents()
        .iter()
        .filter_map(|doc| doc.uri().to_file_path().map(|p| p.into_owned()))
        .collect();

    locations.extend(scan_workspace_files(&state.workspace_root, &open_paths, &tag_name).await);

    locations
}

async fn tag_name_at(state: &AppState, uri: &Uri, position: tower_lsp_server::ls_types::Position) -> Option<String> {
    let document = state.documents.ensure_document_loaded(uri, true).await?;
    let language = document.language();
    let offset = offset_at_position(&document.content(), position)?;
    document.with_tree(|content, tree| {
        let tree = tree?;
        find_element_at_position(content, tree, state.documents.queries(), language, offset)
            .map(|el| el.tag_name)
    })
}

fn elements_for(
    content: &str,
    tree: &tree_sitter::Tree,
    language: Language,
    queries: &cem_syntax::QueryRegistry,
) -> Vec<crate::semantic::ElementAtPosition> {
    match language {
        Language::Html | Language::Tsx => find_elements(content, tree, queries, language),
        Language::TypeScript => {
            let mut elements = find_elements(content, tree, queries, language);
            elements.extend(find_elements_in_templates(content, tree, queries));
            elements
        }
    }
}

async fn scan_workspace_files(
    workspace_root: &Path,
    skip_paths: &std::collections::HashSet<std::path::PathBuf>,
    tag_name: &str,
) -> Vec<Location> {
    let mut locations = Vec::new();
    let queries = cem_syntax::QueryRegistry::new();
    let parsers = ParserPool::new();

    let mut walker = WalkBuilder::new(workspace_root);
    walker.filter_entry(|entry| entry.file_name() != ".git");

    for entry in walker.build().flatten() {
        let path = entry.path();
        if skip_paths.contains(path) {
            continue;
        }
        let Some(extension) = path.extension().and_then(|e| e.to_str()) else {
            continue;
        };
        if !REFERENCE_EXTENSIONS.contains(&extension) {
            continue;
        }
        let Some(language) = Language::from_path(&path.to_string_lossy()) else {
            continue;
        };
        let Ok(content) = tokio::fs::read_to_string(path).await else {
            continue;
        };
        let Some(file_uri) = Uri::from_file_path(path) else {
            continue;
        };

        let mut parser = parsers.checkout(language);
        let Some(tree) = parser.parse(&content, None) else {
            continue;
        };

        for element in elements_for(&content, &tree, language, &queries) {
            if element.tag_name == tag_name {
                locations.push(Location {
                    uri: file_uri.clone(),
                    range: element.tag_range,
                });
            }
        }
    }

    locations
}
