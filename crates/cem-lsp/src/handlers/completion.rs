//! Completion handler implementation (§4.5.2).
//!
//! Dispatches on the Semantic Analyzer's classification of the cursor
//! position: tag names complete from the Registry, attribute names
//! complete from the owning tag's schema, and attribute values complete
//! from an enumerated type or the `true`/`false` pair for booleans.

use std::sync::Arc;

use tower_lsp_server::ls_types::{
    CompletionItem, CompletionItemKind, CompletionParams, CompletionResponse,
};

use cem_core::position::offset_at_position;

use crate::config::CompletionConfig;
use crate::semantic::SemanticContext;
use crate::state::AppState;

pub async fn handle_completion(
    state: Arc<AppState>,
    params: CompletionParams,
    config: &CompletionConfig,
) -> Option<CompletionResponse> {
    if !config.enabled {
        return None;
    }

    let uri = params.text_document_position.text_document.uri;
    let position = params.text_document_position.position;
    let document = state.documents.ensure_document_loaded(&uri, true).await?;
    let offset = offset_at_position(&document.content(), position)?;
    let context = state.documents.analyze(&document, offset);

    let items = match context {
        SemanticContext::TagName { name, .. } => tag_name_items(&state, &name),
        SemanticContext::AttributeName { owner, name, .. } => {
            attribute_name_items(&state, &owner, &name)
        }
        SemanticContext::AttributeValue { owner, attr, value, .. } => {
            attribute_value_items(&state, &owner, &attr, &value)
        }
        SemanticContext::None => Vec::new(),
    };

    let items: Vec<CompletionItem> = items.into_iter().take(config.max_items).collect();
    if items.is_empty() {
        None
    } else {
        Some(CompletionResponse::Array(items))
    }
}

fn tag_name_items(state: &AppState, prefix: &str) -> Vec<CompletionItem> {
    state
        .registry
        .tag_names()
        .into_iter()
        .filter(|tag| tag.starts_with(prefix))
        .filter_map(|tag| {
            let definition = state.registry.element(&tag)?;
            Some(CompletionItem {
                label: tag,
                kind: Some(CompletionItemKind::CLASS),
                detail: definition.description.clone(),
                ..Default::default()
            })
        })
        .collect()
}

fn attribute_name_items(state: &AppState, owner: &str, prefix: &str) -> Vec<CompletionItem> {
    let Some(attributes) = state.registry.attributes(owner) else {
        return Vec::new();
    };
    attributes
        .into_values()
        .filter(|attr| attr.name.starts_with(prefix))
        .map(|attr| CompletionItem {
            label: attr.name.clone(),
            kind: Some(CompletionItemKind::PROPERTY),
            detail: attr.description.clone(),
            ..Default::default()
        })
        .collect()
}

fn attribute_value_items(
    state: &AppState,
    owner: &str,
    attr_name: &str,
    prefix: &str,
) -> Vec<CompletionItem> {
    let Some(definition) = state.registry.element(owner) else {
        return Vec::new();
    };
    let Some(attr) = definition.attribute(attr_name) else {
        return Vec::new();
    };

    let enum_values = attr.r#type.enum_values();
    let candidates: Vec<String> = if !enum_values.is_empty() {
        enum_values
    } else if attr.r#type.is_boolean() {
        vec!["true".to_string(), "false".to_string()]
    } else {
        Vec::new()
    };

    candidates
        .into_iter()
        .filter(|value| value.starts_with(prefix))
        .map(|value| CompletionItem {
            label: value,
            kind: Some(CompletionItemKind::VALUE),
            ..Default::default()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use tower_lsp_server::ls_types::{
        Position, TextDocumentIdentifier, TextDocumentPositionParams, Uri,
    };

    fn uri(s: &str) -> Uri {
        Uri::from_str(s).unwrap()
    }

    fn state_with_manifest() -> (tempfile::TempDir, AppState) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("custom-elements.json"),
            r#"{"modules":[{"path":"my-card.js","declarations":[{
                "kind":"class","name":"MyCard","tagName":"my-card",
                "description":"A card",
                "attributes":[{"name":"variant","type":{"text":"'primary'|'secondary'"}}]
            }]}]}"#,
        )
        .unwrap();
        let state = AppState::new(dir.path().to_path_buf(), Vec::new());
        state.registry.reload().unwrap();
        (dir, state)
    }

    fn completion_params(uri: Uri, position: Position) -> CompletionParams {
        CompletionParams {
            text_document_position: TextDocumentPositionParams {
                text_document: TextDocumentIdentifier { uri },
                position,
            },
            work_done_progress_params: Default::default(),
            partial_result_params: Default::default(),
            context: None,
        }
    }

    #[tokio::test]
    async fn test_tag_name_completion_includes_description() {
        let (_dir, state) = state_with_manifest();
        let state = Arc::new(state);
        let u = uri("file:///test.html");
        state.documents.open(u.clone(), "<my-c".into(), 1).unwrap();
        let response = handle_completion(
            Arc::clone(&state),
            completion_params(u, Position::new(0, 5)),
            &CompletionConfig::default(),
        )
        .await
        .expect("completion expected");
        let CompletionResponse::Array(items) = response else {
            panic!("expected array response");
        };
        assert!(items.iter().any(|i| i.label == "my-card"));
        assert_eq!(
            items.iter().find(|i| i.label == "my-card").unwrap().detail.as_deref(),
            Some("A card")
        );
    }

    #[tokio::test]
    async fn test_attribute_value_completion_lists_enum() {
        let (_dir, state) = state_with_manifest();
        let state = Arc::new(state);
        let u = uri("file:///test.html");
        let text = r#"<my-card variant="p"></my-card>"#;
        state.documents.open(u.clone(), text.into(), 1).unwrap();
        let offset = text.find('p').unwrap() + 1;
        let position = cem_core::position::position_at_offset(text, offset).unwrap();
        let response = handle_completion(
            Arc::clone(&state),
            completion_params(u, position),
            &CompletionConfig::default(),
        )
        .await
        .expect("completion expected");
        let CompletionResponse::Array(items) = response else {
            panic!("expected array response");
        };
        assert!(items.iter().any(|i| i.label == "primary"));
    }

    #[tokio::test]
    async fn test_completion_disabled_returns_none() {
        let (_dir, state) = state_with_manifest();
        let state = Arc::new(state);
        let u = uri("file:///test.html");
        state.documents.open(u.clone(), "<my-c".into(), 1).unwrap();
        let mut config = CompletionConfig::default();
        config.enabled = false;
        let response =
            handle_completion(Arc::clone(&state), completion_params(u, Position::new(0, 5)), &config)
                .await;
        assert!(response.is_none());
    }
}
