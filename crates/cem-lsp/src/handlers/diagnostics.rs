//! Diagnostics handler implementation (§4.5.3).
//!
//! Runs on every `didOpen`/`didChange`, walking every custom-element
//! instance the Semantic Analyzer's element finder surfaces (including
//! ones nested inside TypeScript tagged-template-literal HTML fragments)
//! and reporting unknown tags, unknown attributes, invalid enumerated
//! attribute values, and invalid slot names — each with an autofix
//! `data` payload when a close match exists.

use std::sync::Arc;

use tower_lsp_server::ls_types::{Diagnostic, DiagnosticSeverity, Uri};

use cem_core::autofix::{closest_match, AutofixData, AutofixKind};
use cem_core::{is_common_attribute, ElementDefinition, Language};
use cem_syntax::scan_import_specifiers;

use crate::config::DiagnosticsConfig;
use crate::document::Document;
use crate::semantic::{find_elements, find_elements_in_templates, AttributeAtPosition, ElementAtPosition};
use crate::state::AppState;

pub async fn handle_diagnostics(
    state: Arc<AppState>,
    uri: &Uri,
    config: &DiagnosticsConfig,
) -> Vec<Diagnostic> {
    let Some(document) = state.documents.ensure_document_loaded(uri, true).await else {
        return Vec::new();
    };

    let language = document.language();
    let imports = document_imports(&document, language);

    document.with_tree(|content, tree| {
        let Some(tree) = tree else {
            return Vec::new();
        };
        let queries = state.documents.queries();
        let mut elements = find_elements(content, tree, queries, language);
        if language == Language::TypeScript {
            elements.extend(find_elements_in_templates(content, tree, queries));
        }

        let mut diagnostics = Vec::new();
        for element in &elements {
            diagnose_element(&state, element, &elements, &imports, config, &mut diagnostics);
        }
        diagnostics
    })
}

/// Import specifiers the document already covers, gathered from inline
/// `<script>` bodies (HTML) or top-level `import`/`require` statements
/// (TypeScript/JavaScript).
fn document_imports(document: &Document, language: Language) -> Vec<String> {
    match language {
        Language::Html => document
            .script_tags()
            .into_iter()
            .flat_map(|tag| tag.imports)
            .collect(),
        Language::TypeScript | Language::Tsx => scan_import_specifiers(&document.content()),
    }
}

fn imports_cover(imports: &[String], definition: &ElementDefinition) -> bool {
    let import_path = definition.import_path();
    let bare = definition.module_path.as_str();
    imports
        .iter()
        .any(|specifier| specifier == &import_path || specifier == bare)
}

fn diagnose_element(
    state: &AppState,
    element: &ElementAtPosition,
    all_elements: &[ElementAtPosition],
    imports: &[String],
    config: &DiagnosticsConfig,
    out: &mut Vec<Diagnostic>,
) {
    if !element.tag_name.contains('-') {
        diagnose_slot_child(state, element, all_elements, config, out);
        return;
    }

    let Some(definition) = state.registry.element(&element.tag_name) else {
        diagnose_unknown_tag(state, element, config, out);
        return;
    };

    diagnose_missing_import(element, &definition, imports, out);

    for attribute in element.attributes.values() {
        diagnose_attribute(&definition, attribute, config, out);
    }

    diagnose_slot_child(state, element, all_elements, config, out);
}

/// A tag the Registry knows about, but whose owning module isn't covered by
/// any import in this document (§4.5.3's "known in the Registry but not
/// imported" case).
fn diagnose_missing_import(
    element: &ElementAtPosition,
    definition: &ElementDefinition,
    imports: &[String],
    out: &mut Vec<Diagnostic>,
) {
    if imports_cover(imports, definition) {
        return;
    }

    let data = AutofixData::missing_import(&element.tag_name, &definition.import_path(), element.tag_range);
    out.push(Diagnostic {
        range: element.tag_range,
        severity: Some(DiagnosticSeverity::WARNING),
        source: Some("cem-lsp".into()),
        message: format!(
            "'{}' is not imported in this file (expected from '{}')",
            element.tag_name,
            definition.import_path()
        ),
        data: Some(data.to_json()),
        ..Default::default()
    });
}

fn diagnose_unknown_tag(
    state: &AppState,
    element: &ElementAtPosition,
    config: &DiagnosticsConfig,
    out: &mut Vec<Diagnostic>,
) {
    let known_tags = state.registry.tag_names();
    let tag_suggestion = closest_match(
        &element.tag_name,
        known_tags.iter().map(String::as_str),
        config.tag_suggestion_distance,
    );

    if let Some(suggestion) = tag_suggestion {
        let data = AutofixData::suggestion(
            AutofixKind::TagSuggestion,
            &element.tag_name,
            suggestion,
            element.tag_range,
        );
        out.push(Diagnostic {
            range: element.tag_range,
            severity: Some(DiagnosticSeverity::WARNING),
            source: Some("cem-lsp".into()),
            message: format!(
                "Unknown element '{}'. Did you mean '{}'?",
                element.tag_name, suggestion
            ),
            data: Some(data.to_json()),
            ..Default::default()
        });
        return;
    }

    let is_local_component_name =
        element.tag_name.len() <= 24 && element.tag_name.chars().all(|c| c.is_ascii_lowercase() || c == '-');
    if !is_local_component_name {
        return;
    }

    out.push(Diagnostic {
        range: element.tag_range,
        severity: Some(DiagnosticSeverity::WARNING),
        source: Some("cem-lsp".into()),
        message: format!("Unknown element '{}'", element.tag_name),
        ..Default::default()
    });
}

fn diagnose_attribute(
    definition: &ElementDefinition,
    attribute: &AttributeAtPosition,
    config: &DiagnosticsConfig,
    out: &mut Vec<Diagnostic>,
) {
    let Some(schema_attr) = definition.attribute(&attribute.name) else {
        if is_common_attribute(&attribute.name) {
            return;
        }
        let known_attrs: Vec<&str> = definition.attributes.iter().map(|a| a.name.as_str()).collect();
        let suggestion =
            closest_match(&attribute.name, known_attrs, config.attribute_suggestion_distance);
        let message = match suggestion {
            Some(s) => format!(
                "Unknown attribute '{}' on <{}>. Did you mean '{}'?",
                attribute.name, definition.tag_name, s
            ),
            None => format!("Unknown attribute '{}' on <{}>", attribute.name, definition.tag_name),
        };
        let data = suggestion.map(|s| {
            AutofixData::suggestion(
                AutofixKind::AttributeSuggestion,
                &attribute.name,
                s,
                attribute.name_range,
            )
            .to_json()
        });
        out.push(Diagnostic {
            range: attribute.name_range,
            severity: Some(config.unknown_attribute_severity),
            source: Some("cem-lsp".into()),
            message,
            data,
            ..Default::default()
        });
        return;
    };

    let Some(value) = &attribute.value else { return };
    let Some(value_range) = attribute.value_range else { return };
    let enum_values = schema_attr.r#type.enum_values();
    if enum_values.is_empty() || enum_values.iter().any(|v| v == value) {
        return;
    }

    let case_insensitive = enum_values.iter().find(|v| v.eq_ignore_ascii_case(value));
    let suggestion = case_insensitive.map(String::as_str).or_else(|| {
        closest_match(value, enum_values.iter().map(String::as_str), 1)
    });

    let message = match suggestion {
        Some(s) => format!(
            "Invalid value '{}' for attribute '{}'. Did you mean '{}'?",
            value, attribute.name, s
        ),
        None => format!("Invalid value '{}' for attribute '{}'", value, attribute.name),
    };
    let data = suggestion.map(|s| {
        AutofixData::suggestion(AutofixKind::AttributeValueSuggestion, value, s, value_range).to_json()
    });
    out.push(Diagnostic {
        range: value_range,
        severity: Some(config.invalid_value_severity),
        source: Some("cem-lsp".into()),
        message,
        data,
        ..Default::default()
    });
}

/// Checks a `slot="X"` attribute on any element (custom or not) against
/// the `Slots` of the nearest enclosing custom element.
fn diagnose_slot_child(
    state: &AppState,
    element: &ElementAtPosition,
    all_elements: &[ElementAtPosition],
    config: &DiagnosticsConfig,
    out: &mut Vec<Diagnostic>,
) {
    let Some(slot_attr) = element.attributes.get("slot") else {
        return;
    };
    let Some(value) = &slot_attr.value else { return };
    let Some(value_range) = slot_attr.value_range else { return };

    let Some(owner) = nearest_enclosing_custom_element(element, all_elements) else {
        return;
    };
    let Some(definition) = state.registry.element(&owner.tag_name) else {
        return;
    };
    if definition.slot(value).is_some() {
        return;
    }

    let slot_names: Vec<&str> = definition.slots.iter().map(|s| s.name.as_str()).collect();
    let suggestion = closest_match(value, slot_names, config.attribute_suggestion_distance);
    let message = match suggestion {
        Some(s) => format!(
            "Unknown slot '{}' for element '{}'. Did you mean '{}'?",
            value, definition.tag_name, s
        ),
        None => format!("Unknown slot '{}' for element '{}'", value, definition.tag_name),
    };
    let data = suggestion
        .map(|s| AutofixData::suggestion(AutofixKind::SlotSuggestion, value, s, value_range).to_json());
    out.push(Diagnostic {
        range: value_range,
        severity: Some(config.invalid_slot_severity),
        source: Some("cem-lsp".into()),
        message,
        data,
        ..Default::default()
    });
}

fn nearest_enclosing_custom_element<'a>(
    element: &ElementAtPosition,
    all_elements: &'a [ElementAtPosition],
) -> Option<&'a ElementAtPosition> {
    all_elements
        .iter()
        .filter(|candidate| {
            candidate.tag_name.contains('-')
                && candidate.start_byte() <= element.start_byte()
                && element.end_byte() <= candidate.end_byte()
                && candidate.start_byte() != element.start_byte()
        })
        .min_by_key(|candidate| element.start_byte() - candidate.start_byte())
}
