//! Hover handler implementation.
//!
//! Shows manifest-sourced documentation for the custom element tag, or the
//! attribute, under the cursor.

use std::sync::Arc;

use tower_lsp_server::ls_types::{Hover, HoverContents, HoverParams, MarkupContent, MarkupKind};

use cem_core::position::offset_at_position;
use cem_core::manifest::Attribute;
use cem_core::ElementDefinition;

use crate::semantic::{find_attribute_at_position, find_element_at_position};
use crate::state::AppState;

pub async fn handle_hover(state: Arc<AppState>, params: HoverParams, cold_start_enabled: bool) -> Option<Hover> {
    let uri = params.text_document_position_params.text_document.uri;
    let position = params.text_document_position_params.position;
    let document = state.documents.ensure_document_loaded(&uri, cold_start_enabled).await?;
    let language = document.language();
    let offset = offset_at_position(&document.content(), position)?;

    document.with_tree(|content, tree| {
        let tree = tree?;
        let queries = state.documents.queries();

        if let Some((owner, attribute)) =
            find_attribute_at_position(content, tree, queries, language, offset)
        {
            let definition = state.registry.element(&owner)?;
            let attr = definition.attribute(&attribute.name)?;
            return Some(Hover {
                contents: HoverContents::Markup(MarkupContent {
                    kind: MarkupKind::Markdown,
                    value: render_attribute(&definition, attr),
                }),
                range: Some(attribute.name_range),
            });
        }

        let element = find_element_at_position(content, tree, queries, language, offset)?;
        let definition = state.registry.element(&element.tag_name)?;
        Some(Hover {
            contents: HoverContents::Markup(MarkupContent {
                kind: MarkupKind::Markdown,
                value: render_element(&definition),
            }),
            range: Some(element.tag_range),
        })
    })
}

fn render_element(definition: &ElementDefinition) -> String {
    let mut markdown = format!("## `<{}>`\n\n**Custom Element**", definition.tag_name);
    if let Some(package) = &definition.package_name {
        markdown.push_str(&format!(" _(from `{package}`)_"));
    }
    markdown.push_str("\n\n");

    if let Some(description) = &definition.description {
        markdown.push_str(description);
        markdown.push_str("\n\n");
    }

    if !definition.attributes.is_empty() {
        markdown.push_str("### Attributes\n\n");
        for attr in &definition.attributes {
            markdown.push_str(&format!("- `{}` — `{}`", attr.name, attr.r#type.text));
            if let Some(description) = &attr.description {
                markdown.push_str(&format!(" — {description}"));
            }
            markdown.push('\n');
        }
        markdown.push('\n');
    }

    if !definition.events.is_empty() {
        markdown.push_str("### Events\n\n");
        for event in &definition.events {
            markdown.push_str(&format!("- `{}`", event.name));
            if let Some(description) = &event.description {
                markdown.push_str(&format!(" — {description}"));
            }
            markdown.push('\n');
        }
        markdown.push('\n');
    }

    if !definition.slots.is_empty() {
        markdown.push_str("### Slots\n\n");
        for slot in &definition.slots {
            let name = if slot.name.is_empty() { "(default)" } else { &slot.name };
            markdown.push_str(&format!("- `{name}`"));
            if let Some(description) = &slot.description {
                markdown.push_str(&format!(" — {description}"));
            }
            markdown.push('\n');
        }
        markdown.push('\n');
    }

    markdown
}

fn render_attribute(definition: &ElementDefinition, attr: &Attribute) -> String {
    let mut markdown = format!(
        "## `{}` attribute\n\n**On `<{}>` element**\n\n**Type**: `{}`\n\n",
        attr.name, definition.tag_name, attr.r#type.text
    );
    if let Some(default) = &attr.default {
        markdown.push_str(&format!("**Default**: `{default}`\n\n"));
    }
    if let Some(description) = &attr.description {
        markdown.push_str(description);
        markdown.push_str("\n\n");
    }
    let enum_values = attr.r#type.enum_values();
    if !enum_values.is_empty() {
        markdown.push_str("**Allowed values**:\n\n");
        for value in enum_values {
            markdown.push_str(&format!("- `{value}`\n"));
        }
    }
    if attr.is_deprecated() {
        markdown.push_str("\n⚠️ **Deprecated**");
        if let Some(reason) = attr.deprecated.as_ref().and_then(|d| d.reason()) {
            markdown.push_str(&format!(": {reason}"));
        }
    }
    markdown
}
