//! Code actions handler implementation (§4.5.4).
//!
//! Turns a diagnostic's autofix `data` payload into a `QuickFix`
//! `CodeAction`. Simple suggestion kinds (slot/attribute/attribute-value)
//! are a single `TextEdit`; `tag-suggestion` edits both the open and close
//! tag name; `missing-import` picks an insertion point and indentation
//! based on the target file's shape.

use std::collections::HashMap;
use std::sync::Arc;

use tower_lsp_server::ls_types::{
    CodeAction, CodeActionKind, CodeActionOrCommand, CodeActionParams, Range, TextEdit, Uri,
    WorkspaceEdit,
};

use cem_core::autofix::{AutofixData, AutofixKind};
use cem_core::position::{offset_at_position, position_at_offset};
use cem_core::Language;

use crate::state::AppState;

pub async fn handle_code_actions(
    state: Arc<AppState>,
    params: CodeActionParams,
) -> Vec<CodeActionOrCommand> {
    let uri = params.text_document.uri;
    let Some(document) = state.documents.document(&uri) else {
        return Vec::new();
    };
    let language = document.language();
    let content = document.content();

    params
        .context
        .diagnostics
        .iter()
        .filter(|d| d.source.as_deref() == Some("cem-lsp"))
        .filter_map(|d| d.data.clone())
        .filter_map(|data| serde_json::from_value::<AutofixData>(data).ok())
        .filter_map(|data| build_action(&uri, &content, language, data))
        .collect()
}

fn build_action(
    uri: &Uri,
    content: &str,
    language: Language,
    data: AutofixData,
) -> Option<CodeActionOrCommand> {
    match data.kind {
        AutofixKind::SlotSuggestion
        | AutofixKind::AttributeSuggestion
        | AutofixKind::AttributeValueSuggestion => Some(single_edit_action(uri, &data)),
        AutofixKind::TagSuggestion => tag_suggestion_action(uri, content, &data),
        AutofixKind::MissingImport => missing_import_action(uri, content, language, &data),
    }
}

fn workspace_edit(uri: &Uri, edits: Vec<TextEdit>) -> WorkspaceEdit {
    let mut changes = HashMap::new();
    changes.insert(uri.clone(), edits);
    WorkspaceEdit {
        changes: Some(changes),
        ..Default::default()
    }
}

fn single_edit_action(uri: &Uri, data: &AutofixData) -> CodeActionOrCommand {
    let edit = TextEdit {
        range: data.range,
        new_text: data.suggestion.clone(),
    };
    CodeActionOrCommand::CodeAction(CodeAction {
        title: format!("Change '{}' to '{}'", data.original, data.suggestion),
        kind: Some(CodeActionKind::QUICKFIX),
        edit: Some(workspace_edit(uri, vec![edit])),
        is_preferred: Some(true),
        ..Default::default()
    })
}

fn tag_suggestion_action(uri: &Uri, content: &str, data: &AutofixData) -> Option<CodeActionOrCommand> {
    let open_end = offset_at_position(content, data.range.end)?;
    let close_range = find_matching_close_tag(content, open_end, &data.original)?;

    let edits = vec![
        TextEdit {
            range: data.range,
            new_text: data.suggestion.clone(),
        },
        TextEdit {
            range: close_range,
            new_text: data.suggestion.clone(),
        },
    ];

    Some(CodeActionOrCommand::CodeAction(CodeAction {
        title: format!("Change '{}' to '{}'", data.original, data.suggestion),
        kind: Some(CodeActionKind::QUICKFIX),
        edit: Some(workspace_edit(uri, edits)),
        is_preferred: Some(true),
        ..Default::default()
    }))
}

/// Walks forward from just past the open tag, tracking nesting depth for
/// same-named tags by lexical scan, to find the matching `</tag_name>`'s
/// name token.
fn find_matching_close_tag(content: &str, after: usize, tag_name: &str) -> Option<Range> {
    let open_needle = format!("<{tag_name}");
    let close_needle = format!("</{tag_name}");
    let mut depth = 0usize;
    let mut cursor = after;

    loop {
        let open_at = content[cursor..].find(open_needle.as_str()).map(|i| cursor + i);
        let close_at = content[cursor..].find(close_needle.as_str()).map(|i| cursor + i);
        let close_at = close_at.filter(|&c| is_tag_boundary(content, c + close_needle.len()));

        match (open_at, close_at) {
            (_, None) => return None,
            (Some(o), Some(c)) if o < c && is_tag_boundary(content, o + open_needle.len()) => {
                depth += 1;
                cursor = o + open_needle.len();
            }
            (_, Some(c)) => {
                if depth == 0 {
                    let name_start = c + 2;
                    let name_end = name_start + tag_name.len();
                    return Some(Range {
                        start: position_at_offset(content, name_start)?,
                        end: position_at_offset(content, name_end)?,
                    });
                }
                depth -= 1;
                cursor = c + close_needle.len();
            }
        }
    }
}

fn is_tag_boundary(content: &str, offset: usize) -> bool {
    content[offset..]
        .chars()
        .next()
        .is_none_or(|c| c.is_whitespace() || c == '>' || c == '/')
}

fn missing_import_action(
    uri: &Uri,
    content: &str,
    language: Language,
    data: &AutofixData,
) -> Option<CodeActionOrCommand> {
    let import_path = data.import_path.as_deref()?;
    let tag_name = data.tag_name.as_deref().unwrap_or(&data.original);

    let (offset, new_text) = match language {
        Language::TypeScript | Language::Tsx => (0, format!("import \"{import_path}\";\n")),
        Language::Html => html_insertion(content, import_path)?,
    };

    let position = position_at_offset(content, offset)?;
    let edit = TextEdit {
        range: Range {
            start: position,
            end: position,
        },
        new_text,
    };

    Some(CodeActionOrCommand::CodeAction(CodeAction {
        title: format!("Import '{tag_name}' from '{import_path}'"),
        kind: Some(CodeActionKind::QUICKFIX),
        edit: Some(workspace_edit(uri, vec![edit])),
        is_preferred: Some(true),
        ..Default::default()
    }))
}

fn html_insertion(content: &str, import_path: &str) -> Option<(usize, String)> {
    if let Some((body_start, body_end)) = find_module_script_body(content) {
        let body = &content[body_start..body_end];
        let indent = first_import_indent(body).unwrap_or_else(|| base_indent(content).repeat(2));
        let line_start = line_start_offset(content, body_end);
        return Some((line_start, format!("{indent}import \"{import_path}\";\n")));
    }

    if let Some(head_open_line_start) = find_tag_line_start(content, "<head") {
        let head_indent = leading_whitespace(content, head_open_line_start);
        let inner_indent = format!("{head_indent}{}", base_indent(content));
        let import_indent = format!("{inner_indent}{}", base_indent(content));
        let close_head_line_start = line_start_offset(content, content.find("</head>")?);
        let block = format!(
            "{inner_indent}<script type=\"module\">\n{import_indent}import \"{import_path}\";\n{inner_indent}</script>\n"
        );
        return Some((close_head_line_start, block));
    }

    let base = base_indent(content);
    let block = format!("<script type=\"module\">\n{base}import \"{import_path}\";\n</script>\n");
    Some((0, block))
}

fn find_module_script_body(content: &str) -> Option<(usize, usize)> {
    let mut search_from = 0;
    while let Some(rel) = content[search_from..].find("<script") {
        let tag_start = search_from + rel;
        let tag_end = tag_start + content[tag_start..].find('>')? + 1;
        if content[tag_start..tag_end].contains("module") {
            let close_rel = content[tag_end..].find("</script>")?;
            return Some((tag_end, tag_end + close_rel));
        }
        search_from = tag_end;
    }
    None
}

fn first_import_indent(body: &str) -> Option<String> {
    for line in body.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("import") {
            let indent_len = line.len() - trimmed.len();
            return Some(line[..indent_len].to_string());
        }
    }
    None
}

fn find_tag_line_start(content: &str, needle: &str) -> Option<usize> {
    let at = content.find(needle)?;
    Some(line_start_offset(content, at))
}

fn line_start_offset(content: &str, offset: usize) -> usize {
    content[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0)
}

fn leading_whitespace(content: &str, line_start: usize) -> String {
    content[line_start..]
        .chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .collect()
}

/// Scans non-blank lines for the file's indentation unit: a leading tab if
/// any line uses one, else the smallest positive count of leading spaces.
fn base_indent(content: &str) -> String {
    let mut uses_tab = false;
    let mut min_spaces: Option<usize> = None;

    for line in content.lines() {
        if line.trim().is_empty() {
            continue;
        }
        if line.starts_with('\t') {
            uses_tab = true;
            break;
        }
        let spaces = line.chars().take_while(|c| *c == ' ').count();
        if spaces > 0 {
            min_spaces = Some(min_spaces.map_or(spaces, |m| m.min(spaces)));
        }
    }

    if uses_tab {
        "\t".to_string()
    } else {
        " ".repeat(min_spaces.unwrap_or(2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn uri(s: &str) -> Uri {
        Uri::from_str(s).unwrap()
    }

    fn range_at(content: &str, needle: &str) -> Range {
        let start = content.find(needle).unwrap();
        Range {
            start: position_at_offset(content, start).unwrap(),
            end: position_at_offset(content, start + needle.len()).unwrap(),
        }
    }

    #[test]
    fn test_single_edit_action_builds_replacement() {
        let u = uri("file:///test.html");
        let content = r#"<my-card variant="primar"></my-card>"#;
        let range = range_at(content, "primar");
        let data = AutofixData::suggestion(AutofixKind::AttributeValueSuggestion, "primar", "primary", range);
        let action = single_edit_action(&u, &data);
        let CodeActionOrCommand::CodeAction(action) = action else {
            panic!("expected code action");
        };
        assert_eq!(action.title, "Change 'primar' to 'primary'");
        let edits = &action.edit.unwrap().changes.unwrap()[&u];
        assert_eq!(edits.len(), 1);
        assert_eq!(edits[0].new_text, "primary");
    }

    #[test]
    fn test_tag_suggestion_replaces_open_and_close() {
        let u = uri("file:///test.html");
        let content = "<my-crad></my-crad>";
        let range = range_at(content, "my-crad");
        let data = AutofixData::suggestion(AutofixKind::TagSuggestion, "my-crad", "my-card", range);
        let action = tag_suggestion_action(&u, content, &data).expect("action expected");
        let CodeActionOrCommand::CodeAction(action) = action else {
            panic!("expected code action");
        };
        let edits = &action.edit.unwrap().changes.unwrap()[&u];
        assert_eq!(edits.len(), 2);
        assert!(edits.iter().all(|e| e.new_text == "my-card"));
    }

    #[test]
    fn test_missing_import_inserts_into_existing_module_script() {
        let content = "<!doctype html>\n<html>\n<head>\n  <script type=\"module\">\n      import \"./a.js\";\n  </script>\n</head>\n<body><my-card></my-card></body>\n</html>";
        let (offset, text) = html_insertion(content, "./my-card.js").expect("insertion point");
        assert_eq!(text, "      import \"./my-card.js\";\n");
        let position = position_at_offset(content, offset).unwrap();
        assert_eq!(position.line, 5);
    }

    #[test]
    fn test_missing_import_inserts_script_block_before_head_close() {
        let content = "<html>\n  <head>\n    <title>x</title>\n  </head>\n  <body><my-card></my-card></body>\n</html>";
        let (_offset, text) = html_insertion(content, "./my-card.js").expect("insertion point");
        assert!(text.contains("<script type=\"module\">"));
        assert!(text.contains("import \"./my-card.js\";"));
    }

    #[test]
    fn test_missing_import_inserts_script_block_at_top_with_no_head() {
        let content = "<body><my-card></my-card></body>";
        let (offset, text) = html_insertion(content, "./my-card.js").expect("insertion point");
        assert_eq!(offset, 0);
        assert!(text.starts_with("<script type=\"module\">"));
    }

    #[test]
    fn test_base_indent_detects_tabs() {
        let content = "<div>\n\t<span></span>\n</div>";
        assert_eq!(base_indent(content), "\t");
    }

    #[test]
    fn test_base_indent_detects_smallest_space_run() {
        let content = "<div>\n  <span>\n    <b></b>\n  </span>\n</div>";
        assert_eq!(base_indent(content), "  ");
    }
}
