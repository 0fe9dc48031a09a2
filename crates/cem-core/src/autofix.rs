//! Autofix payloads attached to diagnostics and consumed by code actions.

use serde::{Deserialize, Serialize};
use tower_lsp_server::ls_types::Range;

/// The kind of quick fix a diagnostic's `data` payload describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AutofixKind {
    SlotSuggestion,
    TagSuggestion,
    MissingImport,
    AttributeSuggestion,
    AttributeValueSuggestion,
}

/// Structured payload attached to `Diagnostic.data`, read back by the code
/// action handler to build the corresponding `TextEdit`(s).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutofixData {
    #[serde(rename = "type")]
    pub kind: AutofixKind,
    pub original: String,
    pub suggestion: String,
    pub range: Range,
    #[serde(rename = "tagName", skip_serializing_if = "Option::is_none")]
    pub tag_name: Option<String>,
    #[serde(rename = "importPath", skip_serializing_if = "Option::is_none")]
    pub import_path: Option<String>,
}

impl AutofixData {
    pub fn suggestion(kind: AutofixKind, original: &str, suggestion: &str, range: Range) -> Self {
        Self {
            kind,
            original: original.to_string(),
            suggestion: suggestion.to_string(),
            range,
            tag_name: None,
            import_path: None,
        }
    }

    pub fn missing_import(tag_name: &str, import_path: &str, range: Range) -> Self {
        Self {
            kind: AutofixKind::MissingImport,
            original: tag_name.to_string(),
            suggestion: import_path.to_string(),
            range,
            tag_name: Some(tag_name.to_string()),
            import_path: Some(import_path.to_string()),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// Finds the closest match to `needle` among `candidates` within Levenshtein
/// distance `max_distance`, returning the best match (ties broken by first
/// occurrence).
///
/// Grounded in the specification's use of Levenshtein distance for tag,
/// attribute, and attribute-value suggestions (§4.5.3).
pub fn closest_match<'a>(
    needle: &str,
    candidates: impl IntoIterator<Item = &'a str>,
    max_distance: usize,
) -> Option<&'a str> {
    candidates
        .into_iter()
        .map(|candidate| (candidate, strsim::levenshtein(needle, candidate)))
        .filter(|(_, distance)| *distance <= max_distance)
        .min_by_key(|(_, distance)| *distance)
        .map(|(candidate, _)| candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closest_match_within_distance() {
        let candidates = ["header", "footer", "body"];
        assert_eq!(
            closest_match("heade", candidates.into_iter(), 2),
            Some("header")
        );
    }

    #[test]
    fn test_closest_match_no_match_beyond_distance() {
        let candidates = ["header", "footer"];
        assert_eq!(closest_match("xyzxyz", candidates.into_iter(), 1), None);
    }

    #[test]
    fn test_missing_import_serializes_camel_case() {
        let range = Range::default();
        let data = AutofixData::missing_import("my-card", "./my-card.js", range);
        let json = data.to_json();
        assert_eq!(json["importPath"], "./my-card.js");
        assert_eq!(json["tagName"], "my-card");
        assert_eq!(json["type"], "missing-import");
    }
}
