//! Server configuration, accepted via LSP `initializationOptions`.

use serde::Deserialize;
use tower_lsp_server::ls_types::DiagnosticSeverity;

/// Root configuration for the cem-lsp server. All fields use sensible
/// defaults if not specified by the client.
#[derive(Debug, Deserialize, Default)]
pub struct CemConfig {
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,
    #[serde(default)]
    pub completion: CompletionConfig,
    #[serde(default)]
    pub manifest: ManifestConfig,
    #[serde(default)]
    pub cold_start: ColdStartConfig,
}

/// Severity levels for each diagnostic kind the Semantic Analyzer can
/// produce (§4.5.3).
#[derive(Debug, Clone, Deserialize)]
pub struct DiagnosticsConfig {
    #[serde(default = "default_unknown_tag_severity")]
    pub unknown_tag_severity: DiagnosticSeverity,
    #[serde(default = "default_unknown_attribute_severity")]
    pub unknown_attribute_severity: DiagnosticSeverity,
    #[serde(default = "default_invalid_value_severity")]
    pub invalid_value_severity: DiagnosticSeverity,
    #[serde(default = "default_invalid_slot_severity")]
    pub invalid_slot_severity: DiagnosticSeverity,
    /// Maximum Levenshtein distance accepted for a tag-name autofix
    /// suggestion.
    #[serde(default = "default_tag_suggestion_distance")]
    pub tag_suggestion_distance: usize,
    /// Maximum Levenshtein distance accepted for an attribute-name or
    /// attribute-value autofix suggestion.
    #[serde(default = "default_attribute_suggestion_distance")]
    pub attribute_suggestion_distance: usize,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            unknown_tag_severity: default_unknown_tag_severity(),
            unknown_attribute_severity: default_unknown_attribute_severity(),
            invalid_value_severity: default_invalid_value_severity(),
            invalid_slot_severity: default_invalid_slot_severity(),
            tag_suggestion_distance: default_tag_suggestion_distance(),
            attribute_suggestion_distance: default_attribute_suggestion_distance(),
        }
    }
}

const fn default_unknown_tag_severity() -> DiagnosticSeverity {
    DiagnosticSeverity::WARNING
}

const fn default_unknown_attribute_severity() -> DiagnosticSeverity {
    DiagnosticSeverity::WARNING
}

const fn default_invalid_value_severity() -> DiagnosticSeverity {
    DiagnosticSeverity::WARNING
}

const fn default_invalid_slot_severity() -> DiagnosticSeverity {
    DiagnosticSeverity::WARNING
}

const fn default_tag_suggestion_distance() -> usize {
    2
}

const fn default_attribute_suggestion_distance() -> usize {
    1
}

/// Tuning knobs for `textDocument/completion`.
#[derive(Debug, Clone, Deserialize)]
pub struct CompletionConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Maximum number of completion items returned per request.
    #[serde(default = "default_max_completion_items")]
    pub max_items: usize,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_items: default_max_completion_items(),
        }
    }
}

const fn default_max_completion_items() -> usize {
    200
}

/// Extra manifest discovery configuration, layered on top of the
/// Manifest Registry's own workspace/`node_modules` walk.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ManifestConfig {
    /// Explicit manifest paths to load in addition to discovered ones,
    /// relative to the workspace root unless absolute.
    #[serde(default)]
    pub extra_paths: Vec<String>,
}

/// Cold-start disk-loading behavior (§3.1), mirroring the teacher's
/// `ColdStartConfig`.
#[derive(Debug, Clone, Deserialize)]
pub struct ColdStartConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_rate_limit_ms")]
    pub rate_limit_ms: u64,
}

impl Default for ColdStartConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            rate_limit_ms: default_rate_limit_ms(),
        }
    }
}

const fn default_true() -> bool {
    true
}

const fn default_rate_limit_ms() -> u64 {
    100 // 10 req/sec per URI
}
