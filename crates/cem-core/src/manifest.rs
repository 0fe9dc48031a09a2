//! Typed view over the Custom Elements Manifest (CEM) JSON schema.
//!
//! This module is read-only: it describes the shape of `custom-elements.json`
//! well enough to resolve elements, attributes, slots, and events, and
//! tolerates unknown fields and declaration kinds it does not care about.

use serde::Deserialize;

/// Top-level manifest: an ordered list of modules.
///
/// `schemaVersion` and `readme` are accepted but not retained; callers only
/// need the module list.
#[derive(Debug, Clone, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub modules: Vec<Module>,
}

/// A single source module within a manifest.
#[derive(Debug, Clone, Deserialize)]
pub struct Module {
    /// Path of the module, relative to the package root (e.g. `"my-card.js"`).
    pub path: String,
    #[serde(default)]
    pub declarations: Vec<Declaration>,
}

/// A declaration within a module.
///
/// Only `"kind": "class"` declarations that also carry a `tagName` are
/// custom-element declarations; everything else is preserved as `Other` so
/// unrelated declarations (functions, mixins, non-element classes) do not
/// break parsing of the surrounding module.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind")]
pub enum Declaration {
    #[serde(rename = "class")]
    Class(ClassDeclaration),
    #[serde(other)]
    Other,
}

/// A class-like declaration, possibly a custom element.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ClassDeclaration {
    pub name: String,
    #[serde(rename = "tagName")]
    pub tag_name: Option<String>,
    pub description: Option<String>,
    pub superclass: Option<SuperclassRef>,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    #[serde(default)]
    pub slots: Vec<Slot>,
    #[serde(default)]
    pub events: Vec<Event>,
    #[serde(rename = "cssProperties", default)]
    pub css_properties: Vec<CssCustomProperty>,
    #[serde(rename = "cssParts", default)]
    pub css_parts: Vec<CssPart>,
    #[serde(rename = "cssStates", default)]
    pub css_states: Vec<CssState>,
    pub source: Option<SourceReference>,
    pub deprecated: Option<Deprecated>,
}

impl ClassDeclaration {
    /// Returns `true` if this declaration describes a custom element, i.e.
    /// it carries a non-empty, hyphenated `tagName`.
    pub fn is_custom_element(&self) -> bool {
        self.tag_name
            .as_deref()
            .is_some_and(|tag| tag.contains('-'))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SuperclassRef {
    pub name: String,
    pub module: Option<String>,
    pub package: Option<String>,
}

/// A reference to where a declaration is defined in source.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceReference {
    pub href: String,
}

/// Either a bare deprecation flag (`true`) or a flag plus a reason string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Deprecated {
    Flag(bool),
    Reason(String),
}

impl Deprecated {
    pub fn reason(&self) -> Option<&str> {
        match self {
            Deprecated::Flag(_) => None,
            Deprecated::Reason(reason) => Some(reason),
        }
    }
}

/// A type descriptor: free-form text plus an optional enumeration of the
/// literal values it accepts (derived from a TypeScript union of string
/// literals, e.g. `"primary" | "secondary"`).
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TypeDescriptor {
    pub text: String,
}

impl TypeDescriptor {
    /// Parses `text` as a `|`-delimited union of quoted string literals,
    /// returning the literal values with quotes stripped. Returns an empty
    /// vector if `text` is not such a union (e.g. `"string"`, `"boolean"`).
    pub fn enum_values(&self) -> Vec<String> {
        let trimmed = self.text.trim();
        if !trimmed.contains('|') && !looks_like_single_literal(trimmed) {
            return Vec::new();
        }
        let parts: Vec<&str> = trimmed.split('|').map(str::trim).collect();
        let mut values = Vec::with_capacity(parts.len());
        for part in parts {
            let Some(literal) = strip_quotes(part) else {
                return Vec::new();
            };
            values.push(literal.to_string());
        }
        values
    }

    /// Returns `true` when the descriptor is exactly `boolean`.
    pub fn is_boolean(&self) -> bool {
        self.text.trim() == "boolean"
    }
}

fn looks_like_single_literal(text: &str) -> bool {
    strip_quotes(text).is_some()
}

fn strip_quotes(part: &str) -> Option<&str> {
    let part = part.trim();
    if part.len() >= 2
        && ((part.starts_with('\'') && part.ends_with('\''))
            || (part.starts_with('"') && part.ends_with('"')))
    {
        Some(&part[1..part.len() - 1])
    } else {
        None
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Attribute {
    pub name: String,
    #[serde(rename = "fieldName")]
    pub field_name: Option<String>,
    #[serde(default)]
    pub r#type: TypeDescriptor,
    pub default: Option<String>,
    pub description: Option<String>,
    pub deprecated: Option<Deprecated>,
}

impl Attribute {
    pub fn is_deprecated(&self) -> bool {
        match &self.deprecated {
            None => false,
            Some(Deprecated::Flag(flag)) => *flag,
            Some(Deprecated::Reason(_)) => true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Slot {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Event {
    pub name: String,
    #[serde(default)]
    pub r#type: TypeDescriptor,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CssCustomProperty {
    pub name: String,
    pub syntax: Option<String>,
    pub default: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CssPart {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CssState {
    pub name: String,
    pub description: Option<String>,
}

/// Parses a manifest document, tolerating unknown top-level fields and
/// unknown declaration kinds (they deserialize to `Declaration::Other`).
pub fn parse_manifest(text: &str) -> serde_json::Result<Manifest> {
    serde_json::from_str(text)
}
