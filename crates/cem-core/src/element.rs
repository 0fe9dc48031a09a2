//! The resolved, registry-facing view of a custom element declaration.

use crate::manifest::{
    Attribute, ClassDeclaration, CssCustomProperty, CssPart, CssState, Event, Slot,
    SuperclassRef,
};

/// A custom element, resolved from a manifest declaration plus the module
/// and package it was found in.
///
/// Identified by its lowercase, hyphen-containing tag name. Consumers must
/// not hold an `ElementDefinition` across a manifest reload; they should
/// re-resolve by tag name (see the Manifest Registry's lifecycle notes).
#[derive(Debug, Clone)]
pub struct ElementDefinition {
    pub tag_name: String,
    pub class_name: String,
    pub description: Option<String>,
    pub attributes: Vec<Attribute>,
    pub slots: Vec<Slot>,
    pub events: Vec<Event>,
    pub css_properties: Vec<CssCustomProperty>,
    pub css_parts: Vec<CssPart>,
    pub css_states: Vec<CssState>,
    pub superclass: Option<SuperclassRef>,
    pub source_href: Option<String>,
    /// Path of the module that declared this element, relative to the
    /// package root (e.g. `"my-card.js"`).
    pub module_path: String,
    /// Name of the package the manifest belongs to, if known.
    pub package_name: Option<String>,
}

impl ElementDefinition {
    /// Builds a resolved definition from a raw class declaration plus its
    /// owning module path and package name. Returns `None` if the
    /// declaration is not a custom element (see
    /// [`ClassDeclaration::is_custom_element`]).
    pub fn from_declaration(
        declaration: &ClassDeclaration,
        module_path: &str,
        package_name: Option<&str>,
    ) -> Option<Self> {
        if !declaration.is_custom_element() {
            return None;
        }
        Some(Self {
            tag_name: declaration.tag_name.clone().unwrap().to_lowercase(),
            class_name: declaration.name.clone(),
            description: declaration.description.clone(),
            attributes: declaration.attributes.clone(),
            slots: declaration.slots.clone(),
            events: declaration.events.clone(),
            css_properties: declaration.css_properties.clone(),
            css_parts: declaration.css_parts.clone(),
            css_states: declaration.css_states.clone(),
            superclass: declaration.superclass.clone(),
            source_href: declaration.source.as_ref().map(|s| s.href.clone()),
            module_path: module_path.to_string(),
            package_name: package_name.map(str::to_string),
        })
    }

    /// Finds an attribute by name (case-sensitive, as manifest attribute
    /// names are).
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|attr| attr.name == name)
    }

    /// Finds a slot by name.
    pub fn slot(&self, name: &str) -> Option<&Slot> {
        self.slots.iter().find(|slot| slot.name == name)
    }

    /// Returns the `modulePath` normalized to a relative import specifier:
    /// absolute paths and `file://` URIs are returned unchanged, everything
    /// else is prefixed with `./` unless already so prefixed.
    pub fn import_path(&self) -> String {
        if self.module_path.starts_with('/')
            || self.module_path.starts_with("file://")
            || self.module_path.starts_with("./")
            || self.module_path.starts_with("../")
        {
            self.module_path.clone()
        } else {
            format!("./{}", self.module_path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{parse_manifest, Declaration};

    fn sample_class() -> ClassDeclaration {
        let manifest = parse_manifest(
            r#"{
                "modules": [{
                    "path": "my-card.js",
                    "declarations": [{
                        "kind": "class",
                        "name": "MyCard",
                        "tagName": "MY-CARD",
                        "description": "A card"
                    }]
                }]
            }"#,
        )
        .unwrap();
        let Declaration::Class(class) = manifest.modules[0].declarations[0].clone() else {
            panic!("expected class declaration")
        };
        class
    }

    #[test]
    fn test_from_declaration_lowercases_tag_name() {
        let def = ElementDefinition::from_declaration(&sample_class(), "my-card.js", None)
            .expect("custom element");
        assert_eq!(def.tag_name, "my-card");
    }

    #[test]
    fn test_import_path_prefixes_relative_module() {
        let def = ElementDefinition::from_declaration(&sample_class(), "my-card.js", None)
            .expect("custom element");
        assert_eq!(def.import_path(), "./my-card.js");
    }

    #[test]
    fn test_import_path_preserves_already_relative_module() {
        let mut class = sample_class();
        class.tag_name = Some("my-card".into());
        let def = ElementDefinition::from_declaration(&class, "../shared/my-card.js", None)
            .unwrap();
        assert_eq!(def.import_path(), "../shared/my-card.js");
    }

    #[test]
    fn test_non_custom_element_is_none() {
        let mut class = sample_class();
        class.tag_name = None;
        assert!(ElementDefinition::from_declaration(&class, "x.js", None).is_none());
    }
}
