//! Tree-sitter queries over the `tree-sitter-typescript` (TSX) grammar.

/// Captures JSX elements and their attributes, mirroring [`super::html`]'s
/// `CUSTOM_ELEMENTS` query for the TSX surface.
pub const CUSTOM_ELEMENTS: &str = r#"
(jsx_element
  open_tag: (jsx_opening_element
    name: (identifier) @tag.name
    (jsx_attribute
      (property_identifier) @attr.name
      (string (string_fragment)? @attr.value)?
    )*
  ) @tag.open
) @element

(jsx_self_closing_element
  name: (identifier) @tag.name
  (jsx_attribute
    (property_identifier) @attr.name
    (string (string_fragment)? @attr.value)?
  )*
) @element
"#;

/// Captures the cursor-adjacent JSX syntax under one of the parent
/// captures scored by the TSX completion heuristic.
pub const COMPLETION_CONTEXT: &str = r#"
(jsx_opening_element
  name: (identifier) @tag.name.completion
  (jsx_attribute
    (property_identifier) @attr.name.completion
    (string (string_fragment)? @attr.value.completion)?
  )*
) @start.tag

(jsx_self_closing_element
  name: (identifier) @tag.name.completion
  (jsx_attribute
    (property_identifier) @attr.name.completion
    (string (string_fragment)? @attr.value.completion)?
  )*
) @self.closing.tag

(jsx_element) @element

(ERROR) @incomplete.element
"#;
