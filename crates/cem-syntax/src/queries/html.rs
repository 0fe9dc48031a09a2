//! Tree-sitter queries over the `tree-sitter-html` grammar.

/// Captures every element start tag and its attributes, used by the
/// Semantic Analyzer's element/attribute lookup (`FindElementAtPosition`).
pub const CUSTOM_ELEMENTS: &str = r#"
(element
  (start_tag
    (tag_name) @tag.name
    (attribute
      (attribute_name) @attr.name
      (quoted_attribute_value (attribute_value)? @attr.value)?
    )*
  ) @tag.open
) @element
"#;

/// Captures the cursor-adjacent syntax the completion handler classifies
/// into a `TagName` / `AttributeName` / `AttributeValue` context.
pub const COMPLETION_CONTEXT: &str = r#"
(start_tag
  (tag_name) @tag.name
  (attribute
    (attribute_name) @attr.name
    (quoted_attribute_value (attribute_value)? @attr.value)?
  )*
) @start.tag

(self_closing_tag
  (tag_name) @tag.name
) @self.closing.tag

(ERROR) @incomplete.element
"#;

/// Captures `<script>` elements, their `type`/`src` attributes, and their
/// raw text content for import-specifier scanning.
pub const SCRIPT_TAGS: &str = r#"
(script_element
  (start_tag
    (attribute
      (attribute_name) @attr.name
      (quoted_attribute_value (attribute_value)? @attr.value)?
    )*
  ) @script.open
  (raw_text)? @script.body
) @script.element
"#;
