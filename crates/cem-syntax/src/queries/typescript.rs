//! Tree-sitter queries over the `tree-sitter-typescript` grammar.

/// Captures tagged-template literals (`html\`...\``, `css\`...\``) and
/// assignments to `innerHTML`, the two shapes a component author embeds
/// markup inside TypeScript. The Semantic Analyzer re-parses the captured
/// text as HTML and composes offsets back into the outer document.
pub const HTML_TEMPLATES: &str = r#"
(call_expression
  function: (identifier) @tag.function
  (#match? @tag.function "^(html|css|svg)$")
  arguments: (template_string) @template.body
) @template.call

(assignment_expression
  left: (member_expression
    property: (property_identifier) @property.name
    (#eq? @property.name "innerHTML")
  )
  right: (template_string) @template.body
) @template.assignment
"#;

/// Captures class declarations, used to resolve which class a
/// `customElements.define()` call or `@customElement` decorator attaches
/// a tag name to (supplements the manifest when source is open but its
/// manifest hasn't been regenerated yet).
pub const CLASSES: &str = r#"
(class_declaration
  name: (type_identifier) @class.name
  (class_heritage
    (extends_clause value: (identifier) @class.superclass)
  )?
) @class.declaration

(call_expression
  function: (member_expression
    object: (identifier) @registry.object
    (#eq? @registry.object "customElements")
    property: (property_identifier) @registry.method
    (#eq? @registry.method "define")
  )
  arguments: (arguments
    (string) @tag.name.literal
    .
    (identifier) @class.name.ref
  )
) @customElements.define

(class_declaration
  (decorator
    (call_expression
      arguments: (arguments (string (string_fragment) @tag.name.decorator))
    )
  )
  name: (type_identifier) @class.name.decorated
) @class.declaration.decorated
"#;
