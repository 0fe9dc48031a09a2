//! The embedded MDN global-attribute allow-list consulted by the
//! unknown-attribute diagnostic (§4.5.3): an attribute absent from the
//! tag's manifest schema is only flagged if it's also absent from here,
//! since global/ARIA attributes apply to every element regardless of what
//! a manifest declares.

/// Attributes valid on any HTML element, independent of the custom
/// element's own manifest-declared attribute list. Drawn from the MDN
/// global attributes reference plus the `aria-*`/`data-*` prefixes (handled
/// separately in [`is_common_attribute`] since they're open-ended).
const GLOBAL_ATTRIBUTES: &[&str] = &[
    "accesskey",
    "autocapitalize",
    "autofocus",
    "class",
    "contenteditable",
    "dir",
    "draggable",
    "enterkeyhint",
    "exportparts",
    "hidden",
    "id",
    "inert",
    "inputmode",
    "is",
    "itemid",
    "itemprop",
    "itemref",
    "itemscope",
    "itemtype",
    "lang",
    "nonce",
    "part",
    "popover",
    "slot",
    "spellcheck",
    "style",
    "tabindex",
    "title",
    "translate",
    "role",
];

/// Returns `true` if `name` is a global HTML attribute, an `aria-*`
/// attribute, a `data-*` attribute, or an inline event handler (`on*`) —
/// none of which a custom element's manifest is expected to redeclare.
pub fn is_common_attribute(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    GLOBAL_ATTRIBUTES.contains(&lower.as_str())
        || lower.starts_with("aria-")
        || lower.starts_with("data-")
        || (lower.starts_with("on") && lower.len() > 2)
}
