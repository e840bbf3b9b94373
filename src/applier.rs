//! Value Applier
//!
//! Writes one scalar value into one located node according to its role.

use serde_json::Value;

use markup5ever_rcdom::Handle;

use crate::config::AddressVocabulary;
use crate::locator::{FieldTarget, NodeRole};
use crate::style;
use crate::tree;

/// Display form of a value. `None` for null, which means "unchanged".
///
/// Objects and arrays reaching this point are shape mismatches and fall
/// through to their JSON text rather than failing.
pub fn display_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

/// Reverse the "hidden because originally empty" presentation.
pub fn reveal(node: &Handle, vocab: &AddressVocabulary) {
    if tree::has_attr(node, &vocab.empty_marker) {
        tree::remove_attr(node, &vocab.empty_marker);
        if style::get_property(node, "display").as_deref() == Some("none") {
            style::remove_property(node, "display");
        }
    }
    if tree::has_attr(node, "hidden") {
        tree::remove_attr(node, "hidden");
    }
}

/// Apply `value` to `target`. Returns `false` when the value was null.
pub fn apply(target: &FieldTarget, value: &Value, vocab: &AddressVocabulary) -> bool {
    let Some(text) = display_string(value) else {
        return false;
    };
    reveal(&target.node, vocab);
    write_by_role(&target.node, target.role, &text);
    true
}

pub fn write_by_role(node: &Handle, role: NodeRole, text: &str) {
    match role {
        NodeRole::Image => tree::set_attr(node, "src", text),
        NodeRole::Link => tree::set_attr(node, "href", text),
        NodeRole::Text => tree::set_text_content(node, text),
    }
}
