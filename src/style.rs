//! Style Patcher
//!
//! Inline style declarations plus the allow-listed property patcher used by
//! style updates. Only properties on [`ALLOWED_PROPERTIES`] are ever written;
//! anything else in an update is dropped silently.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::HashSet;

use markup5ever_rcdom::Handle;

use crate::tree;

// ═══════════════════════════════════════════════════════════════════════════════
// INLINE STYLE
// ═══════════════════════════════════════════════════════════════════════════════

/// Ordered `property: value` declarations of a `style` attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InlineStyle {
    declarations: Vec<(String, String)>,
}

impl InlineStyle {
    pub fn parse(css: &str) -> Self {
        let declarations = split_declarations(css)
            .into_iter()
            .filter_map(|decl| {
                let (prop, value) = decl.split_once(':')?;
                let prop = prop.trim().to_ascii_lowercase();
                let value = value.trim();
                if prop.is_empty() || value.is_empty() {
                    return None;
                }
                Some((prop, value.to_string()))
            })
            .collect();
        Self { declarations }
    }

    pub fn get(&self, property: &str) -> Option<&str> {
        self.declarations
            .iter()
            .find(|(p, _)| p == property)
            .map(|(_, v)| v.as_str())
    }

    pub fn set(&mut self, property: &str, value: &str) {
        if let Some(slot) = self.declarations.iter_mut().find(|(p, _)| p == property) {
            slot.1 = value.to_string();
        } else {
            self.declarations
                .push((property.to_string(), value.to_string()));
        }
    }

    pub fn remove(&mut self, property: &str) -> Option<String> {
        let index = self.declarations.iter().position(|(p, _)| p == property)?;
        Some(self.declarations.remove(index).1)
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    pub fn to_css(&self) -> String {
        self.declarations
            .iter()
            .map(|(p, v)| format!("{}: {}", p, v))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Split on top-level `;` only. Semicolons inside parentheses (`url(data:..;base64,..)`)
/// or quoted strings belong to the value.
fn split_declarations(css: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut start = 0;

    for (i, c) in css.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '"' | '\'' => match quote {
                Some(q) if q == c => quote = None,
                None => quote = Some(c),
                _ => {}
            },
            _ if quote.is_some() => {}
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ';' if depth == 0 => {
                out.push(&css[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    out.push(&css[start..]);
    out
}

/// Read-modify-write a single property on a node's inline style.
pub fn set_property(node: &Handle, property: &str, value: &str) {
    let mut style = tree::inline_style(node);
    style.set(property, value);
    tree::set_inline_style(node, &style);
}

pub fn remove_property(node: &Handle, property: &str) -> Option<String> {
    let mut style = tree::inline_style(node);
    let removed = style.remove(property);
    if removed.is_some() {
        tree::set_inline_style(node, &style);
    }
    removed
}

pub fn get_property(node: &Handle, property: &str) -> Option<String> {
    tree::inline_style(node).get(property).map(str::to_string)
}

// ═══════════════════════════════════════════════════════════════════════════════
// ALLOW LIST
// ═══════════════════════════════════════════════════════════════════════════════

pub const ALLOWED_PROPERTIES: &[&str] = &[
    // typography
    "text-align",
    "font-weight",
    "font-size",
    "letter-spacing",
    "line-height",
    "color",
    "text-transform",
    "opacity",
    // box
    "padding-top",
    "padding-bottom",
    "padding-left",
    "padding-right",
    "margin-top",
    "margin-bottom",
    "margin-left",
    "margin-right",
    // layout
    "gap",
    "justify-content",
    "align-items",
    "flex-direction",
    // surface
    "background-color",
    "border-radius",
];

lazy_static! {
    static ref ALLOWED_SET: HashSet<&'static str> = ALLOWED_PROPERTIES.iter().copied().collect();

    static ref CAMEL_HUMP_RE: Regex = Regex::new(r"([a-z0-9])([A-Z])").unwrap();

    /// Values that could terminate the declaration or smuggle in markup
    static ref UNSAFE_VALUE_RE: Regex = Regex::new(r#"[;{}<>\\]|(?i)url\s*\(|(?i)expression\s*\("#).unwrap();
}

/// `fontSize` and `font-size` both name the same property.
pub fn normalize_property(name: &str) -> String {
    CAMEL_HUMP_RE
        .replace_all(name.trim(), "$1-$2")
        .to_ascii_lowercase()
}

/// A value that cannot break out of its own declaration.
pub fn is_safe_value(value: &str) -> bool {
    !UNSAFE_VALUE_RE.is_match(value)
}

pub fn is_allowed_property(name: &str) -> bool {
    ALLOWED_SET.contains(normalize_property(name).as_str())
}

fn style_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Apply the allow-listed subset of `styles` to `node`.
///
/// Returns the number of properties written. An empty string value removes
/// the property so the editor can reset a control back to the stylesheet.
pub fn apply_styles(node: &Handle, styles: &Map<String, Value>) -> usize {
    let mut style = tree::inline_style(node);
    let mut written = 0;

    for (name, value) in styles {
        let property = normalize_property(name);
        if !ALLOWED_SET.contains(property.as_str()) {
            log::debug!("[livesync] dropping style property '{}'", name);
            continue;
        }
        let Some(value) = style_value(value) else {
            continue;
        };
        if !is_safe_value(&value) {
            log::debug!("[livesync] dropping unsafe value for '{}'", property);
            continue;
        }
        if value.is_empty() {
            style.remove(&property);
        } else {
            style.set(&property, &value);
        }
        written += 1;
    }

    if written > 0 {
        tree::set_inline_style(node, &style);
    }
    written
}
