//! Tree Module
//!
//! Thin helpers over `markup5ever_rcdom` handles: attribute access,
//! attribute-addressed queries, deep copies and serialisation. Everything
//! above this module talks in terms of these helpers instead of matching on
//! `NodeData` directly.

use std::cell::RefCell;
use std::rc::Rc;

use html5ever::parse_document;
use html5ever::serialize::{serialize, SerializeOpts};
use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::{Attribute, LocalName, Namespace, QualName};
use markup5ever_rcdom::{Handle, Node, NodeData, RcDom, SerializableHandle};

use crate::style::InlineStyle;

/// Parse a full HTML document.
pub fn parse_html(html: &str) -> RcDom {
    parse_document(RcDom::default(), Default::default()).one(html)
}

/// Serialise the children of `document` back to HTML.
pub fn serialize_document(document: &Handle) -> String {
    let mut bytes = Vec::new();
    let handle: SerializableHandle = document.clone().into();
    if let Err(e) = serialize(&mut bytes, &handle, SerializeOpts::default()) {
        log::error!("[livesync] failed to serialize page: {}", e);
        return String::new();
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

fn attr_qual_name(name: &str) -> QualName {
    QualName::new(None, Namespace::from(""), LocalName::from(name))
}

// ═══════════════════════════════════════════════════════════════════════════════
// ELEMENT ACCESS
// ═══════════════════════════════════════════════════════════════════════════════

pub fn is_element(node: &Handle) -> bool {
    matches!(node.data, NodeData::Element { .. })
}

/// Lowercase local tag name, `None` for non-elements.
pub fn tag_name(node: &Handle) -> Option<String> {
    match &node.data {
        NodeData::Element { name, .. } => Some(name.local.to_ascii_lowercase().to_string()),
        _ => None,
    }
}

pub fn get_attr(node: &Handle, name: &str) -> Option<String> {
    match &node.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|a| &*a.name.local == name)
            .map(|a| a.value.to_string()),
        _ => None,
    }
}

pub fn has_attr(node: &Handle, name: &str) -> bool {
    match &node.data {
        NodeData::Element { attrs, .. } => attrs.borrow().iter().any(|a| &*a.name.local == name),
        _ => false,
    }
}

pub fn set_attr(node: &Handle, name: &str, value: &str) {
    if let NodeData::Element { attrs, .. } = &node.data {
        let mut attrs = attrs.borrow_mut();
        if let Some(existing) = attrs.iter_mut().find(|a| &*a.name.local == name) {
            existing.value = StrTendril::from_slice(value);
        } else {
            attrs.push(Attribute {
                name: attr_qual_name(name),
                value: StrTendril::from_slice(value),
            });
        }
    }
}

pub fn remove_attr(node: &Handle, name: &str) {
    if let NodeData::Element { attrs, .. } = &node.data {
        attrs.borrow_mut().retain(|a| &*a.name.local != name);
    }
}

pub fn inline_style(node: &Handle) -> InlineStyle {
    InlineStyle::parse(&get_attr(node, "style").unwrap_or_default())
}

/// Write `style` back, dropping the attribute entirely once it is empty.
pub fn set_inline_style(node: &Handle, style: &InlineStyle) {
    if style.is_empty() {
        remove_attr(node, "style");
    } else {
        set_attr(node, "style", &style.to_css());
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TRAVERSAL
// ═══════════════════════════════════════════════════════════════════════════════

pub fn element_children(node: &Handle) -> Vec<Handle> {
    node.children
        .borrow()
        .iter()
        .filter(|c| is_element(c))
        .cloned()
        .collect()
}

/// All element descendants of `root` in document order, excluding `root`.
pub fn descendants(root: &Handle) -> Vec<Handle> {
    let mut out = Vec::new();
    collect_descendants(root, &mut out);
    out
}

fn collect_descendants(node: &Handle, out: &mut Vec<Handle>) {
    for child in node.children.borrow().iter() {
        if is_element(child) {
            out.push(child.clone());
            collect_descendants(child, out);
        }
    }
}

/// Descendants carrying `attr`, optionally with an exact value.
pub fn find_all_by_attr(root: &Handle, attr: &str, value: Option<&str>) -> Vec<Handle> {
    descendants(root)
        .into_iter()
        .filter(|n| match value {
            Some(v) => get_attr(n, attr).as_deref() == Some(v),
            None => has_attr(n, attr),
        })
        .collect()
}

pub fn find_first_by_attr(root: &Handle, attr: &str, value: Option<&str>) -> Option<Handle> {
    find_first_inner(root, attr, value)
}

fn find_first_inner(node: &Handle, attr: &str, value: Option<&str>) -> Option<Handle> {
    for child in node.children.borrow().iter() {
        if !is_element(child) {
            continue;
        }
        let hit = match value {
            Some(v) => get_attr(child, attr).as_deref() == Some(v),
            None => has_attr(child, attr),
        };
        if hit {
            return Some(child.clone());
        }
        if let Some(found) = find_first_inner(child, attr, value) {
            return Some(found);
        }
    }
    None
}

pub fn parent_of(node: &Handle) -> Option<Handle> {
    let weak = node.parent.take()?;
    let parent = weak.upgrade();
    node.parent.set(Some(weak));
    parent
}

/// Nearest inclusive ancestor carrying `attr`.
pub fn closest_with_attr(node: &Handle, attr: &str) -> Option<Handle> {
    let mut current = Some(node.clone());
    while let Some(n) = current {
        if has_attr(&n, attr) {
            return Some(n);
        }
        current = parent_of(&n);
    }
    None
}

/// The `<html>` element of a parsed document.
pub fn document_element(document: &Handle) -> Option<Handle> {
    element_children(document)
        .into_iter()
        .find(|n| tag_name(n).as_deref() == Some("html"))
}

// ═══════════════════════════════════════════════════════════════════════════════
// TEXT
// ═══════════════════════════════════════════════════════════════════════════════

pub fn text_content(node: &Handle) -> String {
    let mut out = String::new();
    collect_text(node, &mut out);
    out
}

fn collect_text(node: &Handle, out: &mut String) {
    match &node.data {
        NodeData::Text { contents } => out.push_str(&contents.borrow()),
        _ => {
            for child in node.children.borrow().iter() {
                collect_text(child, out);
            }
        }
    }
}

/// Replace all children of `node` with a single text node.
pub fn set_text_content(node: &Handle, text: &str) {
    for child in node.children.borrow_mut().drain(..) {
        child.parent.set(None);
    }
    if text.is_empty() {
        return;
    }
    let text_node = Node::new(NodeData::Text {
        contents: RefCell::new(StrTendril::from_slice(text)),
    });
    append_child(node, &text_node);
}

// ═══════════════════════════════════════════════════════════════════════════════
// STRUCTURE
// ═══════════════════════════════════════════════════════════════════════════════

pub fn append_child(parent: &Handle, child: &Handle) {
    child.parent.set(Some(Rc::downgrade(parent)));
    parent.children.borrow_mut().push(child.clone());
}

pub fn remove_child(parent: &Handle, child: &Handle) {
    parent
        .children
        .borrow_mut()
        .retain(|c| !Rc::ptr_eq(c, child));
    child.parent.set(None);
}

/// Detached deep copy of `node`. Attributes named in `strip` are dropped from
/// every copied element so per-node bookkeeping never leaks into copies.
pub fn deep_clone(node: &Handle, strip: &[&str]) -> Handle {
    let data = match &node.data {
        NodeData::Element {
            name,
            attrs,
            mathml_annotation_xml_integration_point,
            ..
        } => NodeData::Element {
            name: name.clone(),
            attrs: RefCell::new(
                attrs
                    .borrow()
                    .iter()
                    .filter(|a| !strip.contains(&&*a.name.local))
                    .cloned()
                    .collect(),
            ),
            template_contents: RefCell::new(None),
            mathml_annotation_xml_integration_point: *mathml_annotation_xml_integration_point,
        },
        NodeData::Text { contents } => NodeData::Text {
            contents: RefCell::new(contents.borrow().clone()),
        },
        NodeData::Comment { contents } => NodeData::Comment {
            contents: contents.clone(),
        },
        NodeData::Doctype {
            name,
            public_id,
            system_id,
        } => NodeData::Doctype {
            name: name.clone(),
            public_id: public_id.clone(),
            system_id: system_id.clone(),
        },
        NodeData::ProcessingInstruction { target, contents } => NodeData::ProcessingInstruction {
            target: target.clone(),
            contents: contents.clone(),
        },
        NodeData::Document => NodeData::Document,
    };

    let copy = Node::new(data);
    for child in node.children.borrow().iter() {
        let child_copy = deep_clone(child, strip);
        append_child(&copy, &child_copy);
    }
    copy
}
