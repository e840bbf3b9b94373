//! Field Locator
//!
//! Resolves logical `(section, field path)` addresses to page nodes through
//! the structural attribute vocabulary. Lookups never fail loudly: a missing
//! section or field resolves to nothing and the caller skips the update.

use markup5ever_rcdom::Handle;

use crate::config::AddressVocabulary;
use crate::tree;

/// How a located node accepts a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRole {
    /// `<img>`: value becomes the image source
    Image,
    /// `<a>` addressed by a link-target path: value becomes the destination
    Link,
    /// Anything else: value becomes text content
    Text,
}

/// A node paired with the role derived once when it was located.
#[derive(Debug, Clone)]
pub struct FieldTarget {
    pub node: Handle,
    pub role: NodeRole,
}

/// Last path segment names a link destination (`cta.href`, `url`, `link`).
pub fn is_link_target_path(field_path: &str) -> bool {
    let last = field_path.rsplit('.').next().unwrap_or(field_path);
    let last = last.to_ascii_lowercase();
    last == "href" || last == "url" || last == "link" || last.ends_with("href") || last.ends_with("url")
}

pub fn is_image_node(node: &Handle) -> bool {
    tree::tag_name(node).as_deref() == Some("img")
}

pub fn is_anchor_node(node: &Handle) -> bool {
    tree::tag_name(node).as_deref() == Some("a")
}

pub fn role_for(node: &Handle, field_path: &str) -> NodeRole {
    if is_image_node(node) {
        NodeRole::Image
    } else if is_anchor_node(node) && is_link_target_path(field_path) {
        NodeRole::Link
    } else {
        NodeRole::Text
    }
}

pub struct Locator<'a> {
    vocab: &'a AddressVocabulary,
}

impl<'a> Locator<'a> {
    pub fn new(vocab: &'a AddressVocabulary) -> Self {
        Self { vocab }
    }

    /// Root node of a section, if rendered.
    pub fn section(&self, root: &Handle, section_id: &str) -> Option<Handle> {
        tree::find_first_by_attr(root, &self.vocab.section, Some(section_id))
    }

    /// Primary node for `field_path` inside the section.
    pub fn locate(&self, root: &Handle, section_id: &str, field_path: &str) -> Option<FieldTarget> {
        let section = self.section(root, section_id)?;
        self.locate_within(&section, field_path)
    }

    /// Every node sharing the address (desktop/mobile duplicates).
    pub fn locate_all(&self, root: &Handle, section_id: &str, field_path: &str) -> Vec<FieldTarget> {
        match self.section(root, section_id) {
            Some(section) => tree::find_all_by_attr(&section, &self.vocab.field, Some(field_path))
                .into_iter()
                .map(|node| FieldTarget {
                    role: role_for(&node, field_path),
                    node,
                })
                .collect(),
            None => Vec::new(),
        }
    }

    /// Lookup relative to an arbitrary scope such as a list item. The scope
    /// itself counts, since an item node may carry the field directly.
    pub fn locate_within(&self, scope: &Handle, field_path: &str) -> Option<FieldTarget> {
        let node = if tree::get_attr(scope, &self.vocab.field).as_deref() == Some(field_path) {
            Some(scope.clone())
        } else {
            tree::find_first_by_attr(scope, &self.vocab.field, Some(field_path))
        };
        node.map(|node| FieldTarget {
            role: role_for(&node, field_path),
            node,
        })
    }

    /// First field-tagged node of any path inside `scope`, scope included.
    pub fn first_field_within(&self, scope: &Handle) -> Option<FieldTarget> {
        let node = if tree::has_attr(scope, &self.vocab.field) {
            scope.clone()
        } else {
            tree::find_first_by_attr(scope, &self.vocab.field, None)?
        };
        let path = tree::get_attr(&node, &self.vocab.field).unwrap_or_default();
        Some(FieldTarget {
            role: role_for(&node, &path),
            node,
        })
    }

    /// List containers tagged `list_name` inside the section.
    pub fn lists(&self, section: &Handle, list_name: &str) -> Vec<Handle> {
        tree::find_all_by_attr(section, &self.vocab.list, Some(list_name))
    }

    /// Style-tagged descendant, or the section root for `__section`.
    pub fn style_target(&self, section: &Handle, target: &str) -> Option<Handle> {
        if target == SECTION_STYLE_TARGET {
            return Some(section.clone());
        }
        tree::find_first_by_attr(section, &self.vocab.style_target, Some(target))
    }
}

pub const SECTION_STYLE_TARGET: &str = "__section";
