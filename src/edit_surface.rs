//! Inline Edit Surface
//!
//! Binds field nodes for in-place editing and turns host-delivered DOM
//! events into upward edit/selection events. A node counts as bound once it
//! carries `data-edit-key`; binding skips such nodes, so re-binding after a
//! list rebuild only picks up the new ones.
//!
//! Focus and hover affordances remember the authored inline value they
//! replace and put it back when they end.

use std::collections::{HashMap, HashSet};

use markup5ever_rcdom::Handle;

use crate::config::{Affordances, AddressVocabulary};
use crate::list::EDIT_KEY_ATTR;
use crate::locator::is_image_node;
use crate::style;
use crate::surface::{DomEvent, EditEvent, ElementKind};
use crate::tree;

#[derive(Debug, Default)]
pub struct EditSurface {
    next_key: u32,
    /// Keys whose `contenteditable` was set by binding rather than authored.
    added_editable: HashSet<u32>,
    /// Authored value of each affordance property while it is overridden.
    saved: HashMap<(u32, &'static str), Option<String>>,
}

/// A bound node resolved from an event key.
struct BoundNode {
    node: Handle,
    section_id: String,
    field: String,
}

impl EditSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind every eligible field node under `root`. Nodes inside list items
    /// are left alone: their content belongs to the list data.
    pub fn bind(&mut self, root: &Handle, vocab: &AddressVocabulary) -> usize {
        let mut bound = 0;
        for node in tree::find_all_by_attr(root, &vocab.field, None) {
            if tree::has_attr(&node, EDIT_KEY_ATTR) {
                continue;
            }
            if tree::closest_with_attr(&node, &vocab.list_item).is_some() {
                continue;
            }
            self.next_key += 1;
            tree::set_attr(&node, EDIT_KEY_ATTR, &self.next_key.to_string());
            if !is_image_node(&node) && !tree::has_attr(&node, "contenteditable") {
                tree::set_attr(&node, "contenteditable", "true");
                self.added_editable.insert(self.next_key);
            }
            bound += 1;
        }
        bound
    }

    /// Whether binding, not the page author, made `key` editable.
    pub fn added_editable(&self, key: u32) -> bool {
        self.added_editable.contains(&key)
    }

    fn apply_affordance(&mut self, key: u32, node: &Handle, property: &'static str, value: &str) {
        self.saved
            .entry((key, property))
            .or_insert_with(|| style::get_property(node, property));
        style::set_property(node, property, value);
    }

    fn restore_affordance(&mut self, key: u32, node: &Handle, property: &'static str) {
        match self.saved.remove(&(key, property)) {
            Some(Some(prior)) => style::set_property(node, property, &prior),
            Some(None) => {
                style::remove_property(node, property);
            }
            None => {}
        }
    }

    fn resolve(&self, root: &Handle, vocab: &AddressVocabulary, key: u32) -> Option<BoundNode> {
        let node = tree::find_first_by_attr(root, EDIT_KEY_ATTR, Some(&key.to_string()))?;
        let field = tree::get_attr(&node, &vocab.field)?;
        let section_id = tree::closest_with_attr(&node, &vocab.section)
            .and_then(|s| tree::get_attr(&s, &vocab.section))
            .unwrap_or_default();
        Some(BoundNode {
            node,
            section_id,
            field,
        })
    }

    pub fn handle(
        &mut self,
        root: &Handle,
        vocab: &AddressVocabulary,
        affordances: &Affordances,
        event: &DomEvent,
    ) -> Vec<EditEvent> {
        let key = match event {
            DomEvent::Focus { key }
            | DomEvent::Input { key, .. }
            | DomEvent::Blur { key, .. }
            | DomEvent::ImageHover { key, .. }
            | DomEvent::ImageClick { key }
            | DomEvent::AiSuggest { key } => *key,
            DomEvent::Click { .. } | DomEvent::LinkClick { .. } => return Vec::new(),
        };
        let Some(bound) = self.resolve(root, vocab, key) else {
            log::debug!("[livesync] event for unbound key {}", key);
            return Vec::new();
        };
        let is_image = is_image_node(&bound.node);

        match event {
            DomEvent::Focus { .. } if !is_image => {
                self.apply_affordance(key, &bound.node, "outline", &affordances.focus_outline);
                vec![EditEvent::Selected {
                    section_id: bound.section_id,
                    field: bound.field,
                    kind: ElementKind::Text,
                    content: tree::text_content(&bound.node),
                }]
            }
            DomEvent::Input { text, .. } if !is_image => {
                tree::set_text_content(&bound.node, text);
                vec![edited(bound)]
            }
            DomEvent::Blur { text, .. } if !is_image => {
                if let Some(text) = text {
                    tree::set_text_content(&bound.node, text);
                }
                self.restore_affordance(key, &bound.node, "outline");
                vec![edited(bound)]
            }
            DomEvent::ImageHover { entered, .. } if is_image => {
                if *entered {
                    self.apply_affordance(key, &bound.node, "outline", &affordances.hover_outline);
                    self.apply_affordance(key, &bound.node, "cursor", "pointer");
                } else {
                    self.restore_affordance(key, &bound.node, "outline");
                    self.restore_affordance(key, &bound.node, "cursor");
                }
                Vec::new()
            }
            DomEvent::ImageClick { .. } if is_image => {
                let src = tree::get_attr(&bound.node, "src").unwrap_or_default();
                vec![
                    EditEvent::Selected {
                        section_id: bound.section_id.clone(),
                        field: bound.field.clone(),
                        kind: ElementKind::Image,
                        content: src,
                    },
                    EditEvent::ImageReplaceRequested {
                        section_id: bound.section_id,
                        field: bound.field,
                    },
                ]
            }
            DomEvent::AiSuggest { .. } => {
                let content = if is_image {
                    tree::get_attr(&bound.node, "src").unwrap_or_default()
                } else {
                    tree::text_content(&bound.node)
                };
                vec![EditEvent::AiSuggestRequested {
                    section_id: bound.section_id,
                    field: bound.field,
                    content,
                }]
            }
            _ => Vec::new(),
        }
    }
}

fn edited(bound: BoundNode) -> EditEvent {
    EditEvent::Edited {
        value: tree::text_content(&bound.node),
        section_id: bound.section_id,
        field: bound.field,
    }
}
