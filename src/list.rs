//! List Reconciler
//!
//! Lists are fully regenerative: every update discards all item nodes and
//! rebuilds them from one retained template per container. Node identity is
//! never preserved across updates.

use std::collections::HashMap;

use serde_json::{Map, Value};

use markup5ever_rcdom::Handle;

use crate::applier::{self, display_string};
use crate::config::AddressVocabulary;
use crate::locator::{is_anchor_node, is_link_target_path, Locator};
use crate::tree;

/// Bookkeeping attribute identifying a container whose template is retained.
pub const LIST_KEY_ATTR: &str = "data-list-key";
/// Bookkeeping attribute marking a node bound by the inline edit surface.
pub const EDIT_KEY_ATTR: &str = "data-edit-key";

const CLONE_STRIP: &[&str] = &[LIST_KEY_ATTR, EDIT_KEY_ATTR];

/// Templates captured from list containers, keyed by `data-list-key`.
#[derive(Debug, Default)]
pub struct TemplateStore {
    next_key: u32,
    templates: HashMap<String, Handle>,
}

impl TemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn key_for(&mut self, container: &Handle) -> String {
        if let Some(key) = tree::get_attr(container, LIST_KEY_ATTR) {
            return key;
        }
        self.next_key += 1;
        let key = self.next_key.to_string();
        tree::set_attr(container, LIST_KEY_ATTR, &key);
        key
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

pub struct ListReconciler<'a> {
    vocab: &'a AddressVocabulary,
    templates: &'a mut TemplateStore,
}

impl<'a> ListReconciler<'a> {
    pub fn new(vocab: &'a AddressVocabulary, templates: &'a mut TemplateStore) -> Self {
        Self { vocab, templates }
    }

    /// Rebuild every container tagged `list_name` (or `fallback`) inside
    /// `section`. Returns the number of containers rebuilt.
    pub fn reconcile(
        &mut self,
        section: &Handle,
        list_name: &str,
        items: &[Value],
        fallback: Option<&str>,
    ) -> usize {
        let locator = Locator::new(self.vocab);
        let mut containers = locator.lists(section, list_name);
        if containers.is_empty() {
            if let Some(fallback) = fallback {
                containers = locator.lists(section, fallback);
            }
        }
        if containers.is_empty() {
            log::debug!("[livesync] no list container for '{}'", list_name);
            return 0;
        }

        let mut rebuilt = 0;
        for container in &containers {
            if self.rebuild_container(container, items) {
                rebuilt += 1;
            }
        }
        rebuilt
    }

    fn item_children(&self, container: &Handle) -> Vec<Handle> {
        tree::element_children(container)
            .into_iter()
            .filter(|c| tree::has_attr(c, &self.vocab.list_item))
            .collect()
    }

    fn rebuild_container(&mut self, container: &Handle, items: &[Value]) -> bool {
        let key = self.templates.key_for(container);
        let existing = self.item_children(container);

        let template = match existing.first() {
            Some(first) => {
                let template = tree::deep_clone(first, CLONE_STRIP);
                self.templates.templates.insert(key, template.clone());
                template
            }
            None => match self.templates.templates.get(&key) {
                Some(t) => t.clone(),
                None => {
                    log::debug!("[livesync] list container has no item template");
                    return false;
                }
            },
        };

        for child in &existing {
            tree::remove_child(container, child);
        }

        for item in items {
            let copy = tree::deep_clone(&template, CLONE_STRIP);
            self.populate(&copy, item);
            tree::append_child(container, &copy);
        }
        true
    }

    fn populate(&self, item_node: &Handle, item: &Value) {
        let locator = Locator::new(self.vocab);
        match item {
            Value::Null => {}
            Value::Object(record) => {
                for (key, value) in record {
                    self.populate_key(&locator, item_node, record, key, value);
                }
            }
            scalar => {
                if let Some(target) = locator.first_field_within(item_node) {
                    applier::apply(&target, scalar, self.vocab);
                }
            }
        }
    }

    fn populate_key(
        &self,
        locator: &Locator<'_>,
        item_node: &Handle,
        record: &Map<String, Value>,
        key: &str,
        value: &Value,
    ) {
        if let Value::Object(nested) = value {
            for (sub_key, sub_value) in nested {
                let path = format!("{}.{}", key, sub_key);
                if let Some(target) = locator.locate_within(item_node, &path) {
                    applier::apply(&target, sub_value, self.vocab);
                }
            }
            return;
        }

        let Some(target) = locator.locate_within(item_node, key) else {
            return;
        };
        let Some(text) = display_string(value) else {
            return;
        };
        applier::reveal(&target.node, self.vocab);

        // Inside an item an anchor shows the value and takes its destination
        // from the record's own `href`.
        if is_anchor_node(&target.node) && !is_link_target_path(key) {
            tree::set_text_content(&target.node, &text);
            if let Some(href) = record.get("href").and_then(display_string) {
                tree::set_attr(&target.node, "href", &href);
            }
            return;
        }
        applier::write_by_role(&target.node, target.role, &text);
    }
}
