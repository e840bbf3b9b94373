//! HTML Page
//!
//! The concrete page tree: a server-rendered document parsed with html5ever,
//! mutated in place by the reconciliation primitives and serialised back on
//! demand.

use serde_json::{Map, Value};

use markup5ever_rcdom::{Handle, RcDom};

use crate::applier;
use crate::config::SyncConfig;
use crate::edit_surface::EditSurface;
use crate::list::{ListReconciler, TemplateStore, EDIT_KEY_ATTR, LIST_KEY_ATTR};
use crate::locator::Locator;
use crate::section::{self, HighlightState};
use crate::style;
use crate::surface::{DomEvent, EditEvent, PageSurface};
use crate::theme::{self, ThemeRecord};
use crate::tree;

pub struct HtmlPage {
    dom: RcDom,
    config: SyncConfig,
    templates: TemplateStore,
    highlight: HighlightState,
    edit: EditSurface,
}

impl HtmlPage {
    pub fn parse(html: &str) -> Self {
        Self::with_config(html, SyncConfig::default())
    }

    pub fn with_config(html: &str, config: SyncConfig) -> Self {
        Self {
            dom: tree::parse_html(html),
            config,
            templates: TemplateStore::new(),
            highlight: HighlightState::new(),
            edit: EditSurface::new(),
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn document(&self) -> &Handle {
        &self.dom.document
    }

    /// Serialise the page as authored content. The live tree keeps its
    /// edit and list keys; only the output copy drops them.
    pub fn to_html(&self) -> String {
        let copy = tree::deep_clone(&self.dom.document, &[]);
        for node in tree::descendants(&copy) {
            if let Some(key) = tree::get_attr(&node, EDIT_KEY_ATTR) {
                if key.parse::<u32>().is_ok_and(|k| self.edit.added_editable(k)) {
                    tree::remove_attr(&node, "contenteditable");
                }
                tree::remove_attr(&node, EDIT_KEY_ATTR);
            }
            tree::remove_attr(&node, LIST_KEY_ATTR);
        }
        tree::serialize_document(&copy)
    }

    fn locator(&self) -> Locator<'_> {
        Locator::new(&self.config.vocabulary)
    }

    fn section(&self, section_id: &str) -> Option<Handle> {
        let found = self.locator().section(&self.dom.document, section_id);
        if found.is_none() {
            log::debug!("[livesync] section '{}' not rendered", section_id);
        }
        found
    }
}

impl PageSurface for HtmlPage {
    fn apply_field(&mut self, section_id: &str, field: &str, value: &Value) -> usize {
        let targets = self
            .locator()
            .locate_all(&self.dom.document, section_id, field);
        if targets.is_empty() {
            log::debug!("[livesync] no node for {}.{}", section_id, field);
        }
        targets
            .iter()
            .filter(|t| applier::apply(t, value, &self.config.vocabulary))
            .count()
    }

    fn reconcile_list(
        &mut self,
        section_id: &str,
        list_name: &str,
        items: &[Value],
        fallback: Option<&str>,
    ) -> usize {
        let Some(section) = self.section(section_id) else {
            return 0;
        };
        ListReconciler::new(&self.config.vocabulary, &mut self.templates)
            .reconcile(&section, list_name, items, fallback)
    }

    fn patch_style(
        &mut self,
        section_id: &str,
        target: &str,
        styles: &Map<String, Value>,
    ) -> usize {
        let Some(section) = self.section(section_id) else {
            return 0;
        };
        match self.locator().style_target(&section, target) {
            Some(node) => style::apply_styles(&node, styles),
            None => {
                log::debug!("[livesync] no style target '{}' in '{}'", target, section_id);
                0
            }
        }
    }

    fn set_section_enabled(&mut self, section_id: &str, enabled: bool) -> bool {
        match self.section(section_id) {
            Some(node) => {
                section::set_enabled(&node, enabled);
                true
            }
            None => false,
        }
    }

    fn apply_theme(&mut self, theme: &ThemeRecord) -> usize {
        match tree::document_element(&self.dom.document) {
            Some(root) => theme::apply_theme(&root, theme),
            None => 0,
        }
    }

    fn highlight_section(&mut self, section_id: Option<&str>) -> bool {
        let Some(section_id) = section_id else {
            self.highlight.clear();
            return true;
        };
        match self.section(section_id) {
            Some(node) => {
                self.highlight
                    .highlight(&node, &self.config.affordances.highlight_outline);
                true
            }
            None => {
                self.highlight.clear();
                false
            }
        }
    }

    fn has_section(&self, section_id: &str) -> bool {
        self.locator()
            .section(&self.dom.document, section_id)
            .is_some()
    }

    fn bind_edit_surface(&mut self) -> usize {
        self.edit
            .bind(&self.dom.document, &self.config.vocabulary)
    }

    fn handle_edit_event(&mut self, event: &DomEvent) -> Vec<EditEvent> {
        self.edit.handle(
            &self.dom.document,
            &self.config.vocabulary,
            &self.config.affordances,
            event,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const PAGE: &str = r#"<!DOCTYPE html>
        <html><body>
        <section data-section-id="hero" style="padding-top: 4px">
            <h1 data-field="title">Old</h1>
            <h1 data-field="title" class="mobile">Old</h1>
            <p data-style-target="title">x</p>
        </section>
        </body></html>"#;

    #[test]
    fn test_apply_field_updates_duplicates() {
        let mut page = HtmlPage::parse(PAGE);
        assert_eq!(page.apply_field("hero", "title", &json!("New")), 2);
        assert_eq!(page.apply_field("hero", "title", &Value::Null), 0);
        assert_eq!(page.apply_field("ghost", "title", &json!("x")), 0);
        assert!(page.to_html().contains(r#"<h1 data-field="title" class="mobile">New</h1>"#));
    }

    #[test]
    fn test_patch_section_root_style() {
        let mut page = HtmlPage::parse(PAGE);
        let styles = json!({"backgroundColor": "#fff", "position": "absolute"});
        assert_eq!(page.patch_style("hero", "__section", styles.as_object().unwrap()), 1);
        let html = page.to_html();
        assert!(html.contains("padding-top: 4px; background-color: #fff"));
        assert!(!html.contains("absolute"));
    }

    #[test]
    fn test_highlight_missing_section_clears() {
        let mut page = HtmlPage::parse(PAGE);
        assert!(page.highlight_section(Some("hero")));
        assert!(!page.highlight_section(Some("ghost")));
        assert!(!page.to_html().contains("outline"));
    }

    #[test]
    fn test_serialised_page_drops_bookkeeping() {
        let mut page = HtmlPage::parse(
            r#"<!DOCTYPE html><html><body>
            <section data-section-id="hero">
                <h1 data-field="title">Old</h1>
                <p data-field="note" contenteditable="false">Fixed</p>
                <ul data-list="items"><li data-list-item><span data-field="name">x</span></li></ul>
            </section>
            </body></html>"#,
        );
        assert_eq!(page.bind_edit_surface(), 2);
        assert_eq!(page.reconcile_list("hero", "items", &[json!({"name": "A"})], None), 1);

        let html = page.to_html();
        assert!(!html.contains(EDIT_KEY_ATTR));
        assert!(!html.contains(LIST_KEY_ATTR));
        assert!(html.contains(r#"<h1 data-field="title">Old</h1>"#));
        assert!(html.contains(r#"contenteditable="false""#));
        assert!(!html.contains(r#"contenteditable="true""#));

        // the live tree still carries its keys
        let title = tree::find_first_by_attr(page.document(), "data-field", Some("title")).unwrap();
        assert!(tree::has_attr(&title, EDIT_KEY_ATTR));
        let items = [json!({"name": "B"}), json!({"name": "C"})];
        assert_eq!(page.reconcile_list("hero", "items", &items, None), 1);
        assert!(page.to_html().contains("<span data-field=\"name\">C</span>"));
    }
}
