//! Test doubles shared by the transport tests.

use serde_json::{Map, Value};

use crate::locator::Locator;
use crate::page::HtmlPage;
use crate::surface::{DomEvent, EditEvent, PageSurface};
use crate::theme::ThemeRecord;
use crate::tree;

#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceCall {
    Field {
        section: String,
        field: String,
        value: Value,
    },
    List {
        section: String,
        list: String,
        items: Vec<Value>,
        fallback: Option<String>,
    },
    Style {
        section: String,
        target: String,
        styles: Map<String, Value>,
    },
    Enabled {
        section: String,
        enabled: bool,
    },
    Theme(ThemeRecord),
    Highlight(Option<String>),
    Bind,
}

/// Records every surface call instead of touching a tree.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub calls: Vec<SurfaceCall>,
    /// Sections `has_section` reports as rendered
    pub sections: Vec<String>,
    /// Returned from every `handle_edit_event`
    pub edit_events: Vec<EditEvent>,
}

impl RecordingSurface {
    pub fn with_sections(sections: &[&str]) -> Self {
        Self {
            sections: sections.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }

    /// Calls other than edit-surface binding.
    pub fn mutations(&self) -> Vec<&SurfaceCall> {
        self.calls
            .iter()
            .filter(|c| !matches!(c, SurfaceCall::Bind))
            .collect()
    }
}

impl PageSurface for RecordingSurface {
    fn apply_field(&mut self, section_id: &str, field: &str, value: &Value) -> usize {
        self.calls.push(SurfaceCall::Field {
            section: section_id.into(),
            field: field.into(),
            value: value.clone(),
        });
        usize::from(!value.is_null())
    }

    fn reconcile_list(
        &mut self,
        section_id: &str,
        list_name: &str,
        items: &[Value],
        fallback: Option<&str>,
    ) -> usize {
        self.calls.push(SurfaceCall::List {
            section: section_id.into(),
            list: list_name.into(),
            items: items.to_vec(),
            fallback: fallback.map(str::to_string),
        });
        1
    }

    fn patch_style(
        &mut self,
        section_id: &str,
        target: &str,
        styles: &Map<String, Value>,
    ) -> usize {
        self.calls.push(SurfaceCall::Style {
            section: section_id.into(),
            target: target.into(),
            styles: styles.clone(),
        });
        styles.len()
    }

    fn set_section_enabled(&mut self, section_id: &str, enabled: bool) -> bool {
        self.calls.push(SurfaceCall::Enabled {
            section: section_id.into(),
            enabled,
        });
        true
    }

    fn apply_theme(&mut self, theme: &ThemeRecord) -> usize {
        self.calls.push(SurfaceCall::Theme(theme.clone()));
        theme.custom_properties().len()
    }

    fn highlight_section(&mut self, section_id: Option<&str>) -> bool {
        self.calls
            .push(SurfaceCall::Highlight(section_id.map(str::to_string)));
        true
    }

    fn has_section(&self, section_id: &str) -> bool {
        self.sections.iter().any(|s| s == section_id)
    }

    fn bind_edit_surface(&mut self) -> usize {
        self.calls.push(SurfaceCall::Bind);
        0
    }

    fn handle_edit_event(&mut self, _event: &DomEvent) -> Vec<EditEvent> {
        self.edit_events.clone()
    }
}

/// Text of every node addressed `(section_id, field)`, in document order.
pub fn field_texts(page: &HtmlPage, section_id: &str, field: &str) -> Vec<String> {
    Locator::new(&page.config().vocabulary)
        .locate_all(page.document(), section_id, field)
        .iter()
        .map(|t| tree::text_content(&t.node))
        .collect()
}

pub fn field_attr(page: &HtmlPage, section_id: &str, field: &str, attr: &str) -> Option<String> {
    Locator::new(&page.config().vocabulary)
        .locate(page.document(), section_id, field)
        .and_then(|t| tree::get_attr(&t.node, attr))
}

pub fn section_attr(page: &HtmlPage, section_id: &str, attr: &str) -> Option<String> {
    Locator::new(&page.config().vocabulary)
        .section(page.document(), section_id)
        .and_then(|s| tree::get_attr(&s, attr))
}
