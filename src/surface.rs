//! Page Surface
//!
//! The narrow capability interface both transports drive. `HtmlPage`
//! implements it against a parsed document; tests drive the transports
//! through a recording fake as well.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::theme::ThemeRecord;

/// Kind of element reported in a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Text,
    Image,
}

/// User interaction delivered by the host, addressed by `data-edit-key`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum DomEvent {
    Focus {
        key: u32,
    },
    /// Fired on every keystroke with the node's text after the edit
    Input {
        key: u32,
        text: String,
    },
    Blur {
        key: u32,
        #[serde(default)]
        text: Option<String>,
    },
    ImageHover {
        key: u32,
        entered: bool,
    },
    ImageClick {
        key: u32,
    },
    AiSuggest {
        key: u32,
    },
    /// Any click on the page; `onField` is true when it landed on a field node
    Click {
        #[serde(rename = "onField")]
        on_field: bool,
    },
    LinkClick {
        href: String,
    },
}

/// Upward notification produced by the inline edit surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditEvent {
    Selected {
        section_id: String,
        field: String,
        kind: ElementKind,
        content: String,
    },
    Edited {
        section_id: String,
        field: String,
        value: String,
    },
    ImageReplaceRequested {
        section_id: String,
        field: String,
    },
    AiSuggestRequested {
        section_id: String,
        field: String,
        content: String,
    },
}

/// Everything the transports may do to the page.
///
/// Address misses are reported through the returned counts/flags and are
/// never errors.
pub trait PageSurface {
    /// Write a scalar to every node sharing `(section_id, field)`.
    fn apply_field(&mut self, section_id: &str, field: &str, value: &Value) -> usize;

    /// Rebuild all containers of a list. Returns containers rebuilt.
    fn reconcile_list(
        &mut self,
        section_id: &str,
        list_name: &str,
        items: &[Value],
        fallback: Option<&str>,
    ) -> usize;

    /// Apply allow-listed styles. Returns properties written.
    fn patch_style(&mut self, section_id: &str, target: &str, styles: &Map<String, Value>)
        -> usize;

    fn set_section_enabled(&mut self, section_id: &str, enabled: bool) -> bool;

    fn apply_theme(&mut self, theme: &ThemeRecord) -> usize;

    /// Highlight a section, or clear the highlight with `None`.
    fn highlight_section(&mut self, section_id: Option<&str>) -> bool;

    fn has_section(&self, section_id: &str) -> bool;

    /// Make field nodes editable. Safe to call repeatedly; returns how many
    /// nodes were newly bound.
    fn bind_edit_surface(&mut self) -> usize;

    fn handle_edit_event(&mut self, event: &DomEvent) -> Vec<EditEvent>;
}
