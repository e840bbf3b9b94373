//! Section Visibility and Highlight
//!
//! Purely presentational toggles on section roots. Nothing here persists.

use std::rc::Rc;

use markup5ever_rcdom::Handle;

use crate::style;

/// Show or hide a section root. Enabling clears the inline `display`
/// so the stylesheet's normal display applies again.
pub fn set_enabled(section: &Handle, enabled: bool) {
    if enabled {
        style::remove_property(section, "display");
    } else {
        style::set_property(section, "display", "none");
    }
}

/// The singleton highlighted node and the outline it had before.
#[derive(Debug, Default)]
pub struct HighlightState {
    current: Option<(Handle, Option<String>)>,
}

impl HighlightState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore the prior outline of whatever is highlighted now.
    pub fn clear(&mut self) {
        if let Some((node, prior)) = self.current.take() {
            match prior {
                Some(outline) => style::set_property(&node, "outline", &outline),
                None => {
                    style::remove_property(&node, "outline");
                }
            }
        }
    }

    /// Highlight `node`, clearing any previous highlight first.
    pub fn highlight(&mut self, node: &Handle, outline: &str) {
        self.clear();
        let prior = style::get_property(node, "outline");
        style::set_property(node, "outline", outline);
        self.current = Some((node.clone(), prior));
    }

    pub fn is_highlighted(&self, node: &Handle) -> bool {
        self.current
            .as_ref()
            .is_some_and(|(current, _)| Rc::ptr_eq(current, node))
    }

    pub fn is_active(&self) -> bool {
        self.current.is_some()
    }
}
