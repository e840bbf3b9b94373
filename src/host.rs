//! Host Window
//!
//! Side effects that leave the page: posting to the embedding parent,
//! navigating, and scrolling. The host environment implements this.

use serde::{Deserialize, Serialize};

use crate::message::OutboundMessage;

pub trait HostWindow {
    fn post_to_parent(&mut self, message: &OutboundMessage, target_origin: &str);
    fn navigate(&mut self, url: &str);
    fn scroll_into_view(&mut self, section_id: &str);
}

/// One recorded side effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "kebab-case")]
pub enum HostEffect {
    #[serde(rename_all = "camelCase")]
    Post {
        message: OutboundMessage,
        target_origin: String,
    },
    Navigate {
        url: String,
    },
    #[serde(rename_all = "camelCase")]
    ScrollIntoView {
        section_id: String,
        smooth: bool,
    },
}

/// Host that queues effects for something else to perform (the Node bridge
/// drains them to JavaScript).
#[derive(Debug, Default)]
pub struct RecordingHost {
    effects: Vec<HostEffect>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn effects(&self) -> &[HostEffect] {
        &self.effects
    }

    pub fn drain(&mut self) -> Vec<HostEffect> {
        std::mem::take(&mut self.effects)
    }

    /// Posted messages only, in order.
    pub fn posted(&self) -> Vec<(&OutboundMessage, &str)> {
        self.effects
            .iter()
            .filter_map(|e| match e {
                HostEffect::Post {
                    message,
                    target_origin,
                } => Some((message, target_origin.as_str())),
                _ => None,
            })
            .collect()
    }
}

impl HostWindow for RecordingHost {
    fn post_to_parent(&mut self, message: &OutboundMessage, target_origin: &str) {
        self.effects.push(HostEffect::Post {
            message: message.clone(),
            target_origin: target_origin.to_string(),
        });
    }

    fn navigate(&mut self, url: &str) {
        self.effects.push(HostEffect::Navigate {
            url: url.to_string(),
        });
    }

    fn scroll_into_view(&mut self, section_id: &str) {
        self.effects.push(HostEffect::ScrollIntoView {
            section_id: section_id.to_string(),
            smooth: true,
        });
    }
}
