//! Cross-Window Messages
//!
//! Inbound messages from the editor and outbound events back to it, both
//! discriminated by a `type` field.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::manifest::Collection;
use crate::surface::{EditEvent, ElementKind};

// ═══════════════════════════════════════════════════════════════════════════════
// INBOUND
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionState {
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub schema: Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullUpdate {
    /// Field maps keyed by section id
    #[serde(default)]
    pub data: Map<String, Value>,
    #[serde(default)]
    pub sections: BTreeMap<String, SectionState>,
    /// Collections for resolving reference-picker fields, when the editor sends them
    #[serde(default)]
    pub collections: Vec<Collection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum InboundMessage {
    FullUpdate(FullUpdate),
    #[serde(rename_all = "camelCase")]
    FieldUpdate {
        section_id: String,
        field: String,
        #[serde(default)]
        value: Value,
    },
    #[serde(rename_all = "camelCase")]
    SectionToggle { section_id: String, enabled: bool },
    #[serde(rename_all = "camelCase")]
    StyleUpdate {
        section_id: String,
        field: String,
        #[serde(default)]
        styles: Map<String, Value>,
    },
    #[serde(rename_all = "camelCase")]
    SectionHighlight {
        #[serde(default)]
        section_id: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    ScrollToSection { section_id: String },
    #[serde(other)]
    Unknown,
}

impl InboundMessage {
    /// Parse a posted message. Malformed payloads are dropped like unknown kinds.
    pub fn from_value(data: &Value) -> Option<Self> {
        match serde_json::from_value(data.clone()) {
            Ok(message) => Some(message),
            Err(e) => {
                log::debug!("[livesync] dropping malformed message: {}", e);
                None
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// OUTBOUND
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum OutboundMessage {
    #[serde(rename_all = "camelCase")]
    FieldEdited {
        section_id: String,
        field: String,
        value: String,
    },
    #[serde(rename_all = "camelCase")]
    ImageReplaceRequested { section_id: String, field: String },
    #[serde(rename_all = "camelCase")]
    AiSuggestRequested {
        section_id: String,
        field: String,
        content: String,
    },
    #[serde(rename_all = "camelCase")]
    ElementSelected {
        section_id: String,
        field: String,
        element_type: ElementKind,
        content: String,
    },
    Deselect,
    Ready,
}

impl From<EditEvent> for OutboundMessage {
    fn from(event: EditEvent) -> Self {
        match event {
            EditEvent::Selected {
                section_id,
                field,
                kind,
                content,
            } => OutboundMessage::ElementSelected {
                section_id,
                field,
                element_type: kind,
                content,
            },
            EditEvent::Edited {
                section_id,
                field,
                value,
            } => OutboundMessage::FieldEdited {
                section_id,
                field,
                value,
            },
            EditEvent::ImageReplaceRequested { section_id, field } => {
                OutboundMessage::ImageReplaceRequested { section_id, field }
            }
            EditEvent::AiSuggestRequested {
                section_id,
                field,
                content,
            } => OutboundMessage::AiSuggestRequested {
                section_id,
                field,
                content,
            },
        }
    }
}
