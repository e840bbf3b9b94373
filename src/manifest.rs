//! Manifest Access
//!
//! Read-only view of the manifest document: sections with their enabled
//! flag, data and schema, plus collections and a flattened item index used
//! to resolve collection references. Nothing here mutates the store.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field types whose value is a list of collection item ids.
const REFERENCE_PICKER_KINDS: &[&str] = &["collection-picker", "reference"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestDocument {
    pub sections: Vec<ManifestSection>,
    #[serde(default)]
    pub collections: Vec<Collection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestSection {
    pub id: String,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub schema: Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub id: String,
    #[serde(default)]
    pub data: Vec<Value>,
}

fn entries<'a>(value: &'a Value, key: &str) -> impl Iterator<Item = &'a Value> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|a| a.iter())
        .into_iter()
        .flatten()
}

impl ManifestSection {
    fn from_value(entry: &Value) -> Option<Self> {
        let Some(id) = entry.get("id").and_then(id_string) else {
            log::debug!("[livesync] skipping manifest section without an id");
            return None;
        };
        let enabled = match entry.get("enabled") {
            None | Some(Value::Null) => None,
            Some(Value::Bool(b)) => Some(*b),
            Some(other) => {
                log::debug!("[livesync] section '{}' has non-boolean enabled {}", id, other);
                None
            }
        };
        Some(Self {
            id,
            enabled,
            data: entry.get("data").cloned().unwrap_or_default(),
            schema: entry.get("schema").cloned().unwrap_or_default(),
        })
    }
}

impl Collection {
    fn from_value(entry: &Value) -> Option<Self> {
        let Some(id) = entry.get("id").and_then(id_string) else {
            log::debug!("[livesync] skipping collection without an id");
            return None;
        };
        let data = entry
            .get("data")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        Some(Self { id, data })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SCHEMA
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaField {
    #[serde(alias = "name")]
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub collection: Option<String>,
    /// Presentation tag of the list when it differs from the field name
    #[serde(default)]
    pub list_name: Option<String>,
}

impl SchemaField {
    pub fn is_reference_picker(&self) -> bool {
        REFERENCE_PICKER_KINDS.contains(&self.kind.as_str())
    }

    /// Alternative list tag to try when no container matches the field name.
    pub fn list_fallback(&self) -> Option<&str> {
        self.list_name.as_deref().or(self.collection.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionSchema {
    #[serde(default)]
    pub fields: Vec<SchemaField>,
}

impl SectionSchema {
    /// Lenient parse: a missing or unrecognisable schema has no fields.
    pub fn from_value(value: &Value) -> Self {
        if value.is_null() {
            return Self::default();
        }
        serde_json::from_value(value.clone()).unwrap_or_else(|e| {
            log::debug!("[livesync] ignoring malformed section schema: {}", e);
            Self::default()
        })
    }

    pub fn field(&self, id: &str) -> Option<&SchemaField> {
        self.fields.iter().find(|f| f.id == id)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ITEM INDEX
// ═══════════════════════════════════════════════════════════════════════════════

/// Collection items by id, flattened across all collections.
#[derive(Debug, Clone, Default)]
pub struct ItemIndex {
    items: HashMap<String, Value>,
}

impl ItemIndex {
    pub fn build(collections: &[Collection]) -> Self {
        let mut items = HashMap::new();
        for collection in collections {
            for item in &collection.data {
                if let Some(id) = item_id(item) {
                    items.entry(id).or_insert_with(|| item.clone());
                }
            }
        }
        Self { items }
    }

    pub fn get(&self, id: &str) -> Option<&Value> {
        self.items.get(id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

fn item_id(item: &Value) -> Option<String> {
    item.get("id").and_then(id_string)
}

fn id_string(id: &Value) -> Option<String> {
    match id {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Replace bare id strings in a reference-picker value with full item
/// records. Ids with no matching item are dropped; non-array values and
/// already-resolved records pass through untouched.
pub fn resolve_references(value: &Value, index: &ItemIndex) -> Value {
    let Value::Array(entries) = value else {
        return value.clone();
    };
    let resolved = entries
        .iter()
        .filter_map(|entry| match entry {
            Value::String(id) => {
                let item = index.get(id).cloned();
                if item.is_none() {
                    log::debug!("[livesync] unresolved collection reference '{}'", id);
                }
                item
            }
            other => Some(other.clone()),
        })
        .collect();
    Value::Array(resolved)
}

// ═══════════════════════════════════════════════════════════════════════════════
// STORE CONTRACT
// ═══════════════════════════════════════════════════════════════════════════════

/// The read contract the transports rely on.
pub trait ManifestStore {
    fn section_enabled(&self, section_id: &str) -> bool;
    fn section_data(&self, section_id: &str) -> Option<&Map<String, Value>>;
    fn section_schema(&self, section_id: &str) -> SectionSchema;
    fn collection_items(&self, collection_id: &str) -> &[Value];
    fn item_index(&self) -> ItemIndex;
}

impl ManifestDocument {
    /// Lenient decode. Section and collection entries without a usable id
    /// are skipped individually; a missing or null `collections` is empty
    /// and a non-boolean `enabled` falls back to the default.
    pub fn from_value(value: &Value) -> Self {
        let sections = entries(value, "sections")
            .filter_map(ManifestSection::from_value)
            .collect();
        let collections = entries(value, "collections")
            .filter_map(Collection::from_value)
            .collect();
        Self {
            sections,
            collections,
        }
    }

    pub fn section(&self, section_id: &str) -> Option<&ManifestSection> {
        self.sections.iter().find(|s| s.id == section_id)
    }
}

impl ManifestStore for ManifestDocument {
    fn section_enabled(&self, section_id: &str) -> bool {
        self.section(section_id)
            .and_then(|s| s.enabled)
            .unwrap_or(true)
    }

    fn section_data(&self, section_id: &str) -> Option<&Map<String, Value>> {
        self.section(section_id).and_then(|s| s.data.as_object())
    }

    fn section_schema(&self, section_id: &str) -> SectionSchema {
        self.section(section_id)
            .map(|s| SectionSchema::from_value(&s.schema))
            .unwrap_or_default()
    }

    fn collection_items(&self, collection_id: &str) -> &[Value] {
        self.collections
            .iter()
            .find(|c| c.id == collection_id)
            .map(|c| c.data.as_slice())
            .unwrap_or(&[])
    }

    fn item_index(&self) -> ItemIndex {
        ItemIndex::build(&self.collections)
    }
}
