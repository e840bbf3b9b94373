//! Update Routing
//!
//! Normalises a section's field map into the surface vocabulary: scalar
//! fields, one level of nested object fields, list updates and
//! `__style`-suffixed style updates. Both transports route through here.

use serde_json::{Map, Value};

use crate::locator::SECTION_STYLE_TARGET;
use crate::manifest::{resolve_references, ItemIndex, SectionSchema};
use crate::surface::PageSurface;
use crate::theme::ThemeRecord;

pub const STYLE_SUFFIX: &str = "__style";

/// Optional manifest context for reference resolution and list fallbacks.
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteContext<'a> {
    pub schema: Option<&'a SectionSchema>,
    pub items: Option<&'a ItemIndex>,
}

/// What a routing pass touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouteStats {
    pub fields: usize,
    pub lists: usize,
    pub styles: usize,
    pub theme_properties: usize,
}

impl RouteStats {
    pub fn merge(&mut self, other: RouteStats) {
        self.fields += other.fields;
        self.lists += other.lists;
        self.styles += other.styles;
        self.theme_properties += other.theme_properties;
    }
}

/// Route a whole section payload. The theme section is applied as a theme
/// record instead of as fields.
pub fn route_section<S: PageSurface + ?Sized>(
    surface: &mut S,
    section_id: &str,
    data: &Value,
    theme_section: &str,
    ctx: RouteContext<'_>,
) -> RouteStats {
    if section_id == theme_section {
        return RouteStats {
            theme_properties: surface.apply_theme(&ThemeRecord::from_value(data)),
            ..RouteStats::default()
        };
    }

    let mut stats = RouteStats::default();
    match data {
        Value::Object(fields) => {
            for (key, value) in fields {
                stats.merge(route_field(surface, section_id, key, value, ctx));
            }
        }
        Value::Null => {}
        _ => log::debug!("[livesync] section '{}' data is not a map", section_id),
    }
    stats
}

/// Route one `(key, value)` pair of a section.
pub fn route_field<S: PageSurface + ?Sized>(
    surface: &mut S,
    section_id: &str,
    key: &str,
    value: &Value,
    ctx: RouteContext<'_>,
) -> RouteStats {
    let mut stats = RouteStats::default();

    if let Some(target) = key.strip_suffix(STYLE_SUFFIX) {
        let target = if target.is_empty() {
            SECTION_STYLE_TARGET
        } else {
            target
        };
        if let Value::Object(styles) = value {
            stats.styles += surface.patch_style(section_id, target, styles);
        }
        return stats;
    }

    let schema_field = ctx.schema.and_then(|s| s.field(key));
    let resolved;
    let value = match (schema_field, ctx.items) {
        (Some(field), Some(index)) if field.is_reference_picker() => {
            resolved = resolve_references(value, index);
            &resolved
        }
        _ => value,
    };

    match value {
        Value::Array(items) => {
            let fallback = schema_field.and_then(|f| f.list_fallback());
            stats.lists += surface.reconcile_list(section_id, key, items, fallback);
            stats.fields += route_indexed_items(surface, section_id, key, items);
        }
        Value::Object(nested) => {
            stats.merge(route_nested(surface, section_id, key, nested));
        }
        scalar => {
            stats.fields += surface.apply_field(section_id, key, scalar);
        }
    }
    stats
}

/// `key.sub` addresses for one level of object nesting.
fn route_nested<S: PageSurface + ?Sized>(
    surface: &mut S,
    section_id: &str,
    key: &str,
    nested: &Map<String, Value>,
) -> RouteStats {
    let mut stats = RouteStats::default();
    for (sub_key, sub_value) in nested {
        let path = format!("{}.{}", key, sub_key);
        match sub_value {
            Value::Array(items) => {
                stats.lists += surface.reconcile_list(section_id, &path, items, None);
            }
            other => {
                stats.fields += surface.apply_field(section_id, &path, other);
            }
        }
    }
    stats
}

/// `key.index.sub` addresses for scalar members of object list items, for
/// pages that render list entries without a list container.
fn route_indexed_items<S: PageSurface + ?Sized>(
    surface: &mut S,
    section_id: &str,
    key: &str,
    items: &[Value],
) -> usize {
    let mut applied = 0;
    for (index, item) in items.iter().enumerate() {
        let Value::Object(record) = item else {
            continue;
        };
        for (sub_key, sub_value) in record {
            if sub_value.is_object() || sub_value.is_array() {
                continue;
            }
            let path = format!("{}.{}.{}", key, index, sub_key);
            applied += surface.apply_field(section_id, &path, sub_value);
        }
    }
    applied
}
