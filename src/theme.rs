//! Theme Applier
//!
//! Maps a theme record onto global CSS custom properties on the document
//! root. Absent entries are never cleared, so partial theme updates compose.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use markup5ever_rcdom::Handle;

use crate::style;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ThemeColors {
    pub primary: Option<String>,
    pub secondary: Option<String>,
    pub accent: Option<String>,
    pub background: Option<String>,
    pub foreground: Option<String>,
    pub muted: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ThemeTypography {
    pub font_sans: Option<String>,
    pub font_serif: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ThemeRadius {
    pub base: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ThemeRecord {
    pub colors: ThemeColors,
    pub typography: ThemeTypography,
    pub radius: ThemeRadius,
}

impl ThemeRecord {
    /// Lenient conversion from arbitrary JSON, leaf by leaf. Numbers are
    /// coerced to strings; a leaf of any other shape is skipped on its own
    /// without discarding its siblings.
    pub fn from_value(value: &Value) -> Self {
        let leaf = |group: &str, key: &str| theme_leaf(value, group, key);
        ThemeRecord {
            colors: ThemeColors {
                primary: leaf("colors", "primary"),
                secondary: leaf("colors", "secondary"),
                accent: leaf("colors", "accent"),
                background: leaf("colors", "background"),
                foreground: leaf("colors", "foreground"),
                muted: leaf("colors", "muted"),
            },
            typography: ThemeTypography {
                font_sans: leaf("typography", "fontSans"),
                font_serif: leaf("typography", "fontSerif"),
            },
            radius: ThemeRadius {
                base: leaf("radius", "base"),
            },
        }
    }

    /// `(custom property, value)` pairs present in this record.
    pub fn custom_properties(&self) -> Vec<(&'static str, &str)> {
        let entries: [(&'static str, &Option<String>); 9] = [
            ("--color-primary", &self.colors.primary),
            ("--color-secondary", &self.colors.secondary),
            ("--color-accent", &self.colors.accent),
            ("--color-background", &self.colors.background),
            ("--color-foreground", &self.colors.foreground),
            ("--color-muted", &self.colors.muted),
            ("--font-sans", &self.typography.font_sans),
            ("--font-serif", &self.typography.font_serif),
            ("--radius", &self.radius.base),
        ];
        entries
            .into_iter()
            .filter_map(|(name, value)| value.as_deref().map(|v| (name, v)))
            .collect()
    }
}

fn theme_leaf(value: &Value, group: &str, key: &str) -> Option<String> {
    match value.get(group)?.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Null => None,
        other => {
            log::debug!("[livesync] ignoring theme {}.{}: {}", group, key, other);
            None
        }
    }
}

/// Write the record's custom properties onto `root`. Returns how many were set.
pub fn apply_theme(root: &Handle, theme: &ThemeRecord) -> usize {
    let mut written = 0;
    for (name, value) in theme.custom_properties() {
        if !style::is_safe_value(value) {
            log::debug!("[livesync] dropping unsafe theme value for {}", name);
            continue;
        }
        style::set_property(root, name, value);
        written += 1;
    }
    written
}
