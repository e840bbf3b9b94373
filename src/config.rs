//! Sync Configuration
//!
//! Attribute vocabulary, activation parameters and trust lists shared by
//! both transports. Every field has a default so hosts only override what
//! differs from the stock renderer output.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ConfigError;

/// Attribute names the rendering layer stamps onto the page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AddressVocabulary {
    pub section: String,
    pub field: String,
    pub list: String,
    pub list_item: String,
    pub style_target: String,
    /// Marker left on fields that were rendered hidden because they were empty
    pub empty_marker: String,
}

impl Default for AddressVocabulary {
    fn default() -> Self {
        Self {
            section: "data-section-id".to_string(),
            field: "data-field".to_string(),
            list: "data-list".to_string(),
            list_item: "data-list-item".to_string(),
            style_target: "data-style-target".to_string(),
            empty_marker: "data-field-empty".to_string(),
        }
    }
}

/// Visual affordances written as inline styles while editing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Affordances {
    pub highlight_outline: String,
    pub focus_outline: String,
    pub hover_outline: String,
}

impl Default for Affordances {
    fn default() -> Self {
        Self {
            highlight_outline: "2px solid #3b82f6".to_string(),
            focus_outline: "2px dashed #3b82f6".to_string(),
            hover_outline: "2px solid #f59e0b".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SyncConfig {
    /// Query parameter that marks the page as embedded in the editor
    pub preview_param: String,
    /// Query parameter carrying the remote manifest URL
    pub manifest_param: String,
    /// Section id whose data is a theme record rather than fields
    pub theme_section: String,
    /// Hostname suffixes of deployment platforms trusted as editor origins
    pub trusted_suffixes: Vec<String>,
    /// Hosts treated as loopback / local development
    pub loopback_hosts: Vec<String>,
    pub vocabulary: AddressVocabulary,
    pub affordances: Affordances,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            preview_param: "preview".to_string(),
            manifest_param: "manifest".to_string(),
            theme_section: "theme".to_string(),
            trusted_suffixes: vec![
                ".vercel.app".to_string(),
                ".netlify.app".to_string(),
                ".pages.dev".to_string(),
                ".github.io".to_string(),
            ],
            loopback_hosts: vec![
                "localhost".to_string(),
                "127.0.0.1".to_string(),
                "[::1]".to_string(),
                "0.0.0.0".to_string(),
            ],
            vocabulary: AddressVocabulary::default(),
            affordances: Affordances::default(),
        }
    }
}

impl SyncConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(ConfigError::Invalid)
    }

    pub fn is_loopback_host(&self, host: &str) -> bool {
        self.loopback_hosts.iter().any(|h| h.eq_ignore_ascii_case(host))
    }

    pub fn is_trusted_platform_host(&self, host: &str) -> bool {
        let host = host.to_ascii_lowercase();
        self.trusted_suffixes.iter().any(|s| host.ends_with(s.as_str()))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ACTIVATION
// ═══════════════════════════════════════════════════════════════════════════════

/// What the page URL asks for at load time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Activation {
    pub embedded: bool,
    pub manifest_ref: Option<String>,
}

impl Activation {
    /// Read the activation triggers from the page's own URL.
    ///
    /// The preview flag counts as set for any value except `0` and `false`,
    /// so both `?preview` and `?preview=true` activate the embedded channel.
    pub fn from_page_url(page_url: &str, config: &SyncConfig) -> Result<Self, ConfigError> {
        let url = Url::parse(page_url).map_err(|e| ConfigError::PageUrl {
            url: page_url.to_string(),
            source: e,
        })?;

        let mut activation = Activation::default();
        for (key, value) in url.query_pairs() {
            if key == config.preview_param.as_str() {
                activation.embedded = !matches!(value.as_ref(), "0" | "false");
            } else if key == config.manifest_param.as_str() && !value.is_empty() {
                activation.manifest_ref = Some(value.into_owned());
            }
        }
        Ok(activation)
    }
}
