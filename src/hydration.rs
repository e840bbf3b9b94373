//! Remote Hydration Channel
//!
//! One-shot: fetch a manifest from the URL named on the page, validate it,
//! and replay it through the same routing as an embedded full update.
//!
//! Every failure (insecure reference, fetch error, non-success status,
//! malformed body) is terminal for the load and happens before the first
//! DOM mutation. There is no retry.

use serde_json::Value;
use url::Url;

use crate::config::{Activation, SyncConfig};
use crate::error::{ConfigError, FetchError, HydrationError};
use crate::manifest::{ManifestDocument, ManifestStore};
use crate::routing::{route_section, RouteContext, RouteStats};
use crate::surface::PageSurface;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The single fetch primitive hydration needs.
#[allow(async_fn_in_trait)]
pub trait ManifestFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchResponse, FetchError>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HydrationReport {
    pub sections: usize,
    pub disabled: usize,
    pub theme_applied: bool,
    pub stats: RouteStats,
}

/// Accept `https` references, and `http` only toward loopback hosts.
pub fn validate_reference(reference: &str, config: &SyncConfig) -> Result<Url, HydrationError> {
    let insecure = || {
        log::warn!(
            "[livesync] refusing manifest reference '{}': not https or loopback",
            reference
        );
        HydrationError::InsecureReference(reference.to_string())
    };

    let url = Url::parse(reference).map_err(|_| insecure())?;
    match url.scheme() {
        "https" => Ok(url),
        "http" if url.host_str().is_some_and(|h| config.is_loopback_host(h)) => Ok(url),
        _ => Err(insecure()),
    }
}

/// Reject bodies that are not an object with a `sections` array; decode
/// everything else leniently.
pub fn parse_manifest(body: &str) -> Result<ManifestDocument, HydrationError> {
    let value: Value = serde_json::from_str(body).map_err(HydrationError::InvalidJson)?;
    let Value::Object(ref map) = value else {
        return Err(HydrationError::Malformed("manifest is not an object".into()));
    };
    if !map.get("sections").is_some_and(Value::is_array) {
        return Err(HydrationError::Malformed("missing sections array".into()));
    }
    Ok(ManifestDocument::from_value(&value))
}

/// Apply a validated manifest: theme first, then each section's visibility
/// followed by its fields.
pub fn apply_manifest<S: PageSurface + ?Sized>(
    surface: &mut S,
    doc: &ManifestDocument,
    config: &SyncConfig,
) -> HydrationReport {
    let mut report = HydrationReport::default();
    let index = doc.item_index();

    if let Some(theme) = doc.section(&config.theme_section) {
        let stats = route_section(
            surface,
            &theme.id,
            &theme.data,
            &config.theme_section,
            RouteContext::default(),
        );
        report.theme_applied = stats.theme_properties > 0;
        report.stats.merge(stats);
    }

    for section in &doc.sections {
        if section.id == config.theme_section {
            continue;
        }
        let enabled = doc.section_enabled(&section.id);
        surface.set_section_enabled(&section.id, enabled);
        if !enabled {
            report.disabled += 1;
        }

        let schema = doc.section_schema(&section.id);
        let ctx = RouteContext {
            schema: Some(&schema),
            items: Some(&index),
        };
        report.stats.merge(route_section(
            surface,
            &section.id,
            &section.data,
            &config.theme_section,
            ctx,
        ));
        report.sections += 1;
    }

    report
}

/// Validate a fetched response and apply it. Shared by the async path and
/// hosts that perform the fetch themselves.
pub fn apply_manifest_response<S: PageSurface + ?Sized>(
    surface: &mut S,
    status: u16,
    body: &str,
    config: &SyncConfig,
) -> Result<HydrationReport, HydrationError> {
    let response = FetchResponse {
        status,
        body: body.to_string(),
    };
    let doc = check_response(&response)?;
    Ok(apply_manifest(surface, &doc, config))
}

fn check_response(response: &FetchResponse) -> Result<ManifestDocument, HydrationError> {
    if !response.is_success() {
        log::error!("[livesync] manifest fetch returned status {}", response.status);
        return Err(HydrationError::Status(response.status));
    }
    parse_manifest(&response.body).inspect_err(|e| {
        log::error!("[livesync] {}", e);
    })
}

/// Validate `reference`, fetch it once and apply the result.
pub async fn hydrate<S, F>(
    surface: &mut S,
    fetcher: &F,
    reference: &str,
    config: &SyncConfig,
) -> Result<HydrationReport, HydrationError>
where
    S: PageSurface + ?Sized,
    F: ManifestFetcher + ?Sized,
{
    let url = validate_reference(reference, config)?;

    let response = fetcher.fetch(&url).await.map_err(|e| {
        log::error!("[livesync] manifest fetch from {} failed: {}", url, e);
        HydrationError::from(e)
    })?;
    let doc = check_response(&response)?;

    let report = apply_manifest(surface, &doc, config);
    log::info!(
        "[livesync] hydrated {} sections from {} ({} fields, {} lists)",
        report.sections,
        url,
        report.stats.fields,
        report.stats.lists
    );
    Ok(report)
}

/// A pending hydration, present only when the page URL names a manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteHydration {
    reference: String,
}

impl RemoteHydration {
    pub fn from_page_url(page_url: &str, config: &SyncConfig) -> Result<Option<Self>, ConfigError> {
        let activation = Activation::from_page_url(page_url, config)?;
        Ok(activation.manifest_ref.map(|reference| Self { reference }))
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub async fn run<S, F>(
        self,
        surface: &mut S,
        fetcher: &F,
        config: &SyncConfig,
    ) -> Result<HydrationReport, HydrationError>
    where
        S: PageSurface + ?Sized,
        F: ManifestFetcher + ?Sized,
    {
        hydrate(surface, fetcher, &self.reference, config).await
    }
}
