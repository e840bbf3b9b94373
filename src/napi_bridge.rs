//! Node bindings
//!
//! Exposes the embedded channel as a `PreviewSession` class driving an
//! `HtmlPage`, with host side effects queued for JavaScript to perform, and
//! the hydration apply step as a plain function.

use napi_derive::napi;

use crate::config::SyncConfig;
use crate::embedded::{Admission, EmbeddedSyncChannel};
use crate::host::RecordingHost;
use crate::hydration::{apply_manifest_response, validate_reference, RemoteHydration};
use crate::page::HtmlPage;
use crate::surface::DomEvent;

fn to_napi<E: std::fmt::Display>(e: E) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn config_from(value: Option<serde_json::Value>) -> napi::Result<SyncConfig> {
    match value {
        Some(value) => serde_json::from_value(value).map_err(to_napi),
        None => Ok(SyncConfig::default()),
    }
}

#[napi]
pub struct PreviewSession {
    channel: EmbeddedSyncChannel<HtmlPage, RecordingHost>,
}

#[napi]
impl PreviewSession {
    #[napi(constructor)]
    pub fn new(
        html: String,
        page_url: String,
        config: Option<serde_json::Value>,
    ) -> napi::Result<Self> {
        let config = config_from(config)?;
        let page = HtmlPage::with_config(&html, config.clone());
        let channel = EmbeddedSyncChannel::new(&page_url, config, page, RecordingHost::new())
            .map_err(to_napi)?;
        Ok(Self { channel })
    }

    #[napi(getter)]
    pub fn active(&self) -> bool {
        self.channel.is_active()
    }

    #[napi(getter)]
    pub fn parent_origin(&self) -> Option<String> {
        self.channel.parent_origin().map(str::to_string)
    }

    /// Returns true when the message was admitted and applied.
    #[napi]
    pub fn handle_message(&mut self, origin: String, data: serde_json::Value) -> bool {
        self.channel.handle_message(&origin, &data) == Admission::Applied
    }

    #[napi]
    pub fn dispatch_event(&mut self, event: serde_json::Value) -> napi::Result<()> {
        let event: DomEvent = serde_json::from_value(event).map_err(to_napi)?;
        self.channel.handle_dom_event(&event);
        Ok(())
    }

    #[napi]
    pub fn drain_effects(&mut self) -> napi::Result<serde_json::Value> {
        let effects = self.channel.host_mut().drain();
        serde_json::to_value(effects).map_err(to_napi)
    }

    #[napi]
    pub fn html(&self) -> String {
        self.channel.surface().to_html()
    }
}

/// Apply a manifest the host already fetched for `page_url` and return the
/// hydrated HTML. Fails without touching the page on an insecure reference,
/// a non-success status or a malformed body.
#[napi]
pub fn hydrate_manifest_native(
    html: String,
    page_url: String,
    status: u32,
    body: String,
    config: Option<serde_json::Value>,
) -> napi::Result<String> {
    let config = config_from(config)?;
    if let Some(pending) = RemoteHydration::from_page_url(&page_url, &config).map_err(to_napi)? {
        validate_reference(pending.reference(), &config).map_err(to_napi)?;
    }

    let status = u16::try_from(status).map_err(to_napi)?;
    let mut page = HtmlPage::with_config(&html, config.clone());
    apply_manifest_response(&mut page, status, &body, &config).map_err(to_napi)?;
    Ok(page.to_html())
}

#[napi]
pub fn livesync_bridge() -> String {
    format!("livesync native bridge {}", env!("CARGO_PKG_VERSION"))
}
