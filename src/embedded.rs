//! Embedded Sync Channel
//!
//! Live-edit protocol between the page and an embedding editor window.
//!
//! ## State machine
//!
//! `Inactive` (default) → `Active`, entered only when the page URL carries
//! the preview flag. There is no way back: the channel stays active for the
//! rest of the page load.
//!
//! ## Invariants
//!
//! 1. **Admission**: a message is dispatched only if its origin passes
//!    [`is_admissible_origin`]. Rejected messages touch nothing, including
//!    the parent origin.
//! 2. **Latch**: the first admitted origin becomes the parent origin; all
//!    outbound events go there, never to `*` once latched.
//! 3. **Order**: messages apply in arrival order, last applied wins.

use serde_json::Value;
use url::Url;

use crate::config::{Activation, SyncConfig};
use crate::error::ConfigError;
use crate::host::HostWindow;
use crate::manifest::{ItemIndex, SectionSchema};
use crate::message::{FullUpdate, InboundMessage, OutboundMessage};
use crate::origin::{is_admissible_origin, ParentOrigin};
use crate::routing::{route_field, route_section, RouteContext, RouteStats};
use crate::surface::{DomEvent, PageSurface};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Inactive,
    Active,
}

/// Outcome of handing a message to the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Channel inactive; nothing looked at
    Inactive,
    /// Origin failed the filter
    Rejected,
    /// Admitted but malformed or of an unknown kind
    Ignored,
    Applied,
}

/// What to do with a clicked link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkDecision {
    PassThrough,
    /// Navigation was redirected to this URL, which keeps the preview flag
    Navigate(String),
}

pub struct EmbeddedSyncChannel<S: PageSurface, H: HostWindow> {
    state: ChannelState,
    page_url: Url,
    page_origin: String,
    parent: ParentOrigin,
    config: SyncConfig,
    surface: S,
    host: H,
}

impl<S: PageSurface, H: HostWindow> EmbeddedSyncChannel<S, H> {
    /// Build the channel for a page and activate it if the URL asks for it.
    pub fn new(page_url: &str, config: SyncConfig, surface: S, host: H) -> Result<Self, ConfigError> {
        let url = Url::parse(page_url).map_err(|e| ConfigError::PageUrl {
            url: page_url.to_string(),
            source: e,
        })?;
        let activation = Activation::from_page_url(page_url, &config)?;

        let mut channel = Self {
            state: ChannelState::Inactive,
            page_origin: url.origin().ascii_serialization(),
            page_url: url,
            parent: ParentOrigin::new(),
            config,
            surface,
            host,
        };
        if activation.embedded {
            channel.activate();
        }
        Ok(channel)
    }

    fn activate(&mut self) {
        if self.state == ChannelState::Active {
            return;
        }
        self.state = ChannelState::Active;
        let bound = self.surface.bind_edit_surface();
        log::info!(
            "[livesync] embedded editing active for {} ({} editable nodes)",
            self.page_origin,
            bound
        );
        self.post(OutboundMessage::Ready);
    }

    pub fn state(&self) -> ChannelState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == ChannelState::Active
    }

    pub fn parent_origin(&self) -> Option<&str> {
        self.parent.get()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    fn post(&mut self, message: OutboundMessage) {
        self.host.post_to_parent(&message, self.parent.target());
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // INBOUND
    // ═══════════════════════════════════════════════════════════════════════════

    /// Handle one posted message from `origin`.
    pub fn handle_message(&mut self, origin: &str, data: &Value) -> Admission {
        if !self.is_active() {
            return Admission::Inactive;
        }
        if !is_admissible_origin(origin, &self.page_origin, &self.config) {
            log::warn!("[livesync] rejected message from origin '{}'", origin);
            return Admission::Rejected;
        }
        if self.parent.latch(origin) {
            log::info!("[livesync] parent origin latched to {}", origin);
        }

        match InboundMessage::from_value(data) {
            Some(InboundMessage::Unknown) | None => Admission::Ignored,
            Some(message) => {
                self.dispatch(message);
                Admission::Applied
            }
        }
    }

    fn dispatch(&mut self, message: InboundMessage) {
        match message {
            InboundMessage::FullUpdate(update) => {
                let stats = self.apply_full_update(&update);
                log::debug!("[livesync] full update applied: {:?}", stats);
            }
            InboundMessage::FieldUpdate {
                section_id,
                field,
                value,
            } => {
                route_field(
                    &mut self.surface,
                    &section_id,
                    &field,
                    &value,
                    RouteContext::default(),
                );
                if value.is_array() {
                    self.surface.bind_edit_surface();
                }
            }
            InboundMessage::SectionToggle {
                section_id,
                enabled,
            } => {
                self.surface.set_section_enabled(&section_id, enabled);
            }
            InboundMessage::StyleUpdate {
                section_id,
                field,
                styles,
            } => {
                self.surface.patch_style(&section_id, &field, &styles);
            }
            InboundMessage::SectionHighlight { section_id } => {
                self.surface.highlight_section(section_id.as_deref());
            }
            InboundMessage::ScrollToSection { section_id } => {
                if self.surface.has_section(&section_id) {
                    self.host.scroll_into_view(&section_id);
                }
            }
            InboundMessage::Unknown => {}
        }
    }

    /// Visibility first, then every section's fields, then re-bind editing
    /// since list rebuilds may have created nodes.
    fn apply_full_update(&mut self, update: &FullUpdate) -> RouteStats {
        for (section_id, state) in &update.sections {
            self.surface
                .set_section_enabled(section_id, state.enabled.unwrap_or(true));
        }

        let index = (!update.collections.is_empty()).then(|| ItemIndex::build(&update.collections));
        let mut stats = RouteStats::default();
        for (section_id, data) in &update.data {
            let schema = update
                .sections
                .get(section_id)
                .map(|s| SectionSchema::from_value(&s.schema))
                .unwrap_or_default();
            let ctx = RouteContext {
                schema: Some(&schema),
                items: index.as_ref(),
            };
            stats.merge(route_section(
                &mut self.surface,
                section_id,
                data,
                &self.config.theme_section,
                ctx,
            ));
        }

        self.surface.bind_edit_surface();
        stats
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // LOCAL INTERACTION
    // ═══════════════════════════════════════════════════════════════════════════

    /// Handle a user interaction on the page, forwarding the resulting
    /// events to the parent.
    pub fn handle_dom_event(&mut self, event: &DomEvent) {
        if !self.is_active() {
            return;
        }
        match event {
            DomEvent::Click { on_field } => {
                if !on_field {
                    self.post(OutboundMessage::Deselect);
                }
            }
            DomEvent::LinkClick { href } => {
                self.intercept_link(href);
            }
            _ => {
                for edit in self.surface.handle_edit_event(event) {
                    self.post(edit.into());
                }
            }
        }
    }

    /// Keep the preview flag on same-origin navigation. Hash-only links,
    /// foreign links and links already carrying the flag pass through.
    pub fn intercept_link(&mut self, href: &str) -> LinkDecision {
        if !self.is_active() {
            return LinkDecision::PassThrough;
        }
        let href = href.trim();
        if href.is_empty() || href.starts_with('#') {
            return LinkDecision::PassThrough;
        }
        let Ok(mut target) = self.page_url.join(href) else {
            return LinkDecision::PassThrough;
        };
        if target.origin() != self.page_url.origin() {
            return LinkDecision::PassThrough;
        }
        let preview_param = self.config.preview_param.as_str();
        if target.query_pairs().any(|(k, _)| k == preview_param) {
            return LinkDecision::PassThrough;
        }

        target.query_pairs_mut().append_pair(preview_param, "true");
        let rewritten = target.to_string();
        self.host.navigate(&rewritten);
        LinkDecision::Navigate(rewritten)
    }
}
