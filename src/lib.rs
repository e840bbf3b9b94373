//! # Live Sync Native
//!
//! Keeps a server-rendered page in step with an external content manifest.
//!
//! Two transports feed the same reconciliation primitives:
//!
//! - **Embedded channel** ([`EmbeddedSyncChannel`]): the page runs inside an
//!   editor window and receives incremental cross-window messages; local
//!   edits flow back out.
//! - **Remote hydration** ([`hydrate`]): the page fetches a full manifest
//!   once and replays it.
//!
//! Both drive the page only through [`PageSurface`]. [`HtmlPage`] implements
//! it against an html5ever tree.
//!
//! ## Addressing
//!
//! 1. **Sections**: `data-section-id` scopes every lookup.
//! 2. **Fields**: `data-field` holds a dotted path (`title`, `cta.href`,
//!    `gallery.0.src`). Several nodes may share one address; all are written.
//! 3. **Lists**: `data-list` containers rebuilt from their first
//!    `data-list-item` child. Node identity never survives a rebuild.
//! 4. **Style targets**: `data-style-target`, or `__section` for the section
//!    root. Only allow-listed properties are written.
//!
//! Address misses are never errors. The only fallible operations are
//! configuration and hydration transport validation.

#[cfg(feature = "napi")]
mod napi_bridge;

pub mod applier;
pub mod config;
pub mod edit_surface;
pub mod embedded;
pub mod error;
pub mod host;
pub mod hydration;
pub mod list;
pub mod locator;
pub mod manifest;
pub mod message;
pub mod origin;
pub mod page;
pub mod routing;
pub mod section;
pub mod style;
pub mod surface;
pub mod theme;
pub mod tree;

#[cfg(feature = "http")]
pub mod http;

#[cfg(test)]
mod testing;
#[cfg(test)]
mod sync_tests;

pub use config::{Activation, AddressVocabulary, Affordances, SyncConfig};
pub use embedded::{Admission, ChannelState, EmbeddedSyncChannel, LinkDecision};
pub use error::{ConfigError, FetchError, HydrationError};
pub use host::{HostEffect, HostWindow, RecordingHost};
pub use hydration::{
    apply_manifest, apply_manifest_response, hydrate, FetchResponse, HydrationReport,
    ManifestFetcher, RemoteHydration,
};
pub use manifest::{ManifestDocument, ManifestStore};
pub use message::{InboundMessage, OutboundMessage};
pub use page::HtmlPage;
pub use surface::{DomEvent, EditEvent, ElementKind, PageSurface};
pub use theme::ThemeRecord;

#[cfg(feature = "http")]
pub use http::HttpManifestFetcher;

#[cfg(feature = "napi")]
pub use napi_bridge::{hydrate_manifest_native, livesync_bridge, PreviewSession};
