//! Origin Admission
//!
//! Decides which message origins the embedded channel accepts, and holds
//! the parent origin latched from the first accepted message.

use std::cell::OnceCell;

use url::Url;

use crate::config::SyncConfig;

/// Accept the page's own origin, loopback/development hosts, trusted
/// deployment platforms, and any https origin.
pub fn is_admissible_origin(origin: &str, page_origin: &str, config: &SyncConfig) -> bool {
    if origin == page_origin {
        return true;
    }
    let Ok(url) = Url::parse(origin) else {
        return false;
    };
    let Some(host) = url.host_str() else {
        return false;
    };
    if config.is_loopback_host(host) || config.is_trusted_platform_host(host) {
        return true;
    }
    url.scheme() == "https"
}

/// Origin of the embedding editor, set at most once per page load.
#[derive(Debug, Default)]
pub struct ParentOrigin {
    latched: OnceCell<String>,
}

impl ParentOrigin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latch `origin` if nothing is latched yet. Returns true on the
    /// transition, false if an origin was already held.
    pub fn latch(&self, origin: &str) -> bool {
        self.latched.set(origin.to_string()).is_ok()
    }

    pub fn get(&self) -> Option<&str> {
        self.latched.get().map(String::as_str)
    }

    /// Target for outbound posts: the latched origin, or `*` before any
    /// message has been accepted.
    pub fn target(&self) -> &str {
        self.get().unwrap_or("*")
    }
}
