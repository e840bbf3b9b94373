//! Error types
//!
//! Only transport validation and configuration can fail. Address misses and
//! value shape mismatches are not errors: they degrade to "that update did
//! not happen" and are reported through return values and logs.

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid page url '{url}': {source}")]
    PageUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid sync config: {0}")]
    Invalid(#[source] serde_json::Error),
}

/// Failure of the underlying fetch primitive.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("failed to read response body: {0}")]
    Body(String),
}

/// Terminal failure of a remote hydration attempt.
///
/// Every variant is raised before any DOM mutation happens.
#[derive(Debug, thiserror::Error)]
pub enum HydrationError {
    #[error("manifest reference '{0}' is neither https nor loopback")]
    InsecureReference(String),

    #[error("manifest fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("manifest fetch returned status {0}")]
    Status(u16),

    #[error("manifest body is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("malformed manifest: {0}")]
    Malformed(String),
}
