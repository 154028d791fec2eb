//! Error types for configuration fetches.

use std::time::Duration;

use thiserror::Error;

/// Reasons a remote configuration fetch fell back to defaults.
///
/// These never cross [`ConfigResolver::resolve`](crate::ConfigResolver::resolve);
/// they exist so the fallback can be logged with its cause.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Endpoint URL or token not set.
    #[error("missing setting: {0}")]
    MissingSetting(&'static str),

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Endpoint answered with something other than 200.
    #[error("unexpected status {0}")]
    Status(u16),

    /// Body was not a JSON object.
    #[error("invalid body: {0}")]
    InvalidBody(String),

    /// The fetch did not complete in time.
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}
