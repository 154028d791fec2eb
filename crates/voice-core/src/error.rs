//! Error types for platform and backend operations.

use thiserror::Error;

/// Errors that can occur while talking to the media platform or a backend.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The platform or backend is temporarily unavailable.
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// A backend rejected or failed a request.
    #[error("{backend} backend failed: {reason}")]
    Backend { backend: String, reason: String },

    /// The session could not be started.
    #[error("session start failed: {0}")]
    SessionStart(String),

    /// The call has already been torn down.
    #[error("call closed")]
    CallClosed,
}
