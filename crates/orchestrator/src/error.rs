//! Error types for orchestrator operations.

use thiserror::Error;
use voice_core::PipelineError;

use crate::state::SessionState;

/// Errors that can occur while bringing a call up.
///
/// Configuration and tool problems never show up here; they degrade to
/// defaults and spoken explanations instead.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Process warm-up failed.
    #[error("warm-up failed: {0}")]
    Warmup(PipelineError),

    /// The platform could not create or start the session.
    #[error("session error: {0}")]
    Session(#[from] PipelineError),

    /// The call ended before the session became active.
    #[error("call {0} closed during setup")]
    ClosedDuringSetup(String),

    /// A state transition that the lifecycle does not allow.
    #[error("invalid transition {from} -> {to}")]
    InvalidTransition { from: SessionState, to: SessionState },
}
