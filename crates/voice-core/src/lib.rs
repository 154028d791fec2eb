//! Core traits and types for the voice agent worker.
//!
//! This crate provides the shared interface between the session
//! orchestrator and the external media platform. It defines:
//!
//! - [`CallContext`] / [`CallController`] - Read and write sides of one live call
//! - [`Participant`] / [`ParticipantKind`] - Who joined the call and how
//! - [`Transcriber`], [`Responder`], [`Synthesizer`], [`NoiseFilter`],
//!   [`VoiceActivityDetector`] - Capability interfaces for pluggable backends
//! - [`BackendRegistry`] - Closed name-to-constructor registry for those backends
//! - [`MediaPlatform`], [`MediaSession`], [`AmbientPlayer`] - Platform seams
//! - [`ToolExecutor`] - Trait for the tool-call side channel
//! - [`PipelineError`] - Error type for platform and backend operations
//!
//! # Example
//!
//! ```rust
//! use voice_core::{CallController, Participant, ParticipantKind};
//!
//! let controller = CallController::new("job-1");
//! let ctx = controller.context();
//! assert!(ctx.room_name().is_none());
//!
//! controller.set_room_name("call-_+15551234567_abc");
//! assert_eq!(ctx.room_name().as_deref(), Some("call-_+15551234567_abc"));
//!
//! let caller = Participant::new("sip_+15551234567", ParticipantKind::Sip);
//! assert!(caller.kind.is_telephony());
//! ```

mod audio;
mod backends;
mod call;
mod error;
mod fingerprint;
mod session;
mod tools;

pub use audio::{AmbientClip, AudioFrame};
pub use backends::{
    BackendKind, BackendRegistry, BackendSpec, InferenceGateway, NoiseFilter, ResponseAction,
    ResponseRequest, Responder, Speaker, Synthesizer, Transcriber, Turn, VoiceActivityDetector,
};
pub use call::{CallContext, CallController, Participant, ParticipantKind};
pub use error::PipelineError;
pub use fingerprint::fingerprint_instructions;
pub use session::{
    AgentSpec, AmbientPlayer, MediaPlatform, MediaSession, NoiseFilterPolicy, PlanSummary,
    SessionPlan, TurnDetection,
};
pub use tools::{ToolExecutor, ToolRequest, ToolResult, ToolSpec};

// Re-export async_trait for convenience
pub use async_trait::async_trait;
