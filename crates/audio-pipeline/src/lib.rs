//! Audio pipeline assembly for one call.
//!
//! - [`ParticipantNoisePolicy`] picks a noise filter for each participant
//!   as they join: phone callers get the telephony-tuned filter.
//! - [`select_ambient_clip`] / [`start_ambient`] map the configured clip
//!   name to an ambient loop under the conversation.
//! - [`BackendCatalog`] holds the closed STT/LLM/TTS registries and turns
//!   an `AgentConfig` into a `SessionPlan`.

mod ambient;
mod catalog;
mod noise;

pub use ambient::{select_ambient_clip, start_ambient};
pub use catalog::{
    BackendCatalog, GatewayNoiseFilter, GatewayResponder, GatewaySynthesizer, GatewayTranscriber,
};
pub use noise::{select_noise_filter, NoiseFilterKind, ParticipantNoisePolicy};
