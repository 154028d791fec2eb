//! Platform seams: session construction, replies, ambient audio.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::audio::AmbientClip;
use crate::backends::{
    BackendSpec, InferenceGateway, NoiseFilter, Responder, Synthesizer, Transcriber,
    VoiceActivityDetector,
};
use crate::call::{CallContext, Participant};
use crate::error::PipelineError;
use crate::tools::{ToolExecutor, ToolSpec};

/// End-of-turn detection model.
///
/// Every session uses the multilingual end-of-utterance model, whatever
/// the transcription language.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnDetection {
    #[default]
    Multilingual,
}

/// Chooses the noise filter for each participant as they join.
///
/// The platform consults the policy per participant, so one session can
/// apply different filters to different callers.
pub trait NoiseFilterPolicy: Send + Sync {
    fn filter_for(&self, participant: &Participant) -> Arc<dyn NoiseFilter>;
}

/// Everything the platform needs to start a session for one call.
#[derive(Clone)]
pub struct SessionPlan {
    /// Agent name, for platform dispatch and logs.
    pub agent_name: String,
    pub stt: Arc<dyn Transcriber>,
    pub llm: Arc<dyn Responder>,
    pub tts: Arc<dyn Synthesizer>,
    /// Process-wide detector loaded at warm-up.
    pub vad: Arc<dyn VoiceActivityDetector>,
    pub turn_detection: TurnDetection,
    pub noise_filter: Arc<dyn NoiseFilterPolicy>,
}

/// Serializable view of a [`SessionPlan`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanSummary {
    pub agent_name: String,
    pub stt: BackendSpec,
    pub llm: BackendSpec,
    pub tts: BackendSpec,
    pub vad: String,
    pub turn_detection: TurnDetection,
}

impl SessionPlan {
    /// Summarize the plan for logging or printing.
    pub fn summary(&self) -> PlanSummary {
        PlanSummary {
            agent_name: self.agent_name.clone(),
            stt: self.stt.spec().clone(),
            llm: self.llm.spec().clone(),
            tts: self.tts.spec().clone(),
            vad: self.vad.name().to_string(),
            turn_detection: self.turn_detection,
        }
    }
}

impl std::fmt::Debug for SessionPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionPlan")
            .field("summary", &self.summary())
            .finish()
    }
}

/// Agent behavior handed to the session.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentSpec {
    /// Effective instructions (system prompt).
    pub instructions: String,
    /// Tools the reasoning backend may call.
    pub tools: Vec<ToolSpec>,
}

/// A running conversation session on the media platform.
#[async_trait]
pub trait MediaSession: Send + Sync {
    /// Start the session against the call.
    ///
    /// Tool invocations from the reasoning backend are routed to `tools`.
    async fn start(
        &self,
        plan: SessionPlan,
        agent: AgentSpec,
        tools: Arc<dyn ToolExecutor>,
    ) -> Result<(), PipelineError>;

    /// Ask the agent to produce a reply now, guided by `instructions`.
    async fn generate_reply(
        &self,
        instructions: &str,
        allow_interruptions: bool,
    ) -> Result<(), PipelineError>;
}

/// Background audio loop mixed under the conversation.
#[async_trait]
pub trait AmbientPlayer: Send + Sync {
    /// Start looping `clip` at `volume` (0.0 - 1.0).
    async fn start(&self, clip: AmbientClip, volume: f32) -> Result<(), PipelineError>;
}

/// The external media platform the worker is registered with.
#[async_trait]
pub trait MediaPlatform: Send + Sync {
    /// Wait for the platform to dispatch the next call to this worker.
    ///
    /// Returns `None` once the platform stops dispatching.
    async fn next_call(&self) -> Option<CallContext>;

    /// Load the voice-activity detector. Called once per worker process.
    fn load_vad(&self) -> Result<Arc<dyn VoiceActivityDetector>, PipelineError>;

    /// Gateway to the remote inference engines.
    fn inference(&self) -> Arc<dyn InferenceGateway>;

    /// Create an (unstarted) session for a call.
    async fn create_session(
        &self,
        ctx: &CallContext,
    ) -> Result<Arc<dyn MediaSession>, PipelineError>;

    /// Create the ambient audio player for a call.
    async fn ambient_player(
        &self,
        ctx: &CallContext,
    ) -> Result<Arc<dyn AmbientPlayer>, PipelineError>;
}
