//! Built-in backend catalog.
//!
//! Each binding records the selected provider/model and forwards work to
//! the platform's [`InferenceGateway`]; the engines themselves run
//! outside this process.

use std::sync::Arc;

use agent_config::AgentConfig;
use async_trait::async_trait;
use tracing::info;
use voice_core::{
    AudioFrame, BackendKind, BackendRegistry, BackendSpec, InferenceGateway, NoiseFilter,
    PipelineError, ResponseAction, ResponseRequest, Responder, SessionPlan, Synthesizer,
    Transcriber, TurnDetection, VoiceActivityDetector,
};

use crate::noise::{NoiseFilterKind, ParticipantNoisePolicy};

const STT_PROVIDERS: [&str; 3] = ["assemblyai", "deepgram", "cartesia"];
const LLM_PROVIDERS: [&str; 2] = ["openai", "google"];
const TTS_PROVIDERS: [&str; 3] = ["elevenlabs", "cartesia", "rime"];

pub struct GatewayTranscriber {
    spec: BackendSpec,
    gateway: Arc<dyn InferenceGateway>,
}

impl GatewayTranscriber {
    pub fn new(spec: BackendSpec, gateway: Arc<dyn InferenceGateway>) -> Self {
        Self { spec, gateway }
    }
}

#[async_trait]
impl Transcriber for GatewayTranscriber {
    fn spec(&self) -> &BackendSpec {
        &self.spec
    }

    async fn transcribe(&self, frame: &AudioFrame) -> Result<Option<String>, PipelineError> {
        self.gateway.transcribe(&self.spec, frame).await
    }
}

pub struct GatewayResponder {
    spec: BackendSpec,
    gateway: Arc<dyn InferenceGateway>,
}

impl GatewayResponder {
    pub fn new(spec: BackendSpec, gateway: Arc<dyn InferenceGateway>) -> Self {
        Self { spec, gateway }
    }
}

#[async_trait]
impl Responder for GatewayResponder {
    fn spec(&self) -> &BackendSpec {
        &self.spec
    }

    async fn respond(&self, request: ResponseRequest) -> Result<ResponseAction, PipelineError> {
        self.gateway.respond(&self.spec, request).await
    }
}

pub struct GatewaySynthesizer {
    spec: BackendSpec,
    gateway: Arc<dyn InferenceGateway>,
}

impl GatewaySynthesizer {
    pub fn new(spec: BackendSpec, gateway: Arc<dyn InferenceGateway>) -> Self {
        Self { spec, gateway }
    }
}

#[async_trait]
impl Synthesizer for GatewaySynthesizer {
    fn spec(&self) -> &BackendSpec {
        &self.spec
    }

    async fn synthesize(&self, text: &str) -> Result<AudioFrame, PipelineError> {
        self.gateway.synthesize(&self.spec, text).await
    }
}

pub struct GatewayNoiseFilter {
    kind: NoiseFilterKind,
    gateway: Arc<dyn InferenceGateway>,
}

impl GatewayNoiseFilter {
    pub fn new(kind: NoiseFilterKind, gateway: Arc<dyn InferenceGateway>) -> Self {
        Self { kind, gateway }
    }
}

impl NoiseFilter for GatewayNoiseFilter {
    fn name(&self) -> &str {
        self.kind.as_str()
    }

    fn process(&self, frame: &mut AudioFrame) {
        self.gateway.denoise(self.kind.as_str(), frame);
    }
}

/// The closed set of STT, LLM and TTS providers this worker can drive.
pub struct BackendCatalog {
    gateway: Arc<dyn InferenceGateway>,
    stt: BackendRegistry<dyn Transcriber>,
    llm: BackendRegistry<dyn Responder>,
    tts: BackendRegistry<dyn Synthesizer>,
}

impl BackendCatalog {
    /// Register every built-in provider against `gateway`.
    pub fn new(gateway: Arc<dyn InferenceGateway>) -> Self {
        let mut stt = BackendRegistry::new(
            BackendKind::Stt,
            fixed_spec("assemblyai", "universal-streaming"),
            stt_binding(&gateway),
        );
        for provider in STT_PROVIDERS {
            stt.register(provider, stt_binding(&gateway));
        }

        let mut llm = BackendRegistry::new(
            BackendKind::Llm,
            fixed_spec("openai", "gpt-4.1-mini"),
            llm_binding(&gateway),
        );
        for provider in LLM_PROVIDERS {
            llm.register(provider, llm_binding(&gateway));
        }

        let mut tts = BackendRegistry::new(
            BackendKind::Tts,
            fixed_spec("elevenlabs", "eleven_turbo_v2"),
            tts_binding(&gateway),
        );
        for provider in TTS_PROVIDERS {
            tts.register(provider, tts_binding(&gateway));
        }

        Self {
            gateway,
            stt,
            llm,
            tts,
        }
    }

    pub fn stt(&self) -> &BackendRegistry<dyn Transcriber> {
        &self.stt
    }

    pub fn llm(&self) -> &BackendRegistry<dyn Responder> {
        &self.llm
    }

    pub fn tts(&self) -> &BackendRegistry<dyn Synthesizer> {
        &self.tts
    }

    /// Build the session plan for a resolved configuration.
    ///
    /// Model strings naming unknown providers resolve to the registry
    /// defaults; language and voice hints are kept either way.
    pub fn plan(&self, config: &AgentConfig, vad: Arc<dyn VoiceActivityDetector>) -> SessionPlan {
        let stt = self
            .stt
            .build(self.stt.select(&config.stt_model).with_language(&config.stt_language));
        let llm = self.llm.resolve(&config.llm_model);
        let tts = self.tts.build(
            self.tts
                .select(&config.tts_model)
                .with_voice(&config.tts_voice_id)
                .with_language(&config.tts_language),
        );

        let plan = SessionPlan {
            agent_name: config.agent_name.clone(),
            stt,
            llm,
            tts,
            vad,
            turn_detection: TurnDetection::default(),
            noise_filter: Arc::new(ParticipantNoisePolicy::new(self.gateway.clone())),
        };
        info!(
            "Session plan for {}: stt={} llm={} tts={}",
            plan.agent_name,
            plan.stt.spec().model_string(),
            plan.llm.spec().model_string(),
            plan.tts.spec().model_string()
        );
        plan
    }
}

fn fixed_spec(provider: &str, model: &str) -> BackendSpec {
    BackendSpec {
        provider: provider.to_string(),
        model: model.to_string(),
        variant: None,
        language: None,
        voice: None,
    }
}

fn stt_binding(
    gateway: &Arc<dyn InferenceGateway>,
) -> impl Fn(BackendSpec) -> Arc<dyn Transcriber> + Send + Sync + 'static {
    let gateway = gateway.clone();
    move |spec: BackendSpec| -> Arc<dyn Transcriber> {
        Arc::new(GatewayTranscriber::new(spec, gateway.clone()))
    }
}

fn llm_binding(
    gateway: &Arc<dyn InferenceGateway>,
) -> impl Fn(BackendSpec) -> Arc<dyn Responder> + Send + Sync + 'static {
    let gateway = gateway.clone();
    move |spec: BackendSpec| -> Arc<dyn Responder> {
        Arc::new(GatewayResponder::new(spec, gateway.clone()))
    }
}

fn tts_binding(
    gateway: &Arc<dyn InferenceGateway>,
) -> impl Fn(BackendSpec) -> Arc<dyn Synthesizer> + Send + Sync + 'static {
    let gateway = gateway.clone();
    move |spec: BackendSpec| -> Arc<dyn Synthesizer> {
        Arc::new(GatewaySynthesizer::new(spec, gateway.clone()))
    }
}
