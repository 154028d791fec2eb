//! Capability interfaces for pluggable backends and their registry.
//!
//! Backends are chosen by configuration strings of the form
//! `provider/model[:variant]` (for example `deepgram/nova-3:en`). A
//! [`BackendRegistry`] maps the provider part to a constructor. The set
//! of providers is closed: an unknown or malformed name resolves to the
//! registry's default entry instead of failing.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::audio::AudioFrame;
use crate::error::PipelineError;
use crate::tools::ToolSpec;

/// Which capability a backend provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Stt,
    Llm,
    Tts,
    NoiseFilter,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BackendKind::Stt => "stt",
            BackendKind::Llm => "llm",
            BackendKind::Tts => "tts",
            BackendKind::NoiseFilter => "noise-filter",
        };
        f.write_str(name)
    }
}

/// A parsed backend selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendSpec {
    /// Provider name, lowercased (`deepgram`, `openai`, ...).
    pub provider: String,
    /// Model name within the provider.
    pub model: String,
    /// Optional variant suffix after `:`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
    /// Language hint, for STT and TTS.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Voice identifier, for TTS.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
}

impl BackendSpec {
    /// Parse a `provider/model[:variant]` string.
    ///
    /// Returns `None` when either the provider or the model part is empty.
    pub fn parse(model_string: &str) -> Option<Self> {
        let (provider, rest) = model_string.trim().split_once('/')?;
        let provider = provider.trim().to_lowercase();
        let (model, variant) = match rest.split_once(':') {
            Some((model, variant)) => (model.trim(), Some(variant.trim())),
            None => (rest.trim(), None),
        };
        if provider.is_empty() || model.is_empty() {
            return None;
        }
        Some(Self {
            provider,
            model: model.to_string(),
            variant: variant.filter(|v| !v.is_empty()).map(str::to_string),
            language: None,
            voice: None,
        })
    }

    /// Attach a language hint.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Attach a voice identifier.
    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = Some(voice.into());
        self
    }

    /// Render back into `provider/model[:variant]` form.
    pub fn model_string(&self) -> String {
        match &self.variant {
            Some(variant) => format!("{}/{}:{}", self.provider, self.model, variant),
            None => format!("{}/{}", self.provider, self.model),
        }
    }
}

/// Who spoke a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    Caller,
    Agent,
    Tool,
}

/// One utterance in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
}

impl Turn {
    /// Create a turn.
    pub fn new(speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            speaker,
            text: text.into(),
        }
    }
}

/// Input to a reasoning backend.
#[derive(Debug, Clone)]
pub struct ResponseRequest {
    /// Agent instructions (system prompt).
    pub instructions: String,
    /// Conversation so far, oldest first.
    pub turns: Vec<Turn>,
    /// Extra instructions for this reply only (e.g. the greeting).
    pub reply_instructions: Option<String>,
    /// Tools the backend may call.
    pub tools: Vec<ToolSpec>,
}

/// What a reasoning backend decided to do.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseAction {
    /// Speak this text.
    Say(String),
    /// Invoke a tool with these arguments.
    CallTool {
        name: String,
        arguments: HashMap<String, Value>,
    },
}

/// Speech-to-text.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// The selection this transcriber was built from.
    fn spec(&self) -> &BackendSpec;

    /// Transcribe a frame. `None` means no final transcript yet.
    async fn transcribe(&self, frame: &AudioFrame) -> Result<Option<String>, PipelineError>;
}

/// Reasoning (LLM).
#[async_trait]
pub trait Responder: Send + Sync {
    /// The selection this responder was built from.
    fn spec(&self) -> &BackendSpec;

    /// Decide the next agent action.
    async fn respond(&self, request: ResponseRequest) -> Result<ResponseAction, PipelineError>;
}

/// Text-to-speech.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// The selection this synthesizer was built from.
    fn spec(&self) -> &BackendSpec;

    /// Render text to audio.
    async fn synthesize(&self, text: &str) -> Result<AudioFrame, PipelineError>;
}

/// Noise cancellation applied to inbound participant audio.
pub trait NoiseFilter: Send + Sync {
    /// Filter name as known to the platform.
    fn name(&self) -> &str;

    /// Filter a frame in place.
    fn process(&self, frame: &mut AudioFrame);
}

/// Voice-activity detection.
pub trait VoiceActivityDetector: Send + Sync {
    /// Detector name.
    fn name(&self) -> &str;

    /// Whether the frame contains speech.
    fn is_speech(&self, frame: &AudioFrame) -> bool;
}

/// Remote inference engines reached through the media platform.
///
/// The engines themselves are external; this is the narrow interface the
/// built-in bindings call through.
#[async_trait]
pub trait InferenceGateway: Send + Sync {
    async fn transcribe(
        &self,
        spec: &BackendSpec,
        frame: &AudioFrame,
    ) -> Result<Option<String>, PipelineError>;

    async fn respond(
        &self,
        spec: &BackendSpec,
        request: ResponseRequest,
    ) -> Result<ResponseAction, PipelineError>;

    async fn synthesize(&self, spec: &BackendSpec, text: &str)
        -> Result<AudioFrame, PipelineError>;

    /// Run the named noise filter over a frame.
    fn denoise(&self, filter: &str, frame: &mut AudioFrame);
}

type Constructor<T> = Arc<dyn Fn(BackendSpec) -> Arc<T> + Send + Sync>;

/// Closed registry mapping provider names to constructors.
///
/// A registry is created together with its default entry, so resolution
/// never fails: unknown providers and malformed strings fall back to it.
pub struct BackendRegistry<T: ?Sized> {
    kind: BackendKind,
    constructors: HashMap<String, Constructor<T>>,
    default: BackendSpec,
    default_constructor: Constructor<T>,
}

impl<T: ?Sized> BackendRegistry<T> {
    /// Create a registry whose default selection is built by `constructor`.
    pub fn new<F>(kind: BackendKind, default: BackendSpec, constructor: F) -> Self
    where
        F: Fn(BackendSpec) -> Arc<T> + Send + Sync + 'static,
    {
        let default_constructor: Constructor<T> = Arc::new(constructor);
        let mut constructors = HashMap::new();
        constructors.insert(default.provider.clone(), default_constructor.clone());
        Self {
            kind,
            constructors,
            default,
            default_constructor,
        }
    }

    /// Register a constructor for a provider.
    ///
    /// If the provider is already registered it is replaced.
    pub fn register<F>(&mut self, provider: impl Into<String>, constructor: F)
    where
        F: Fn(BackendSpec) -> Arc<T> + Send + Sync + 'static,
    {
        let provider = provider.into().to_lowercase();
        debug!("Registering {} provider: {}", self.kind, provider);
        let constructor: Constructor<T> = Arc::new(constructor);
        if provider == self.default.provider {
            self.default_constructor = constructor.clone();
        }
        self.constructors.insert(provider, constructor);
    }

    /// Which capability this registry serves.
    pub fn kind(&self) -> BackendKind {
        self.kind
    }

    /// The default selection.
    pub fn default_spec(&self) -> &BackendSpec {
        &self.default
    }

    /// Check if a provider is registered.
    pub fn has_provider(&self, provider: &str) -> bool {
        self.constructors.contains_key(&provider.to_lowercase())
    }

    /// List registered providers, sorted.
    pub fn providers(&self) -> Vec<&str> {
        let mut providers: Vec<&str> = self.constructors.keys().map(|s| s.as_str()).collect();
        providers.sort_unstable();
        providers
    }

    /// Pick the spec that will actually be built for a model string.
    pub fn select(&self, model_string: &str) -> BackendSpec {
        match BackendSpec::parse(model_string) {
            Some(spec) if self.constructors.contains_key(&spec.provider) => spec,
            Some(spec) => {
                warn!(
                    "Unknown {} provider '{}', falling back to {}",
                    self.kind,
                    spec.provider,
                    self.default.model_string()
                );
                self.default.clone()
            }
            None => {
                warn!(
                    "Malformed {} model '{}', falling back to {}",
                    self.kind,
                    model_string,
                    self.default.model_string()
                );
                self.default.clone()
            }
        }
    }

    /// Build a backend from a spec.
    ///
    /// Unknown providers are replaced by the default selection, keeping
    /// the language and voice hints of the request.
    pub fn build(&self, spec: BackendSpec) -> Arc<T> {
        if let Some(constructor) = self.constructors.get(&spec.provider) {
            return constructor(spec);
        }

        let mut fallback = self.default.clone();
        fallback.language = spec.language.or(fallback.language);
        fallback.voice = spec.voice.or(fallback.voice);
        (self.default_constructor)(fallback)
    }

    /// Select and build in one step.
    pub fn resolve(&self, model_string: &str) -> Arc<T> {
        self.build(self.select(model_string))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named(String);

    fn registry() -> BackendRegistry<Named> {
        let default = BackendSpec::parse("deepgram/nova-3").unwrap();
        let mut registry = BackendRegistry::new(BackendKind::Stt, default, |spec: BackendSpec| {
            Arc::new(Named(spec.model_string()))
        });
        registry.register("AssemblyAI", |spec: BackendSpec| {
            Arc::new(Named(spec.model_string()))
        });
        registry
    }

    #[test]
    fn test_parse_full() {
        let spec = BackendSpec::parse("Deepgram/nova-3:multi").unwrap();
        assert_eq!(spec.provider, "deepgram");
        assert_eq!(spec.model, "nova-3");
        assert_eq!(spec.variant.as_deref(), Some("multi"));
        assert_eq!(spec.model_string(), "deepgram/nova-3:multi");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(BackendSpec::parse("").is_none());
        assert!(BackendSpec::parse("nova-3").is_none());
        assert!(BackendSpec::parse("/nova-3").is_none());
        assert!(BackendSpec::parse("deepgram/").is_none());
    }

    #[test]
    fn test_resolve_known_provider() {
        let registry = registry();
        assert!(registry.has_provider("assemblyai"));
        let backend = registry.resolve("assemblyai/universal-streaming");
        assert_eq!(backend.0, "assemblyai/universal-streaming");
    }

    #[test]
    fn test_unknown_provider_falls_back() {
        let registry = registry();
        assert_eq!(registry.resolve("whisperx/large").0, "deepgram/nova-3");
    }

    #[test]
    fn test_malformed_falls_back() {
        let registry = registry();
        assert_eq!(registry.resolve("garbage").0, "deepgram/nova-3");
    }

    #[test]
    fn test_build_fallback_keeps_hints() {
        let default = BackendSpec::parse("deepgram/nova-3").unwrap();
        let registry = BackendRegistry::new(BackendKind::Stt, default, |spec: BackendSpec| {
            Arc::new(Named(format!(
                "{}@{}",
                spec.model_string(),
                spec.language.unwrap_or_default()
            )))
        });

        let spec = BackendSpec::parse("whisperx/large")
            .unwrap()
            .with_language("es");
        assert_eq!(registry.build(spec).0, "deepgram/nova-3@es");
    }

    #[test]
    fn test_providers_sorted() {
        assert_eq!(registry().providers(), vec!["assemblyai", "deepgram"]);
    }
}
