//! Resolved agent configuration and its named defaults.

use serde::Serialize;

/// Instructions used when the remote configuration provides none.
pub const DEFAULT_INSTRUCTIONS: &str = "You are a friendly, professional voice assistant answering phone calls. \
Keep replies short and conversational, one or two sentences at a time. \
Ask one question at a time and confirm names, dates, and phone numbers back to the caller. \
If the caller wants details in writing, offer to send them a text message.";

/// Greeting instructions for the first agent turn.
pub const DEFAULT_GREETING: &str =
    "Greet the caller warmly, introduce yourself, and ask how you can help today.";

pub const DEFAULT_AGENT_NAME: &str = "Ben";
pub const DEFAULT_STT_MODEL: &str = "assemblyai/universal-streaming";
pub const DEFAULT_STT_LANGUAGE: &str = "en";
pub const DEFAULT_LLM_MODEL: &str = "openai/gpt-4.1-mini";
pub const DEFAULT_TTS_MODEL: &str = "elevenlabs/eleven_turbo_v2";
pub const DEFAULT_TTS_VOICE: &str = "iP95p4xoKVk53GoZ742B";
pub const DEFAULT_TTS_LANGUAGE: &str = "en";
pub const DEFAULT_BACKGROUND_CLIP: &str = "crowded_room";
pub const DEFAULT_BACKGROUND_VOLUME: f32 = 0.3;

/// Caller-facing behavior for one call.
///
/// Immutable once resolved. `instructions` and `prompt` keep what the
/// remote source sent (if anything); use
/// [`effective_instructions`](Self::effective_instructions) for the text
/// the agent runs with.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentConfig {
    pub agent_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    pub greeting_text: String,
    /// Opening line with `{agentName}`, `{companyName}` and `{firstName}`
    /// placeholders. See [`effective_greeting`](Self::effective_greeting).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_message_template: Option<String>,
    pub stt_model: String,
    pub stt_language: String,
    pub llm_model: String,
    pub tts_model: String,
    pub tts_voice_id: String,
    pub tts_language: String,
    /// Raw clip name; mapped to an asset by the audio pipeline.
    pub background_audio_clip: String,
    /// Always within `[0, 1]`.
    pub background_audio_volume: f32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            agent_name: DEFAULT_AGENT_NAME.to_string(),
            role: None,
            company_name: None,
            instructions: None,
            prompt: None,
            greeting_text: DEFAULT_GREETING.to_string(),
            first_message_template: None,
            stt_model: DEFAULT_STT_MODEL.to_string(),
            stt_language: DEFAULT_STT_LANGUAGE.to_string(),
            llm_model: DEFAULT_LLM_MODEL.to_string(),
            tts_model: DEFAULT_TTS_MODEL.to_string(),
            tts_voice_id: DEFAULT_TTS_VOICE.to_string(),
            tts_language: DEFAULT_TTS_LANGUAGE.to_string(),
            background_audio_clip: DEFAULT_BACKGROUND_CLIP.to_string(),
            background_audio_volume: DEFAULT_BACKGROUND_VOLUME,
        }
    }
}

impl AgentConfig {
    /// The instructions the agent runs with.
    ///
    /// `prompt` and `instructions` are joined by a blank line when both
    /// are present; either one alone is used as is; with neither, the
    /// default instructions apply. When a role or company is configured,
    /// an identity line comes first.
    pub fn effective_instructions(&self) -> String {
        let body = match (self.prompt.as_deref(), self.instructions.as_deref()) {
            (Some(prompt), Some(instructions)) => format!("{}\n\n{}", prompt, instructions),
            (Some(prompt), None) => prompt.to_string(),
            (None, Some(instructions)) => instructions.to_string(),
            (None, None) => DEFAULT_INSTRUCTIONS.to_string(),
        };
        match self.identity() {
            Some(identity) => format!("{}\n\n{}", identity, body),
            None => body,
        }
    }

    fn identity(&self) -> Option<String> {
        let name = &self.agent_name;
        match (self.role.as_deref(), self.company_name.as_deref()) {
            (Some(role), Some(company)) => {
                Some(format!("You are {}, the {} for {}.", name, role, company))
            }
            (Some(role), None) => Some(format!("You are {}, the {}.", name, role)),
            (None, Some(company)) => {
                Some(format!("You are {}, answering calls for {}.", name, company))
            }
            (None, None) => None,
        }
    }

    /// What the agent is asked to say first.
    ///
    /// The rendered first-message template when it yields any text,
    /// otherwise `greeting_text`.
    pub fn effective_greeting(&self) -> String {
        self.first_message_template
            .as_deref()
            .and_then(|template| self.render_first_message(template))
            .unwrap_or_else(|| self.greeting_text.clone())
    }

    /// Fill the template's placeholders.
    ///
    /// The caller's first name is not known when the call is answered, so
    /// `{firstName}` never resolves. A sentence holding a placeholder that
    /// cannot be filled is left out rather than spoken half-empty.
    fn render_first_message(&self, template: &str) -> Option<String> {
        let values = [
            ("{agentName}", Some(self.agent_name.as_str())),
            ("{companyName}", self.company_name.as_deref()),
        ];

        let rendered: Vec<String> = sentences(template)
            .into_iter()
            .filter_map(|sentence| {
                let mut sentence = sentence.to_string();
                for (placeholder, value) in values {
                    if let Some(value) = value {
                        sentence = sentence.replace(placeholder, value);
                    }
                }
                let unresolved = sentence.contains('{') && sentence.contains('}');
                (!unresolved).then_some(sentence)
            })
            .collect();

        let greeting = rendered.join(" ");
        (!greeting.is_empty()).then_some(greeting)
    }

    /// Whether every field still holds its default.
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// Split text after each `.`, `?` or `!`, trimming every piece.
fn sentences(text: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    for (i, c) in text.char_indices() {
        if matches!(c, '.' | '?' | '!') {
            pieces.push(&text[start..i + c.len_utf8()]);
            start = i + c.len_utf8();
        }
    }
    pieces.push(&text[start..]);
    pieces
        .into_iter()
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .collect()
}
