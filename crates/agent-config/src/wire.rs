//! Wire format of the configuration endpoint.
//!
//! The endpoint answers with a JSON object using camelCase keys. The
//! admin store persists snake_case columns and some deployments pass
//! them through, so both spellings are accepted. Every field is
//! optional; `null`, blank strings and values of the wrong type are
//! treated as missing so one bad field does not discard the rest.

use serde_json::{Map, Value};

use crate::config::AgentConfig;
use crate::error::ConfigError;

/// Parse a response body and merge it over the defaults.
pub(crate) fn parse_config(body: &str) -> Result<AgentConfig, ConfigError> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| ConfigError::InvalidBody(e.to_string()))?;

    let object = match value {
        Value::Object(object) => object,
        other => {
            return Err(ConfigError::InvalidBody(format!(
                "expected JSON object, got {}",
                type_name(&other)
            )))
        }
    };

    // Some endpoints wrap the row: {"settings": {...}}. Keys inside the
    // wrapper win over keys next to it.
    let object = match object.get("settings") {
        Some(Value::Object(inner)) => {
            let mut merged = object.clone();
            merged.remove("settings");
            merged.extend(inner.clone());
            merged
        }
        _ => object,
    };

    Ok(merge(&object))
}

fn merge(object: &Map<String, Value>) -> AgentConfig {
    let mut config = AgentConfig::default();

    if let Some(v) = text(object, &["agentName", "agent_name"]) {
        config.agent_name = v;
    }
    config.role = text(object, &["role"]);
    config.company_name = text(object, &["companyName", "company_name"]);
    config.instructions = text(object, &["instructions"]);
    config.prompt = text(object, &["prompt"]);
    if let Some(v) = text(object, &["greetingText", "greeting_text"]) {
        config.greeting_text = v;
    }
    config.first_message_template =
        text(object, &["firstMessageTemplate", "first_message_template"]);
    if let Some(v) = text(object, &["sttModel", "stt_model"]) {
        config.stt_model = v;
    }
    if let Some(v) = text(object, &["sttLanguage", "stt_language"]) {
        config.stt_language = v;
    }
    if let Some(v) = text(object, &["llmModel", "llm_model"]) {
        config.llm_model = v;
    }
    if let Some(v) = text(object, &["ttsModel", "tts_model"]) {
        config.tts_model = v;
    }
    if let Some(v) = text(object, &["ttsVoiceId", "tts_voice_id"]) {
        config.tts_voice_id = v;
    }
    if let Some(v) = text(object, &["ttsLanguage", "tts_language"]) {
        config.tts_language = v;
    }
    if let Some(v) = text(object, &["backgroundAudioClip", "background_audio_clip"]) {
        config.background_audio_clip = v;
    }
    if let Some(v) = number(object, &["backgroundAudioVolume", "background_audio_volume"]) {
        config.background_audio_volume = v.clamp(0.0, 1.0) as f32;
    }

    config
}

/// First non-blank string under any of `keys`, trimmed.
fn text(object: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| object.get(*key))
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

/// First finite number under any of `keys`. Numeric strings are accepted.
fn number(object: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    keys.iter()
        .filter_map(|key| object.get(*key))
        .filter_map(|value| match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        })
        .find(|n| n.is_finite())
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
