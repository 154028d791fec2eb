//! Echo gateway - answers every caller turn with what it heard.

use async_trait::async_trait;
use voice_core::{
    AudioFrame, BackendSpec, InferenceGateway, PipelineError, ResponseAction, ResponseRequest,
    Speaker,
};

/// Sample rate of synthesized audio.
const OUTPUT_SAMPLE_RATE: u32 = 24_000;

/// A gateway that needs no remote engine.
///
/// - Replies with explicit reply instructions get those instructions spoken.
/// - Caller turns are echoed back with an optional prefix.
/// - Tool results are read out verbatim.
///
/// Synthesis produces silence, one sample per character.
#[derive(Debug, Clone, Default)]
pub struct EchoGateway {
    prefix: Option<String>,
}

impl EchoGateway {
    /// Create a new EchoGateway with no prefix.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new EchoGateway with a custom prefix for echoed turns.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }
}

#[async_trait]
impl InferenceGateway for EchoGateway {
    async fn transcribe(
        &self,
        _spec: &BackendSpec,
        _frame: &AudioFrame,
    ) -> Result<Option<String>, PipelineError> {
        Ok(None)
    }

    async fn respond(
        &self,
        _spec: &BackendSpec,
        request: ResponseRequest,
    ) -> Result<ResponseAction, PipelineError> {
        if let Some(instructions) = request.reply_instructions {
            return Ok(ResponseAction::Say(instructions));
        }

        let text = match request.turns.last() {
            Some(turn) if turn.speaker == Speaker::Caller => match &self.prefix {
                Some(prefix) => format!("{}{}", prefix, turn.text),
                None => turn.text.clone(),
            },
            Some(turn) if turn.speaker == Speaker::Tool => turn.text.clone(),
            _ => String::new(),
        };
        Ok(ResponseAction::Say(text))
    }

    async fn synthesize(
        &self,
        _spec: &BackendSpec,
        text: &str,
    ) -> Result<AudioFrame, PipelineError> {
        Ok(AudioFrame::new(
            vec![0; text.chars().count()],
            OUTPUT_SAMPLE_RATE,
        ))
    }

    fn denoise(&self, _filter: &str, _frame: &mut AudioFrame) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use voice_core::Turn;

    fn spec() -> BackendSpec {
        BackendSpec::parse("openai/gpt-4.1-mini").unwrap()
    }

    fn request(turns: Vec<Turn>, reply_instructions: Option<&str>) -> ResponseRequest {
        ResponseRequest {
            instructions: "Be helpful".to_string(),
            turns,
            reply_instructions: reply_instructions.map(str::to_string),
            tools: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_reply_instructions_are_spoken() {
        let gateway = EchoGateway::new();
        let action = gateway
            .respond(&spec(), request(Vec::new(), Some("Greet the caller")))
            .await
            .unwrap();
        assert_eq!(action, ResponseAction::Say("Greet the caller".to_string()));
    }

    #[tokio::test]
    async fn test_echo_with_prefix() {
        let gateway = EchoGateway::with_prefix("You said: ");
        let turns = vec![Turn::new(Speaker::Caller, "hello")];
        let action = gateway.respond(&spec(), request(turns, None)).await.unwrap();
        assert_eq!(action, ResponseAction::Say("You said: hello".to_string()));
    }

    #[tokio::test]
    async fn test_tool_result_read_out() {
        let gateway = EchoGateway::with_prefix("You said: ");
        let turns = vec![
            Turn::new(Speaker::Caller, "text me"),
            Turn::new(Speaker::Tool, "Text message sent."),
        ];
        let action = gateway.respond(&spec(), request(turns, None)).await.unwrap();
        assert_eq!(action, ResponseAction::Say("Text message sent.".to_string()));
    }

    #[tokio::test]
    async fn test_synthesize_length() {
        let gateway = EchoGateway::new();
        let frame = gateway.synthesize(&spec(), "hey").await.unwrap();
        assert_eq!(frame.samples.len(), 3);
        assert_eq!(frame.sample_rate, OUTPUT_SAMPLE_RATE);
    }
}
