//! Agent behavior for one call: instructions, greeting, and tools.

use std::sync::Arc;

use agent_config::AgentConfig;
use agent_tools::{default_registry, RegistryToolExecutor, SmsSettings, ToolPolicy};
use tracing::info;
use voice_core::{AgentSpec, MediaSession, PipelineError, ToolExecutor};

/// The agent's side of the conversation.
///
/// Built from the resolved configuration when a call is assembled and
/// dropped with the call.
pub struct VoiceAgent {
    instructions: String,
    greeting: String,
    tools: Arc<RegistryToolExecutor>,
}

impl VoiceAgent {
    /// Create the agent with `send_sms` bound to `sms`.
    pub fn new(config: &AgentConfig, sms: SmsSettings, policy: ToolPolicy) -> Self {
        let tools = RegistryToolExecutor::with_policy(default_registry(sms), policy);
        Self {
            instructions: config.effective_instructions(),
            greeting: config.effective_greeting(),
            tools: Arc::new(tools),
        }
    }

    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    pub fn greeting(&self) -> &str {
        &self.greeting
    }

    /// What the session needs to know about this agent.
    pub fn spec(&self) -> AgentSpec {
        AgentSpec {
            instructions: self.instructions.clone(),
            tools: self.tools.tool_specs(),
        }
    }

    pub fn tools(&self) -> Arc<dyn ToolExecutor> {
        self.tools.clone()
    }

    /// Speak the greeting as the first turn. The caller may interrupt it.
    pub async fn on_enter(&self, session: &dyn MediaSession) -> Result<(), PipelineError> {
        info!("Agent entered, greeting caller");
        session.generate_reply(&self.greeting, true).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_config::DEFAULT_INSTRUCTIONS;

    #[test]
    fn test_instructions_and_tools() {
        let config = AgentConfig {
            prompt: Some("You work for Acme.".to_string()),
            instructions: Some("Keep answers short.".to_string()),
            greeting_text: "Hi, this is Acme.".to_string(),
            ..AgentConfig::default()
        };
        let agent = VoiceAgent::new(&config, SmsSettings::default(), ToolPolicy::default());

        assert_eq!(agent.instructions(), "You work for Acme.\n\nKeep answers short.");
        assert_eq!(agent.greeting(), "Hi, this is Acme.");
        let spec = agent.spec();
        assert_eq!(spec.tools.len(), 1);
        assert_eq!(spec.tools[0].name, "send_sms");
    }

    #[test]
    fn test_first_message_template_greets() {
        let config = AgentConfig {
            agent_name: "Ava".to_string(),
            company_name: Some("Acme".to_string()),
            role: Some("receptionist".to_string()),
            first_message_template: Some(
                "{agentName} with {companyName}. Am I speaking with {firstName}?".to_string(),
            ),
            ..AgentConfig::default()
        };
        let agent = VoiceAgent::new(&config, SmsSettings::default(), ToolPolicy::default());

        assert_eq!(agent.greeting(), "Ava with Acme.");
        assert!(agent
            .instructions()
            .starts_with("You are Ava, the receptionist for Acme.\n\n"));
    }

    #[test]
    fn test_defaults() {
        let agent = VoiceAgent::new(
            &AgentConfig::default(),
            SmsSettings::default(),
            ToolPolicy::default(),
        );
        assert_eq!(agent.instructions(), DEFAULT_INSTRUCTIONS);
    }
}
