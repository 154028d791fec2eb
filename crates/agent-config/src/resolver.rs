//! Fetches the remote agent configuration, falling back to defaults.

use reqwest::{Client, StatusCode};
use tokio::time::timeout;
use tracing::{debug, info, warn};
use voice_core::fingerprint_instructions;

use crate::config::AgentConfig;
use crate::error::ConfigError;
use crate::settings::ConfigSettings;
use crate::wire::parse_config;

/// Resolves the agent configuration for a call.
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    client: Client,
    settings: ConfigSettings,
}

impl ConfigResolver {
    /// Create a resolver with the given settings.
    pub fn new(settings: ConfigSettings) -> Self {
        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!("Failed to build config HTTP client ({}), using defaults", e);
                Client::new()
            });
        Self { client, settings }
    }

    /// Create a resolver from environment variables.
    ///
    /// See [`ConfigSettings::from_env`].
    pub fn from_env() -> Self {
        Self::new(ConfigSettings::from_env())
    }

    /// Get the settings.
    pub fn settings(&self) -> &ConfigSettings {
        &self.settings
    }

    /// Resolve the configuration.
    ///
    /// Never fails and never waits longer than the configured timeout:
    /// any problem is logged and the defaults are returned.
    pub async fn resolve(&self) -> AgentConfig {
        let config = match self.try_resolve().await {
            Ok(config) => config,
            Err(ConfigError::MissingSetting(name)) => {
                warn!("{} not set, using default agent configuration", name);
                return AgentConfig::default();
            }
            Err(e) => {
                warn!("Agent configuration fetch failed, using defaults: {}", e);
                return AgentConfig::default();
            }
        };

        info!(
            "Agent configuration resolved for '{}' (instructions fingerprint: {})",
            config.agent_name,
            fingerprint_instructions(&config.effective_instructions())
        );
        config
    }

    /// Fetch and parse, surfacing the failure cause.
    pub async fn try_resolve(&self) -> Result<AgentConfig, ConfigError> {
        let (endpoint, token) = self
            .settings
            .credentials()
            .ok_or_else(|| ConfigError::MissingSetting(self.settings.missing_credential()))?;

        match timeout(self.settings.timeout, self.fetch(endpoint, token)).await {
            Ok(result) => result,
            Err(_) => Err(ConfigError::Timeout(self.settings.timeout)),
        }
    }

    async fn fetch(&self, endpoint: &str, token: &str) -> Result<AgentConfig, ConfigError> {
        debug!("Fetching agent configuration from {}", endpoint);

        let response = self
            .client
            .get(endpoint)
            .header("Authorization", format!("Bearer {}", token))
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(ConfigError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        parse_config(&body)
    }
}
