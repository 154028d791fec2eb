//! Environment-provided settings.

use std::env;
use std::time::Duration;

/// Default bound on a configuration fetch.
pub const DEFAULT_CONFIG_TIMEOUT: Duration = Duration::from_secs(10);

/// Read an environment variable, treating empty or blank values as unset.
pub fn env_value(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Where to fetch the agent configuration from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSettings {
    /// Configuration endpoint URL.
    pub endpoint: Option<String>,
    /// Bearer token for the endpoint.
    pub token: Option<String>,
    /// Bound on the whole fetch.
    pub timeout: Duration,
}

impl Default for ConfigSettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            token: None,
            timeout: DEFAULT_CONFIG_TIMEOUT,
        }
    }
}

impl ConfigSettings {
    /// Create settings from environment variables.
    ///
    /// - `AGENT_CONFIG_URL` - Configuration endpoint
    /// - `AGENT_CONFIG_TOKEN` - Bearer token
    /// - `AGENT_CONFIG_TIMEOUT_SECS` - Fetch timeout (default: 10)
    ///
    /// Missing values are not an error here; the resolver falls back to
    /// defaults when either the URL or the token is absent.
    pub fn from_env() -> Self {
        let timeout = env_value("AGENT_CONFIG_TIMEOUT_SECS")
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_CONFIG_TIMEOUT);

        Self {
            endpoint: env_value("AGENT_CONFIG_URL"),
            token: env_value("AGENT_CONFIG_TOKEN"),
            timeout,
        }
    }

    /// Create a new settings builder.
    pub fn builder() -> ConfigSettingsBuilder {
        ConfigSettingsBuilder::default()
    }

    /// Endpoint and token, if both are present and non-blank.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        let endpoint = self.endpoint.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        let token = self.token.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        Some((endpoint, token))
    }

    /// Name of the first credential setting that is missing or blank.
    ///
    /// Only meaningful when [`credentials`](Self::credentials) is `None`.
    pub(crate) fn missing_credential(&self) -> &'static str {
        match self.endpoint.as_deref().map(str::trim) {
            Some(endpoint) if !endpoint.is_empty() => "AGENT_CONFIG_TOKEN",
            _ => "AGENT_CONFIG_URL",
        }
    }
}

/// Builder for ConfigSettings.
#[derive(Debug, Default)]
pub struct ConfigSettingsBuilder {
    settings: ConfigSettings,
}

impl ConfigSettingsBuilder {
    /// Set the endpoint URL.
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.settings.endpoint = Some(url.into());
        self
    }

    /// Set the bearer token.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.settings.token = Some(token.into());
        self
    }

    /// Set the fetch timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.settings.timeout = timeout;
        self
    }

    /// Build the settings.
    pub fn build(self) -> ConfigSettings {
        self.settings
    }
}

/// Media platform connection settings.
///
/// Opaque to the worker core; passed through to the platform integration.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct PlatformSettings {
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
}

impl PlatformSettings {
    /// Read `LIVEKIT_URL`, `LIVEKIT_API_KEY` and `LIVEKIT_API_SECRET`.
    pub fn from_env() -> Self {
        Self {
            url: env_value("LIVEKIT_URL"),
            api_key: env_value("LIVEKIT_API_KEY"),
            api_secret: env_value("LIVEKIT_API_SECRET"),
        }
    }

    /// Names of the settings that are missing.
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.url.is_none() {
            missing.push("LIVEKIT_URL");
        }
        if self.api_key.is_none() {
            missing.push("LIVEKIT_API_KEY");
        }
        if self.api_secret.is_none() {
            missing.push("LIVEKIT_API_SECRET");
        }
        missing
    }
}

// Keep the secret out of debug output.
impl std::fmt::Debug for PlatformSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlatformSettings")
            .field("url", &self.url)
            .field("api_key", &self.api_key)
            .field("api_secret", &self.api_secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
