//! Remote voice agent configuration.
//!
//! The admin dashboard stores per-agent behavior (prompt, greeting,
//! voices, models, ambient sound) behind an authenticated HTTP endpoint.
//! [`ConfigResolver`] fetches it once per call and merges it over named
//! defaults. Resolution never fails outward: missing settings, network
//! errors, timeouts, bad statuses and bad bodies all yield the defaults.
//!
//! # Example
//!
//! ```rust,no_run
//! use agent_config::{ConfigResolver, ConfigSettings};
//!
//! #[tokio::main]
//! async fn main() {
//!     let resolver = ConfigResolver::new(ConfigSettings::from_env());
//!     let config = resolver.resolve().await;
//!     println!("{}", config.effective_instructions());
//! }
//! ```

mod config;
mod error;
mod resolver;
mod settings;
mod wire;

pub use config::{
    AgentConfig, DEFAULT_AGENT_NAME, DEFAULT_BACKGROUND_CLIP, DEFAULT_BACKGROUND_VOLUME,
    DEFAULT_GREETING, DEFAULT_INSTRUCTIONS, DEFAULT_LLM_MODEL, DEFAULT_STT_LANGUAGE,
    DEFAULT_STT_MODEL, DEFAULT_TTS_LANGUAGE, DEFAULT_TTS_MODEL, DEFAULT_TTS_VOICE,
};
pub use error::ConfigError;
pub use resolver::ConfigResolver;
pub use settings::{
    env_value, ConfigSettings, ConfigSettingsBuilder, PlatformSettings,
    DEFAULT_CONFIG_TIMEOUT,
};
