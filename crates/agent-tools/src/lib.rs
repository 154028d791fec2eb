//! Tool registry and the SMS side channel for the voice agent.
//!
//! The reasoning backend may call tools mid-conversation. This crate
//! provides the [`Tool`] trait, a [`ToolRegistry`], and the
//! [`RegistryToolExecutor`] adapter that exposes the registry through
//! voice-core's `ToolExecutor`, running each invocation off the call loop
//! with a timeout and discarding results once the call has ended.
//!
//! # Built-in Tools
//!
//! - [`SendSms`] - Text the caller through the [`SmsGateway`].
//!
//! # Example
//!
//! ```rust,ignore
//! use agent_tools::{default_registry, RegistryToolExecutor, SmsSettings};
//! use voice_core::{CallController, ToolExecutor, ToolRequest};
//! use std::collections::HashMap;
//! use serde_json::Value;
//!
//! #[tokio::main]
//! async fn main() {
//!     let executor = RegistryToolExecutor::new(default_registry(SmsSettings::from_env()));
//!
//!     let controller = CallController::new("job-1");
//!     controller.set_room_name("call-_+15551234567_abc");
//!
//!     let mut args = HashMap::new();
//!     args.insert("message".to_string(), Value::String("Here is our booking link".into()));
//!     let request = ToolRequest::new("call-1", "send_sms", args, controller.context());
//!
//!     if let Some(result) = executor.execute(request).await {
//!         println!("{}", result.content); // "Text message sent."
//!     }
//! }
//! ```

mod error;
mod executor;
mod gateway;
mod registry;
mod tool;
pub mod tools;

pub use error::ToolError;
pub use executor::{RegistryToolExecutor, ToolPolicy, DEFAULT_TOOL_TIMEOUT};
pub use gateway::{
    SmsFailure, SmsGateway, SmsResult, SmsSettings, DEFAULT_SMS_TIMEOUT, SMS_EMPTY, SMS_FAILED,
    SMS_NO_ROOM, SMS_SENT, SMS_UNCONFIGURED,
};
pub use registry::ToolRegistry;
pub use tool::{Tool, ToolArgs, ToolOutput};
pub use tools::SendSms;

// Re-export async_trait for convenience
pub use async_trait::async_trait;

/// Create a registry with the agent's tool set.
pub fn default_registry(sms: SmsSettings) -> ToolRegistry {
    let send_sms = SendSms::new(sms);
    if !send_sms.is_configured() {
        tracing::warn!("SMS endpoint or token not set, send_sms will refuse every request");
    }

    let mut registry = ToolRegistry::new();
    registry.register(send_sms);
    registry
}
