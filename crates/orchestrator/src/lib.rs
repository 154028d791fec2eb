//! Session orchestrator for the voice agent worker.
//!
//! This crate provides the [`SessionOrchestrator`] type which accepts
//! calls dispatched by the media platform and brings each one from
//! acceptance to a running conversation on its own task.
//!
//! # Lifecycle
//!
//! ```text
//! call accepted
//!      ↓
//! ┌────────────────────────────────────────────────────────────┐
//! │                  SESSION ORCHESTRATOR                      │
//! │                                                            │
//! │  Idle → ConfigResolving                                    │
//! │     resolve remote config (spawned, bounded, never fails)  │
//! │         ↓                                                  │
//! │  ConfigResolving → Assembling                              │
//! │     agent (instructions, greeting, send_sms)               │
//! │     session plan (stt/llm/tts, vad, noise filter policy)   │
//! │         ↓                                                  │
//! │  Assembling → Active                                       │
//! │     start session, greet caller, start ambient audio       │
//! │         ↓                                                  │
//! │  Active → Closing → Closed   (platform teardown)           │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use orchestrator::SessionOrchestrator;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let platform = Arc::new(MyPlatform::connect().await?);
//!     let orchestrator = Arc::new(SessionOrchestrator::from_env(platform)?);
//!
//!     // One task per dispatched call, until the platform stops dispatching.
//!     let accepted = orchestrator.run().await;
//!     println!("handled {} calls", accepted);
//!     Ok(())
//! }
//! ```

mod agent;
mod error;
mod orchestrator;
mod state;
mod warmup;

// Public exports
pub use agent::VoiceAgent;
pub use error::OrchestratorError;
pub use orchestrator::{ActiveCall, OrchestratorSettings, SessionOrchestrator};
pub use state::{SessionState, StateMachine};
pub use warmup::WorkerResources;

// Re-export commonly used types from dependencies
pub use agent_config::AgentConfig;
pub use agent_tools::{SmsSettings, ToolPolicy};
