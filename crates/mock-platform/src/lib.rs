//! In-process media platform for the voice agent.
//!
//! This crate provides stand-ins for every platform seam so the
//! orchestrator can run without a media server:
//! - `EchoGateway` - Inference gateway that echoes the caller back
//! - `DelayedGateway` - Wraps another gateway with artificial latency
//! - `EnergyVad` - Energy-threshold voice activity detection
//! - `RecordingPlatform` - Platform that records every session event
//!
//! # Example
//!
//! ```rust
//! use mock_platform::RecordingPlatform;
//! use voice_core::{CallController, MediaPlatform};
//!
//! #[tokio::main]
//! async fn main() {
//!     let platform = RecordingPlatform::new();
//!     let controller = CallController::new("job-1");
//!
//!     let session = platform.create_session(&controller.context()).await.unwrap();
//!     assert!(platform.session("job-1").is_some());
//!     drop(session);
//! }
//! ```

mod delayed;
mod echo;
mod platform;
mod vad;

pub use delayed::DelayedGateway;
pub use echo::EchoGateway;
pub use platform::{
    PlatformFaults, RecordingAmbientPlayer, RecordingPlatform, RecordingSession, SessionEvent,
};
pub use vad::EnergyVad;

// Re-export voice-core types for convenience
pub use voice_core::{async_trait, MediaPlatform, MediaSession};
