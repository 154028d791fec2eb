//! Process-wide resources prepared once before any call is accepted.

use std::sync::Arc;

use tracing::info;
use voice_core::{MediaPlatform, VoiceActivityDetector};

use crate::error::OrchestratorError;

/// Read-only artifacts shared by every call in this worker process.
#[derive(Clone)]
pub struct WorkerResources {
    vad: Arc<dyn VoiceActivityDetector>,
}

impl WorkerResources {
    /// Load everything the platform needs ahead of the first call.
    pub fn warm_up(platform: &dyn MediaPlatform) -> Result<Self, OrchestratorError> {
        let vad = platform.load_vad().map_err(OrchestratorError::Warmup)?;
        info!("Worker warm-up complete (vad: {})", vad.name());
        Ok(Self { vad })
    }

    pub fn vad(&self) -> Arc<dyn VoiceActivityDetector> {
        self.vad.clone()
    }
}

impl std::fmt::Debug for WorkerResources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerResources")
            .field("vad", &self.vad.name())
            .finish()
    }
}
