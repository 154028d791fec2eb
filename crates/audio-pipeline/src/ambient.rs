//! Ambient background audio under the conversation.

use std::sync::Arc;

use tracing::{info, warn};
use voice_core::{AmbientClip, AmbientPlayer, PipelineError};

/// Map a configured clip name to an ambient asset.
///
/// `none` disables ambient audio. Names are matched exactly; anything
/// that matches no asset, including a differently cased name, falls back
/// to the crowded room loop.
pub fn select_ambient_clip(name: &str) -> Option<AmbientClip> {
    match name {
        "none" => None,
        "office" => Some(AmbientClip::Office),
        "crowded_room" => Some(AmbientClip::CrowdedRoom),
        other => {
            warn!("Unknown background clip '{}', using crowded_room", other);
            Some(AmbientClip::CrowdedRoom)
        }
    }
}

/// Start the ambient loop for `clip_name` at `volume`.
///
/// Returns the clip that was started, or `None` when ambient audio is
/// disabled.
pub async fn start_ambient(
    player: Arc<dyn AmbientPlayer>,
    clip_name: &str,
    volume: f32,
) -> Result<Option<AmbientClip>, PipelineError> {
    let Some(clip) = select_ambient_clip(clip_name) else {
        info!("Ambient audio disabled");
        return Ok(None);
    };
    let volume = if volume.is_finite() {
        volume.clamp(0.0, 1.0)
    } else {
        0.0
    };
    player.start(clip, volume).await?;
    info!("Ambient audio started: {} at {:.2}", clip, volume);
    Ok(Some(clip))
}
