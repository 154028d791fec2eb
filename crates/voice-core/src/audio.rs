//! Audio value types passed across the platform seam.

use serde::{Deserialize, Serialize};

/// A block of mono 16-bit PCM audio.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AudioFrame {
    /// Interleaved samples (mono).
    pub samples: Vec<i16>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

impl AudioFrame {
    /// Create a frame from raw samples.
    pub fn new(samples: Vec<i16>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Create an empty frame at the given sample rate.
    pub fn silence(sample_rate: u32) -> Self {
        Self::new(Vec::new(), sample_rate)
    }

    /// Check if the frame carries no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Root-mean-square energy normalized into `[0, 1]`.
    pub fn rms(&self) -> f32 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let sum: f64 = self
            .samples
            .iter()
            .map(|s| {
                let v = *s as f64 / i16::MAX as f64;
                v * v
            })
            .sum();
        (sum / self.samples.len() as f64).sqrt() as f32
    }
}

/// Built-in ambient sound assets mixed under the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmbientClip {
    /// Busy room chatter.
    CrowdedRoom,
    /// Quiet office background.
    Office,
}

impl AmbientClip {
    /// The asset name as used in configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            AmbientClip::CrowdedRoom => "crowded_room",
            AmbientClip::Office => "office",
        }
    }
}

impl std::fmt::Display for AmbientClip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rms_of_silence_is_zero() {
        assert_eq!(AudioFrame::silence(16000).rms(), 0.0);
        assert_eq!(AudioFrame::new(vec![0; 160], 16000).rms(), 0.0);
    }

    #[test]
    fn test_rms_of_full_scale() {
        let frame = AudioFrame::new(vec![i16::MAX; 160], 16000);
        assert!((frame.rms() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_clip_names() {
        assert_eq!(AmbientClip::CrowdedRoom.as_str(), "crowded_room");
        assert_eq!(AmbientClip::Office.to_string(), "office");
    }
}
