//! Energy-threshold voice activity detection.

use voice_core::{AudioFrame, VoiceActivityDetector};

/// Default RMS level above which a frame counts as speech.
const DEFAULT_THRESHOLD: f32 = 0.02;

/// Treats any frame louder than a fixed RMS threshold as speech.
#[derive(Debug, Clone)]
pub struct EnergyVad {
    threshold: f32,
}

impl EnergyVad {
    pub fn new() -> Self {
        Self::with_threshold(DEFAULT_THRESHOLD)
    }

    pub fn with_threshold(threshold: f32) -> Self {
        Self { threshold }
    }
}

impl Default for EnergyVad {
    fn default() -> Self {
        Self::new()
    }
}

impl VoiceActivityDetector for EnergyVad {
    fn name(&self) -> &str {
        "energy"
    }

    fn is_speech(&self, frame: &AudioFrame) -> bool {
        !frame.is_empty() && frame.rms() > self.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silence_is_not_speech() {
        let vad = EnergyVad::new();
        assert!(!vad.is_speech(&AudioFrame::silence(16_000)));
        assert!(!vad.is_speech(&AudioFrame::new(Vec::new(), 16_000)));
    }

    #[test]
    fn test_loud_frame_is_speech() {
        let vad = EnergyVad::new();
        let frame = AudioFrame::new(vec![4_000, -4_000, 4_000, -4_000], 16_000);
        assert!(vad.is_speech(&frame));
    }
}
