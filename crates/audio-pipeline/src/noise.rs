//! Noise filter selection per participant.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;
use voice_core::{InferenceGateway, NoiseFilter, NoiseFilterPolicy, Participant, ParticipantKind};

use crate::catalog::GatewayNoiseFilter;

/// Noise cancellation filters offered by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NoiseFilterKind {
    /// General-purpose background voice cancellation.
    #[serde(rename = "bvc")]
    Bvc,
    /// Variant tuned for narrowband phone audio.
    #[serde(rename = "bvc-telephony")]
    BvcTelephony,
}

impl NoiseFilterKind {
    /// Filter name as known to the platform.
    pub fn as_str(&self) -> &'static str {
        match self {
            NoiseFilterKind::Bvc => "bvc",
            NoiseFilterKind::BvcTelephony => "bvc-telephony",
        }
    }
}

impl fmt::Display for NoiseFilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Filter for a participant of the given kind.
pub fn select_noise_filter(kind: ParticipantKind) -> NoiseFilterKind {
    if kind.is_telephony() {
        NoiseFilterKind::BvcTelephony
    } else {
        NoiseFilterKind::Bvc
    }
}

/// Noise filter policy evaluated for every participant that joins.
pub struct ParticipantNoisePolicy {
    general: Arc<dyn NoiseFilter>,
    telephony: Arc<dyn NoiseFilter>,
}

impl ParticipantNoisePolicy {
    /// Build both filters against the platform's inference gateway.
    pub fn new(gateway: Arc<dyn InferenceGateway>) -> Self {
        Self {
            general: Arc::new(GatewayNoiseFilter::new(NoiseFilterKind::Bvc, gateway.clone())),
            telephony: Arc::new(GatewayNoiseFilter::new(NoiseFilterKind::BvcTelephony, gateway)),
        }
    }
}

impl NoiseFilterPolicy for ParticipantNoisePolicy {
    fn filter_for(&self, participant: &Participant) -> Arc<dyn NoiseFilter> {
        let kind = select_noise_filter(participant.kind);
        debug!(
            "Noise filter for {} ({:?}): {}",
            participant.identity, participant.kind, kind
        );
        match kind {
            NoiseFilterKind::Bvc => self.general.clone(),
            NoiseFilterKind::BvcTelephony => self.telephony.clone(),
        }
    }
}
