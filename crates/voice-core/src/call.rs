//! Call context: identity, participants, and teardown of one live call.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// How a participant is connected to the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantKind {
    /// Regular client (browser, mobile app).
    Standard,
    /// Media pushed in from an ingress source.
    Ingress,
    /// Recorder or other egress consumer.
    Egress,
    /// Phone caller bridged in over SIP.
    Sip,
    /// Another agent.
    Agent,
}

impl ParticipantKind {
    /// Every kind the platform can report.
    pub const ALL: [ParticipantKind; 5] = [
        ParticipantKind::Standard,
        ParticipantKind::Ingress,
        ParticipantKind::Egress,
        ParticipantKind::Sip,
        ParticipantKind::Agent,
    ];

    /// Whether audio from this participant arrives over the phone network.
    pub fn is_telephony(&self) -> bool {
        matches!(self, ParticipantKind::Sip)
    }
}

/// A participant connected to the call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Platform identity of the participant.
    pub identity: String,
    /// How the participant is connected.
    pub kind: ParticipantKind,
}

impl Participant {
    /// Create a participant.
    pub fn new(identity: impl Into<String>, kind: ParticipantKind) -> Self {
        Self {
            identity: identity.into(),
            kind,
        }
    }
}

/// Platform-side handle for one call.
///
/// The platform owns this and publishes the room identity once the
/// transport confirms it, and signals teardown. The orchestrator only
/// ever sees the read side, [`CallContext`].
#[derive(Debug)]
pub struct CallController {
    call_id: String,
    room: watch::Sender<Option<String>>,
    closed: watch::Sender<bool>,
}

impl CallController {
    /// Create a controller for a new call with no room identity yet.
    pub fn new(call_id: impl Into<String>) -> Self {
        let (room, _) = watch::channel(None);
        let (closed, _) = watch::channel(false);
        Self {
            call_id: call_id.into(),
            room,
            closed,
        }
    }

    /// Publish the room identity.
    pub fn set_room_name(&self, name: impl Into<String>) {
        let name = name.into();
        self.room.send_replace(Some(name));
    }

    /// Signal that the call has been torn down.
    pub fn close(&self) {
        self.closed.send_replace(true);
    }

    /// Create a read-only context for this call.
    pub fn context(&self) -> CallContext {
        CallContext {
            call_id: self.call_id.clone(),
            room: self.room.subscribe(),
            closed: self.closed.subscribe(),
        }
    }
}

/// Read-only view of one live call.
///
/// Cheap to clone. The room identity is read at the moment it is needed,
/// never cached, because the transport may confirm it after the session
/// was assembled.
#[derive(Debug, Clone)]
pub struct CallContext {
    call_id: String,
    room: watch::Receiver<Option<String>>,
    closed: watch::Receiver<bool>,
}

impl CallContext {
    /// Platform identifier of the call (job id).
    pub fn call_id(&self) -> &str {
        &self.call_id
    }

    /// The current room name, if the transport has confirmed one.
    pub fn room_name(&self) -> Option<String> {
        self.room
            .borrow()
            .as_ref()
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
    }

    /// Whether teardown has been signaled.
    ///
    /// A dropped controller counts as closed.
    pub fn is_closed(&self) -> bool {
        *self.closed.borrow() || self.closed.has_changed().is_err()
    }

    /// Wait until teardown is signaled.
    pub async fn closed(&self) {
        let mut closed = self.closed.clone();
        // Err means the controller was dropped, which is teardown too.
        let _ = closed.wait_for(|closed| *closed).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_only_sip_is_telephony() {
        for kind in ParticipantKind::ALL {
            assert_eq!(kind.is_telephony(), kind == ParticipantKind::Sip);
        }
    }

    #[test]
    fn test_room_name_resolved_late() {
        let controller = CallController::new("job-1");
        let ctx = controller.context();
        assert_eq!(ctx.call_id(), "job-1");
        assert!(ctx.room_name().is_none());

        controller.set_room_name("room-a");
        assert_eq!(ctx.room_name().as_deref(), Some("room-a"));
    }

    #[test]
    fn test_blank_room_name_is_unknown() {
        let controller = CallController::new("job-1");
        controller.set_room_name("   ");
        assert!(controller.context().room_name().is_none());
    }

    #[tokio::test]
    async fn test_closed_resolves_after_close() {
        let controller = CallController::new("job-1");
        let ctx = controller.context();
        assert!(!ctx.is_closed());

        let waiter = {
            let ctx = ctx.clone();
            tokio::spawn(async move { ctx.closed().await })
        };
        controller.close();

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("closed() should resolve")
            .unwrap();
        assert!(ctx.is_closed());
    }

    #[tokio::test]
    async fn test_dropped_controller_counts_as_closed() {
        let controller = CallController::new("job-1");
        let ctx = controller.context();
        drop(controller);

        assert!(ctx.is_closed());
        tokio::time::timeout(Duration::from_secs(1), ctx.closed())
            .await
            .expect("closed() should resolve when the controller is gone");
    }
}
