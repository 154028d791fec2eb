//! Per-call lifecycle.

use std::fmt;

use serde::Serialize;
use tokio::sync::watch;
use tracing::info;

use crate::error::OrchestratorError;

/// Lifecycle state of one call's session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SessionState {
    Idle,
    ConfigResolving,
    Assembling,
    Active,
    Closing,
    Closed,
}

impl SessionState {
    /// Whether moving from `self` to `next` is allowed.
    ///
    /// Setup runs strictly forward. Teardown may start from any state
    /// after the call was accepted.
    pub fn can_transition_to(self, next: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, next),
            (Idle, ConfigResolving)
                | (ConfigResolving, Assembling)
                | (Assembling, Active)
                | (ConfigResolving | Assembling | Active, Closing)
                | (Closing, Closed)
        )
    }

    pub fn is_terminal(self) -> bool {
        self == SessionState::Closed
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::ConfigResolving => "config-resolving",
            SessionState::Assembling => "assembling",
            SessionState::Active => "active",
            SessionState::Closing => "closing",
            SessionState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Tracks and publishes one call's state.
#[derive(Debug)]
pub struct StateMachine {
    call_id: String,
    state: watch::Sender<SessionState>,
}

impl StateMachine {
    pub fn new(call_id: impl Into<String>) -> Self {
        let (state, _) = watch::channel(SessionState::Idle);
        Self {
            call_id: call_id.into(),
            state,
        }
    }

    pub fn current(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Move to `next`, or fail if the lifecycle does not allow it.
    pub fn advance(&self, next: SessionState) -> Result<(), OrchestratorError> {
        let from = self.current();
        if !from.can_transition_to(next) {
            return Err(OrchestratorError::InvalidTransition { from, to: next });
        }
        self.state.send_replace(next);
        info!("Call {}: {} -> {}", self.call_id, from, next);
        Ok(())
    }

    /// Run teardown from whatever state the call is in.
    pub fn close(&self) {
        if self.current().can_transition_to(SessionState::Closing) {
            let _ = self.advance(SessionState::Closing);
        }
        if self.current() == SessionState::Closing {
            let _ = self.advance(SessionState::Closed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_path() {
        let machine = StateMachine::new("job-1");
        for next in [
            SessionState::ConfigResolving,
            SessionState::Assembling,
            SessionState::Active,
            SessionState::Closing,
            SessionState::Closed,
        ] {
            machine.advance(next).unwrap();
            assert_eq!(machine.current(), next);
        }
        assert!(machine.current().is_terminal());
    }

    #[test]
    fn test_rejects_skips_and_reversals() {
        let machine = StateMachine::new("job-1");
        assert!(matches!(
            machine.advance(SessionState::Active),
            Err(OrchestratorError::InvalidTransition { .. })
        ));
        machine.advance(SessionState::ConfigResolving).unwrap();
        assert!(machine.advance(SessionState::Idle).is_err());
        assert_eq!(machine.current(), SessionState::ConfigResolving);
    }

    #[test]
    fn test_close_from_setup_and_idempotent() {
        let machine = StateMachine::new("job-1");
        machine.advance(SessionState::ConfigResolving).unwrap();
        machine.close();
        assert_eq!(machine.current(), SessionState::Closed);
        machine.close();
        assert_eq!(machine.current(), SessionState::Closed);
    }

    #[test]
    fn test_close_before_accept_stays_idle() {
        let machine = StateMachine::new("job-1");
        machine.close();
        assert_eq!(machine.current(), SessionState::Idle);
    }

    #[tokio::test]
    async fn test_subscribers_see_changes() {
        let machine = StateMachine::new("job-1");
        let mut rx = machine.subscribe();
        machine.advance(SessionState::ConfigResolving).unwrap();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), SessionState::ConfigResolving);
    }
}
