//! Connection-state latch (§4.7).
//!
//! A pure state-machine shape: a state enum plus a latch that reports each
//! transition to the delegate once and exactly once, silently swallowing
//! spurious callbacks once the connection has reached a terminal state.

/// Lifecycle state of one transport connection (TCP+UDP pair).
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionState {
    /// No connection attempt in progress.
    Disconnected,
    /// A connection attempt is in flight.
    Connecting,
    /// Control and data channels are both usable.
    Connected,
    /// The connection failed; carries a human-readable reason.
    Failed(String),
}

impl ConnectionState {
    fn is_terminal_from(&self, previous: &ConnectionState) -> bool {
        matches!(self, Self::Failed(_)) || (matches!(self, Self::Disconnected) && matches!(previous, Self::Connected))
    }
}

/// Wraps [`ConnectionState`] transitions so each one reaches the delegate
/// exactly once, per §4.7: "Transitions are reported once and exactly
/// once (via a latch); spurious state callbacks after completion are
/// ignored."
#[derive(Debug, Clone)]
pub struct ConnectionStateLatch {
    current: ConnectionState,
    terminated: bool,
}

impl ConnectionStateLatch {
    /// A fresh latch, starting `Disconnected`.
    #[must_use]
    pub fn new() -> Self {
        Self { current: ConnectionState::Disconnected, terminated: false }
    }

    /// Current state.
    #[must_use]
    pub fn current(&self) -> &ConnectionState {
        &self.current
    }

    /// Report a candidate new state. Returns `Some(state)` if this is a
    /// genuine transition that should be forwarded to the delegate; `None`
    /// if the latch has already terminated or `new` is a no-op repeat of the
    /// current state.
    pub fn transition(&mut self, new: ConnectionState) -> Option<ConnectionState> {
        if self.terminated {
            return None;
        }
        if std::mem::discriminant(&new) == std::mem::discriminant(&self.current) {
            return None;
        }
        let terminal = new.is_terminal_from(&self.current);
        self.current = new.clone();
        if terminal {
            self.terminated = true;
        }
        Some(new)
    }
}

impl Default for ConnectionStateLatch {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_each_transition_once() {
        let mut latch = ConnectionStateLatch::new();
        assert_eq!(latch.transition(ConnectionState::Connecting), Some(ConnectionState::Connecting));
        assert_eq!(latch.transition(ConnectionState::Connecting), None, "repeat is swallowed");
        assert_eq!(latch.transition(ConnectionState::Connected), Some(ConnectionState::Connected));
    }

    #[test]
    fn ignores_spurious_callbacks_after_failure() {
        let mut latch = ConnectionStateLatch::new();
        latch.transition(ConnectionState::Connecting);
        assert!(latch.transition(ConnectionState::Failed("reset".into())).is_some());
        assert_eq!(latch.transition(ConnectionState::Connecting), None);
        assert_eq!(latch.transition(ConnectionState::Disconnected), None);
    }

    #[test]
    fn disconnect_after_connected_is_terminal() {
        let mut latch = ConnectionStateLatch::new();
        latch.transition(ConnectionState::Connecting);
        latch.transition(ConnectionState::Connected);
        assert!(latch.transition(ConnectionState::Disconnected).is_some());
        assert_eq!(latch.transition(ConnectionState::Connecting), None, "latched after disconnect");
    }
}
