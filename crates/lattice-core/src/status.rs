//! Change status: phase, state, reason, and incarnation

use serde::{Deserialize, Serialize};

/// Direction of application for a change
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// The change is being applied to the network
    #[default]
    Change,
    /// The change is being undone
    Rollback,
}

/// Progress within a phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum State {
    /// Work is outstanding in the current phase
    #[default]
    Pending,
    /// The current phase has been applied everywhere it can be
    Complete,
    /// The current phase was rejected
    Failed,
}

/// Rationale for the current state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Reason {
    /// No failure recorded
    #[default]
    None,
    /// A failure was recorded; see the status message
    Error,
}

/// Reconciliation status carried by both network and device changes.
///
/// The incarnation is the synchronization scalar between the two levels:
/// a device change has caught up with its parent exactly when it carries the
/// parent's incarnation in the parent's phase. Incarnation 0 means the change
/// has been created but not yet issued.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    /// Direction currently being driven
    pub phase: Phase,
    /// Progress within the phase
    pub state: State,
    /// Failure rationale, if any
    pub reason: Reason,
    /// Human-readable detail; wire error text is preserved verbatim
    pub message: String,
    /// Monotonically increasing issue counter, bumped on every (re-)issue
    pub incarnation: u64,
}

impl Status {
    /// Status of a freshly created, not yet issued change.
    pub fn initial() -> Self {
        Status::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_status_is_unissued_pending_change() {
        let status = Status::initial();
        assert_eq!(status.phase, Phase::Change);
        assert_eq!(status.state, State::Pending);
        assert_eq!(status.reason, Reason::None);
        assert_eq!(status.message, "");
        assert_eq!(status.incarnation, 0);
    }
}
