//! Connection lifecycle state machine
//!
//! ```text
//! Upgrading -> HistoryReplay -> Authenticated -> ReadLoop -> Terminated
//!                            \-> Rejected ---------------------^
//! ```
//!
//! `Rejected` connections stay open as read-only listeners: they keep
//! receiving broadcasts but never enter the read loop. Any phase may jump to
//! `Terminated` when the stream fails.

use std::fmt;

/// Phase of a single connection handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionPhase {
    Upgrading,
    HistoryReplay,
    Authenticated,
    Rejected,
    ReadLoop,
    Terminated,
}

impl ConnectionPhase {
    /// Whether moving from `self` to `next` is a legal transition
    pub fn can_transition_to(self, next: ConnectionPhase) -> bool {
        use ConnectionPhase::*;

        matches!(
            (self, next),
            (Upgrading, HistoryReplay)
                | (HistoryReplay, Authenticated)
                | (HistoryReplay, Rejected)
                | (Authenticated, ReadLoop)
        ) || (next == Terminated && self != Terminated)
    }

    /// Move to `next`, logging the transition.
    ///
    /// Illegal transitions are logged and ignored.
    pub fn advance(&mut self, next: ConnectionPhase) {
        if self.can_transition_to(next) {
            tracing::debug!("Connection phase {} -> {}", self, next);
            *self = next;
        } else {
            tracing::warn!("Ignoring illegal connection phase transition {} -> {}", self, next);
        }
    }

    /// Whether the connection may submit chat messages in this phase
    pub fn accepts_messages(self) -> bool {
        self == ConnectionPhase::ReadLoop
    }
}

impl fmt::Display for ConnectionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionPhase::Upgrading => "upgrading",
            ConnectionPhase::HistoryReplay => "history-replay",
            ConnectionPhase::Authenticated => "authenticated",
            ConnectionPhase::Rejected => "rejected",
            ConnectionPhase::ReadLoop => "read-loop",
            ConnectionPhase::Terminated => "terminated",
        };
        f.write_str(name)
    }
}
