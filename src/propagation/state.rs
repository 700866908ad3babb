//! Run state machine.
//!
//! ```text
//! Idle → Validating → Resolving → PropagatingUp ⇄ … → Classifying → Done
//!             └→ Aborted
//! ```
//!
//! After `Resolving`, each worklist task passes through
//! `PropagatingUp → PropagatingDown → PropagatingAcross` and the loop
//! returns to `PropagatingUp` for the next task. A final
//! `PropagatingUp` reconciles every container before `Classifying`.

use std::fmt;

use tracing::trace;

/// Stage of a propagation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropagationState {
    Idle,
    Validating,
    Resolving,
    PropagatingUp,
    PropagatingDown,
    PropagatingAcross,
    Classifying,
    Done,
    Aborted,
}

impl PropagationState {
    /// Whether `next` may follow `self`.
    pub fn can_transition_to(self, next: Self) -> bool {
        use PropagationState::*;
        matches!(
            (self, next),
            (Idle, Validating)
                | (Validating, Resolving)
                | (Validating, Aborted)
                | (Resolving, PropagatingUp)
                | (PropagatingUp, PropagatingDown)
                | (PropagatingUp, Classifying)
                | (PropagatingDown, PropagatingAcross)
                | (PropagatingAcross, PropagatingUp)
                | (Classifying, Done)
        )
    }

    /// Whether the run has finished.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Aborted)
    }
}

impl fmt::Display for PropagationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Tracks the current state of one run.
#[derive(Debug)]
pub(crate) struct StateTracker {
    current: PropagationState,
}

impl StateTracker {
    pub(crate) fn new() -> Self {
        Self {
            current: PropagationState::Idle,
        }
    }

    pub(crate) fn current(&self) -> PropagationState {
        self.current
    }

    /// Moves to `next`. Re-entering the current state is a no-op.
    pub(crate) fn enter(&mut self, next: PropagationState) {
        if next == self.current {
            return;
        }
        debug_assert!(
            !self.current.is_terminal(),
            "transition {} -> {} after the run finished",
            self.current,
            next
        );
        debug_assert!(
            self.current.can_transition_to(next),
            "illegal transition {} -> {}",
            self.current,
            next
        );
        trace!(from = %self.current, to = %next, "propagation state");
        self.current = next;
    }
}
