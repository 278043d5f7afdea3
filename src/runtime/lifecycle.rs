//! Process lifecycle of one protocol run.
//!
//! ```text
//!  Uninitialized ──bind──▶ Bound ──start──▶ Running ──▶ ShuttingDown ──▶ Stopped
//!                            │                               ▲
//!                            └───────────────────────────────┘
//! ```
//!
//! A run may shut down straight from `Bound` (termination arrives before
//! the first tick), but never skips `ShuttingDown`.  `Stopped` is final.

use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    Uninitialized,
    Bound,
    Running,
    ShuttingDown,
    Stopped,
}

impl LifecycleState {
    /// Whether `self -> next` is a legal edge.
    pub const fn can_advance_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Uninitialized, Self::Bound)
                | (Self::Bound, Self::Running)
                | (Self::Bound | Self::Running, Self::ShuttingDown)
                | (Self::ShuttingDown, Self::Stopped)
        )
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Stopped)
    }
}

/// Illegal transition request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleError {
    pub from: LifecycleState,
    pub to: LifecycleState,
}

impl fmt::Display for LifecycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "illegal transition {:?} -> {:?}", self.from, self.to)
    }
}

/// Tracks the current lifecycle state and rejects illegal edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lifecycle {
    state: LifecycleState,
}

impl Lifecycle {
    pub const fn new() -> Self {
        Self {
            state: LifecycleState::Uninitialized,
        }
    }

    pub const fn state(&self) -> LifecycleState {
        self.state
    }

    /// Move to `next`, returning the previous state.
    pub fn advance(&mut self, next: LifecycleState) -> Result<LifecycleState, LifecycleError> {
        let from = self.state;
        if !from.can_advance_to(next) {
            return Err(LifecycleError { from, to: next });
        }
        self.state = next;
        Ok(from)
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}
