//! Latched fault state.
//!
//! Once raised, the fault stays set until an explicit clear.  Further
//! faults while already set are absorbed; the first cause is kept.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FaultState {
    #[default]
    Clear,
    Set,
}

/// What raised the fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultCause {
    /// Read returned fewer bytes than one frame.
    Truncated,
    /// Heartbeat-id frame with a data length other than 1.
    BadShape,
    /// Device accepted only part of a transmitted frame.
    ShortWrite,
    /// Transmit was rejected outright.
    TransmitFailed,
    /// The periodic tick timer could not be armed; no more pings go out.
    TickTimer,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FaultController {
    state: FaultState,
    cause: Option<FaultCause>,
    raised_total: u32,
}

impl FaultController {
    pub const fn new() -> Self {
        Self {
            state: FaultState::Clear,
            cause: None,
            raised_total: 0,
        }
    }

    pub const fn state(&self) -> FaultState {
        self.state
    }

    pub const fn is_set(&self) -> bool {
        matches!(self.state, FaultState::Set)
    }

    /// Cause of the currently latched fault.
    pub const fn cause(&self) -> Option<FaultCause> {
        self.cause
    }

    /// Every raise request, including those absorbed while already set.
    pub const fn raised_total(&self) -> u32 {
        self.raised_total
    }

    /// Returns `true` if this call moved the state from Clear to Set.
    pub fn raise(&mut self, cause: FaultCause) -> bool {
        self.raised_total = self.raised_total.saturating_add(1);
        if self.is_set() {
            return false;
        }
        self.state = FaultState::Set;
        self.cause = Some(cause);
        true
    }

    /// Returns `true` if this call moved the state from Set to Clear.
    pub fn clear(&mut self) -> bool {
        if !self.is_set() {
            return false;
        }
        self.state = FaultState::Clear;
        self.cause = None;
        true
    }
}
