//! Outbound application events.
//!
//! The [`HeartbeatService`](super::service::HeartbeatService) emits these
//! through the [`EventSink`](super::ports::EventSink) port.  Adapters on
//! the other side decide what to do with them (serial log, test recorder).

use crate::error::{BusError, ReceiveError};
use crate::runtime::lifecycle::LifecycleState;

use super::fault::FaultCause;
use super::mapper::IndicatorState;

/// Structured events emitted by the heartbeat core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// Service entered `Running`.
    Started { target_id: u32 },

    /// Lifecycle moved between states.
    LifecycleChanged {
        from: LifecycleState,
        to: LifecycleState,
    },

    /// A heartbeat frame was fully written.
    PingSent { counter: u8 },

    /// Only part of a heartbeat frame was written.
    ShortWrite { counter: u8, written: usize },

    /// The heartbeat write was rejected.
    TransmitFailed { counter: u8, error: BusError },

    /// A valid heartbeat arrived and the indicator was updated.
    PongReceived {
        counter: u8,
        indicator: IndicatorState,
    },

    /// An inbound frame was rejected.
    FrameRejected(ReceiveError),

    /// The fault state went from Clear to Set.
    FaultRaised(FaultCause),

    /// The fault state went from Set to Clear.
    FaultCleared,

    /// Cleanup finished; the indicator is Off.
    Stopped,
}
