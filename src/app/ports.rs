//! Port traits: the hexagonal boundary between the heartbeat logic and the
//! outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ HeartbeatService (domain)
//! ```
//!
//! Driven adapters (SocketCAN, TWAI, sysfs LED, GPIO pins, log sinks)
//! implement these traits.  The service is generic over them, so the
//! protocol logic never touches a file descriptor or a register.

use crate::error::{BusError, IndicatorError};
use crate::frame::WireFrame;

use super::events::AppEvent;
use super::mapper::IndicatorState;

// ───────────────────────────────────────────────────────────────
// Bus port (driven adapter: domain ↔ CAN controller)
// ───────────────────────────────────────────────────────────────

/// One CAN endpoint bound to a single interface.
pub trait BusPort {
    /// Submit one frame.  Returns the number of bytes the device accepted;
    /// anything below [`WIRE_FRAME_SIZE`](crate::frame::WIRE_FRAME_SIZE) is
    /// a short write.
    fn write_frame(&mut self, frame: &WireFrame) -> Result<usize, BusError>;

    /// Read one frame into `buf`.  Returns the number of bytes read, which
    /// may be less than a whole frame.  [`BusError::Timeout`] means nothing
    /// arrived and is not a failure.
    fn read_frame(&mut self, buf: &mut WireFrame) -> Result<usize, BusError>;

    /// Whether a frame can be read without waiting.  Used by the embedded
    /// harness to drain the receive FIFO; blocking adapters may leave the
    /// default.
    fn frame_pending(&mut self) -> bool {
        false
    }
}

impl<T: BusPort + ?Sized> BusPort for &mut T {
    fn write_frame(&mut self, frame: &WireFrame) -> Result<usize, BusError> {
        (**self).write_frame(frame)
    }

    fn read_frame(&mut self, buf: &mut WireFrame) -> Result<usize, BusError> {
        (**self).read_frame(buf)
    }

    fn frame_pending(&mut self) -> bool {
        (**self).frame_pending()
    }
}

// ───────────────────────────────────────────────────────────────
// Indicator port (driven adapter: domain → LED)
// ───────────────────────────────────────────────────────────────

/// A binary visual output.
pub trait IndicatorPort {
    fn set(&mut self, state: IndicatorState) -> Result<(), IndicatorError>;
}

impl<T: IndicatorPort + ?Sized> IndicatorPort for &mut T {
    fn set(&mut self, state: IndicatorState) -> Result<(), IndicatorError> {
        (**self).set(state)
    }
}

/// Indicator that goes nowhere.  The host ping role has no LED and the
/// host pong role has no separate fault output.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullIndicator;

impl IndicatorPort for NullIndicator {
    fn set(&mut self, _state: IndicatorState) -> Result<(), IndicatorError> {
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`]s through this port.
pub trait EventSink {
    fn emit(&mut self, event: &AppEvent);
}
