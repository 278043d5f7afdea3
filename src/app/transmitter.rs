//! Ping transmitter.
//!
//! Owns the heartbeat counter.  Every tick encodes the current value,
//! advances the counter, then writes.  The counter therefore moves exactly
//! once per tick whatever the bus does with the frame.

use crate::error::BusError;
use crate::frame::{self, WIRE_FRAME_SIZE};

use super::ports::BusPort;

/// Result of one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransmitOutcome {
    /// The whole frame was accepted.
    Sent { counter: u8 },
    /// The device took fewer (or more) bytes than one frame.
    ShortWrite { counter: u8, written: usize },
    /// The device rejected the write.
    Failed { counter: u8, error: BusError },
}

impl TransmitOutcome {
    /// Counter carried by the attempted frame.
    pub const fn counter(&self) -> u8 {
        match *self {
            Self::Sent { counter }
            | Self::ShortWrite { counter, .. }
            | Self::Failed { counter, .. } => counter,
        }
    }

    pub const fn is_sent(&self) -> bool {
        matches!(self, Self::Sent { .. })
    }
}

#[derive(Debug, Clone)]
pub struct Transmitter {
    identifier: u32,
    counter: u8,
}

impl Transmitter {
    /// Fresh transmitter; the first frame carries 0.
    pub const fn new(identifier: u32) -> Self {
        Self {
            identifier,
            counter: 0,
        }
    }

    /// Counter the next tick will send.
    pub const fn next_counter(&self) -> u8 {
        self.counter
    }

    /// Encode, advance, write.  No allocation; one bus write.
    pub fn tick(&mut self, bus: &mut impl BusPort) -> TransmitOutcome {
        let counter = self.counter;
        let wire = frame::encode(self.identifier, counter).to_wire();
        self.counter = self.counter.wrapping_add(1);

        match bus.write_frame(&wire) {
            Ok(WIRE_FRAME_SIZE) => TransmitOutcome::Sent { counter },
            Ok(written) => TransmitOutcome::ShortWrite { counter, written },
            Err(error) => TransmitOutcome::Failed { counter, error },
        }
    }
}
