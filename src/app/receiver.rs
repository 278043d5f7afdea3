//! Pong receiver / validator.
//!
//! Checks run in a fixed order: whole frame, then data length, then
//! identifier.  Frames for other identifiers are not errors; the bus is
//! shared and other traffic is expected.

use log::debug;

use crate::error::{BusError, ReceiveError};
use crate::frame::{self, HEARTBEAT_DLC, WIRE_FRAME_SIZE, WireFrame};

use super::ports::BusPort;

/// Per-receiver counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReceiveCounts {
    pub accepted: u32,
    pub foreign: u32,
    pub malformed: u32,
}

#[derive(Debug, Clone)]
pub struct Receiver {
    target: u32,
    counts: ReceiveCounts,
}

impl Receiver {
    pub const fn new(target: u32) -> Self {
        Self {
            target,
            counts: ReceiveCounts {
                accepted: 0,
                foreign: 0,
                malformed: 0,
            },
        }
    }

    pub const fn counts(&self) -> ReceiveCounts {
        self.counts
    }

    /// Validate the bytes of one read.
    ///
    /// `Ok(None)` for a well-formed frame addressed elsewhere.
    pub fn validate(&mut self, wire: &[u8]) -> Result<Option<u8>, ReceiveError> {
        let frame = frame::decode(wire)
            .inspect_err(|_| self.counts.malformed = self.counts.malformed.wrapping_add(1))?;

        if frame.length != HEARTBEAT_DLC {
            self.counts.malformed = self.counts.malformed.wrapping_add(1);
            return Err(ReceiveError::BadShape {
                length: frame.length,
            });
        }

        if frame.identifier != self.target {
            self.counts.foreign = self.counts.foreign.wrapping_add(1);
            debug!("ignoring frame id {:#X}", frame.identifier);
            return Ok(None);
        }

        self.counts.accepted = self.counts.accepted.wrapping_add(1);
        Ok(Some(frame.payload[0]))
    }

    /// Read one frame from `bus` and validate it.  A read timeout is
    /// reported as `Ok(None)`, like a foreign frame.
    pub fn receive_one(&mut self, bus: &mut impl BusPort) -> Result<Option<u8>, ReceiveError> {
        let mut buf: WireFrame = [0u8; WIRE_FRAME_SIZE];
        match bus.read_frame(&mut buf) {
            Ok(n) => self.validate(&buf[..n.min(WIRE_FRAME_SIZE)]),
            Err(BusError::Timeout) => Ok(None),
            Err(e) => Err(ReceiveError::Bus(e)),
        }
    }
}
