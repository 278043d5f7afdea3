//! Heartbeat frame codec.
//!
//! Wire format is the fixed-size Linux `struct can_frame` image, which is
//! also what a raw SocketCAN `read`/`write` moves:
//! ```text
//! ┌──────────────┬─────┬───────────┬──────────────────────┐
//! │ can_id (4B)  │ dlc │ pad (3B)  │ data (8B)            │
//! │ native endian│ 1B  │           │ data[0] = counter    │
//! └──────────────┴─────┴───────────┴──────────────────────┘
//! ```
//!
//! A valid heartbeat has `dlc == 1`.  The codec only checks the overall
//! byte count; the payload-length rule lives in the receiver so that a
//! truncated read and a non-heartbeat frame stay distinguishable.

use core::fmt;

/// Identifier used when none is configured.
pub const DEFAULT_IDENTIFIER: u32 = 0x7FF;

/// Largest 11-bit standard identifier.
pub const MAX_STANDARD_ID: u32 = 0x7FF;

/// Classic CAN payload capacity.
pub const MAX_DATA_LEN: usize = 8;

/// Size of one wire frame in bytes.
pub const WIRE_FRAME_SIZE: usize = 16;

/// Data length code of a heartbeat frame.
pub const HEARTBEAT_DLC: u8 = 1;

const DLC_OFFSET: usize = 4;
const DATA_OFFSET: usize = 8;

/// Raw wire image of one frame.
pub type WireFrame = [u8; WIRE_FRAME_SIZE];

/// A decoded frame.
///
/// `identifier` is the raw 32-bit id word, flag bits included, so an
/// extended or remote frame never compares equal to an 11-bit target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PingFrame {
    pub identifier: u32,
    pub length: u8,
    pub payload: [u8; MAX_DATA_LEN],
}

impl PingFrame {
    /// Payload bytes covered by the data length code.
    pub fn data(&self) -> &[u8] {
        let len = (self.length as usize).min(MAX_DATA_LEN);
        &self.payload[..len]
    }

    /// Counter carried by a well-formed heartbeat, `None` for any other shape.
    pub fn counter(&self) -> Option<u8> {
        (self.length == HEARTBEAT_DLC).then_some(self.payload[0])
    }

    /// Serialise into the fixed wire image.
    pub fn to_wire(&self) -> WireFrame {
        let mut wire = [0u8; WIRE_FRAME_SIZE];
        wire[..DLC_OFFSET].copy_from_slice(&self.identifier.to_ne_bytes());
        wire[DLC_OFFSET] = self.length;
        wire[DATA_OFFSET..].copy_from_slice(&self.payload);
        wire
    }
}

/// The byte count handed to [`decode`] is not one whole wire frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameShapeError {
    Size { got: usize, expected: usize },
}

impl fmt::Display for FrameShapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Size { got, expected } => {
                write!(f, "read {got} bytes, expected {expected}")
            }
        }
    }
}

/// Build the heartbeat frame for `counter`.
pub fn encode(identifier: u32, counter: u8) -> PingFrame {
    let mut payload = [0u8; MAX_DATA_LEN];
    payload[0] = counter;
    PingFrame {
        identifier,
        length: HEARTBEAT_DLC,
        payload,
    }
}

/// Parse one wire frame.
pub fn decode(wire: &[u8]) -> Result<PingFrame, FrameShapeError> {
    if wire.len() != WIRE_FRAME_SIZE {
        return Err(FrameShapeError::Size {
            got: wire.len(),
            expected: WIRE_FRAME_SIZE,
        });
    }

    let mut id = [0u8; 4];
    id.copy_from_slice(&wire[..DLC_OFFSET]);
    let mut payload = [0u8; MAX_DATA_LEN];
    payload.copy_from_slice(&wire[DATA_OFFSET..]);

    Ok(PingFrame {
        identifier: u32::from_ne_bytes(id),
        length: wire[DLC_OFFSET],
        payload,
    })
}
