//! Protocol configuration.
//!
//! Everything here is fixed for the lifetime of a run.  Defaults match the
//! deployed heartbeat: id `0x7FF`, first tick after 1 s, then every 0.5 s.
//! Hosts may override the timing fields from a JSON file.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::frame::{DEFAULT_IDENTIFIER, MAX_STANDARD_ID};

/// Per-run heartbeat parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    /// Identifier of heartbeat frames (sent and accepted).
    pub target_id: u32,
    /// Delay before the first tick (milliseconds).
    pub initial_delay_ms: u32,
    /// Steady-state tick period (milliseconds).
    pub tick_interval_ms: u32,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            target_id: DEFAULT_IDENTIFIER,
            // First tick waits twice the steady period.
            initial_delay_ms: 1000,
            tick_interval_ms: 500,
        }
    }
}

impl ProtocolConfig {
    /// Default timing with a custom identifier.
    pub fn with_target(target_id: u32) -> Self {
        Self {
            target_id,
            ..Self::default()
        }
    }

    /// Reject values the protocol cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target_id > MAX_STANDARD_ID {
            return Err(ConfigError::IdentifierOutOfRange(self.target_id));
        }
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::ZeroTickInterval);
        }
        Ok(())
    }

    /// Parse and validate a JSON override document.  Missing fields keep
    /// their defaults.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(text).map_err(|e| ConfigError::File(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

/// What the receiver does after a truncated or mis-shaped frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedFramePolicy {
    /// Raise the fault, clean up and terminate the run.
    Exit,
    /// Raise the fault and keep listening.
    FaultAndContinue,
}

/// Role-specific fault behaviour.  The host and embedded roles differ on
/// purpose; see the presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RolePolicy {
    /// Whether a short or failed transmit raises the fault state.
    pub fault_on_transmit_error: bool,
    pub malformed: MalformedFramePolicy,
}

impl RolePolicy {
    /// Host ping: short writes are logged only.
    pub const fn host_ping() -> Self {
        Self {
            fault_on_transmit_error: false,
            malformed: MalformedFramePolicy::Exit,
        }
    }

    /// Host pong: malformed frames terminate the process unless `keep_going`.
    pub const fn host_pong(keep_going: bool) -> Self {
        Self {
            fault_on_transmit_error: false,
            malformed: if keep_going {
                MalformedFramePolicy::FaultAndContinue
            } else {
                MalformedFramePolicy::Exit
            },
        }
    }

    /// Embedded node: every failure latches the fault LED, nothing stops.
    pub const fn embedded() -> Self {
        Self {
            fault_on_transmit_error: true,
            malformed: MalformedFramePolicy::FaultAndContinue,
        }
    }
}

/// CAN controller operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BusMode {
    #[default]
    Normal,
    /// Transmit without requiring an acknowledgement; frames are looped
    /// back locally.  For bench testing a single node.
    SelfTest,
}

/// Bit segment timing.  Every node on a segment must resolve to the same
/// bit rate or it will never see a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitTiming {
    /// Peripheral clock divider (BRP).
    pub prescaler: u32,
    /// Synchronisation jump width, in time quanta.
    pub sjw: u8,
    /// Propagation + phase segment 1, in time quanta.
    pub tseg1: u8,
    /// Phase segment 2, in time quanta.
    pub tseg2: u8,
}

impl BitTiming {
    /// ESP32 TWAI on the 80 MHz APB clock.
    pub const ESP32_500K: Self = Self {
        prescaler: 8,
        sjw: 3,
        tseg1: 15,
        tseg2: 4,
    };

    /// STM32F4 bxCAN on the 42 MHz APB1 clock, as used by the F4 board.
    pub const STM32F4_500K: Self = Self {
        prescaler: 4,
        sjw: 1,
        tseg1: 14,
        tseg2: 6,
    };

    /// Quanta per bit, sync segment included.
    pub const fn quanta_per_bit(&self) -> u32 {
        1 + self.tseg1 as u32 + self.tseg2 as u32
    }

    /// Resulting bit rate for a given controller clock.
    pub const fn bitrate(&self, clock_hz: u32) -> u32 {
        clock_hz / (self.prescaler * self.quanta_per_bit())
    }

    /// Sample point in permille of the bit time.
    pub const fn sample_point_permille(&self) -> u32 {
        (1 + self.tseg1 as u32) * 1000 / self.quanta_per_bit()
    }
}

/// Parse an identifier the way `strtoumax(s, NULL, 0)` would: `0x` prefix
/// is hex, a leading `0` is octal, anything else decimal.  The value must
/// fit the 11-bit standard range.
pub fn parse_identifier(text: &str) -> Result<u32, ConfigError> {
    let s = text.trim();
    let parsed = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16)
    } else if s.len() > 1 && s.starts_with('0') {
        u32::from_str_radix(&s[1..], 8)
    } else {
        s.parse::<u32>()
    };

    let id = parsed.map_err(|_| ConfigError::InvalidIdentifier(text.to_owned()))?;
    if id > MAX_STANDARD_ID {
        return Err(ConfigError::IdentifierOutOfRange(id));
    }
    Ok(id)
}
