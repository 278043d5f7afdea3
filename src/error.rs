//! Unified error types for the heartbeat protocol.
//!
//! Each subsystem has its own small enum; every one of them converts into
//! the crate-wide [`Error`] so the runtime harness can apply a single exit
//! policy.  Bus and indicator errors are `Copy` so they can travel through
//! the transmit/receive paths without allocation.

use core::fmt;

use crate::frame::FrameShapeError;
use crate::runtime::lifecycle::LifecycleError;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the crate funnels into this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Configuration is invalid (bad identifier, zero tick interval, …).
    Config(ConfigError),
    /// Bus or indicator could not be acquired.
    Device(DeviceError),
    /// An inbound frame failed validation or the bus read failed.
    Receive(ReceiveError),
    /// The indicator could not be driven.
    Indicator(IndicatorError),
    /// The harness was asked for an illegal lifecycle transition.
    Lifecycle(LifecycleError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Device(e) => write!(f, "device: {e}"),
            Self::Receive(e) => write!(f, "receive: {e}"),
            Self::Indicator(e) => write!(f, "indicator: {e}"),
            Self::Lifecycle(e) => write!(f, "lifecycle: {e}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// `-n <interface>` was not given.
    MissingInterface,
    /// Identifier text could not be parsed as an integer.
    InvalidIdentifier(String),
    /// Identifier does not fit the 11-bit standard range.
    IdentifierOutOfRange(u32),
    /// Tick interval of zero would spin the transmitter.
    ZeroTickInterval,
    /// Override file could not be read or parsed.
    File(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingInterface => write!(f, "option -n [ifname] is required"),
            Self::InvalidIdentifier(s) => write!(f, "invalid CAN id '{s}'"),
            Self::IdentifierOutOfRange(id) => {
                write!(f, "CAN id {id:#X} exceeds the 11-bit range (max 0x7FF)")
            }
            Self::ZeroTickInterval => write!(f, "tick interval must be non-zero"),
            Self::File(msg) => write!(f, "config file: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Device acquisition errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    /// Opening or binding the CAN socket failed.
    BusOpen { interface: String, reason: String },
    /// Opening the indicator control path failed.
    IndicatorOpen { path: String, reason: String },
    /// An ESP-IDF driver call returned a non-OK code.
    Driver { op: &'static str, code: i32 },
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BusOpen { interface, reason } => {
                write!(f, "binding CAN interface {interface}: {reason}")
            }
            Self::IndicatorOpen { path, reason } => write!(f, "opening LED {path}: {reason}"),
            Self::Driver { op, code } => write!(f, "{op} failed (rc={code})"),
        }
    }
}

impl std::error::Error for DeviceError {}

impl From<DeviceError> for Error {
    fn from(e: DeviceError) -> Self {
        Self::Device(e)
    }
}

// ---------------------------------------------------------------------------
// Bus errors
// ---------------------------------------------------------------------------

/// Errors surfaced by a [`BusPort`](crate::app::ports::BusPort).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    /// No frame arrived within the read timeout (or the read was interrupted).
    Timeout,
    /// The operating system rejected the read or write.
    Io(std::io::ErrorKind),
    /// The CAN controller driver returned an error code.
    Driver(i32),
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "timed out"),
            Self::Io(kind) => write!(f, "I/O error: {kind}"),
            Self::Driver(rc) => write!(f, "driver error (rc={rc})"),
        }
    }
}

impl std::error::Error for BusError {}

impl From<std::io::Error> for BusError {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::WouldBlock
            | std::io::ErrorKind::TimedOut
            | std::io::ErrorKind::Interrupted => Self::Timeout,
            kind => Self::Io(kind),
        }
    }
}

// ---------------------------------------------------------------------------
// Receive errors
// ---------------------------------------------------------------------------

/// Why an inbound frame was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiveError {
    /// The read did not yield exactly one complete wire frame.
    Truncated { got: usize },
    /// The frame is complete but its data length is not 1.
    BadShape { length: u8 },
    /// The bus read itself failed.
    Bus(BusError),
}

impl ReceiveError {
    /// Malformed-input errors are the ones that raise the fault state;
    /// a failing bus read is a device problem instead.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Truncated { .. } | Self::BadShape { .. })
    }
}

impl fmt::Display for ReceiveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Truncated { got } => write!(f, "incomplete can frame ({got} bytes)"),
            Self::BadShape { length } => write!(f, "unexpected ping frame size (dlc={length})"),
            Self::Bus(e) => write!(f, "can frame read: {e}"),
        }
    }
}

impl From<FrameShapeError> for ReceiveError {
    fn from(e: FrameShapeError) -> Self {
        match e {
            FrameShapeError::Size { got, .. } => Self::Truncated { got },
        }
    }
}

impl std::error::Error for ReceiveError {}

impl From<ReceiveError> for Error {
    fn from(e: ReceiveError) -> Self {
        Self::Receive(e)
    }
}

// ---------------------------------------------------------------------------
// Indicator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorError {
    /// Writing the control file failed.
    Io(std::io::ErrorKind),
    /// The control file accepted a different number of bytes than one.
    ShortWrite { written: usize },
    /// The GPIO driver refused the level change.
    Gpio,
}

impl fmt::Display for IndicatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(kind) => write!(f, "setting LED brightness: {kind}"),
            Self::ShortWrite { written } => {
                write!(f, "wrote incorrect size to LED ({written} bytes)")
            }
            Self::Gpio => write!(f, "GPIO write failed"),
        }
    }
}

impl std::error::Error for IndicatorError {}

impl From<IndicatorError> for Error {
    fn from(e: IndicatorError) -> Self {
        Self::Indicator(e)
    }
}

impl From<LifecycleError> for Error {
    fn from(e: LifecycleError) -> Self {
        Self::Lifecycle(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
