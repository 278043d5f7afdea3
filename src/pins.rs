//! GPIO assignments for the ESP32-S3 CAN node.
//!
//! Drivers that take raw GPIO numbers read them from here.  The LED
//! drivers in `main.rs` take typed `gpioN` peripherals instead and must be
//! kept in step by hand.

// ---------------------------------------------------------------------------
// TWAI (CAN) controller, to an SN65HVD230 transceiver
// ---------------------------------------------------------------------------

pub const TWAI_TX_GPIO: i32 = 4;
pub const TWAI_RX_GPIO: i32 = 5;

// ---------------------------------------------------------------------------
// LEDs (active HIGH)
// ---------------------------------------------------------------------------

/// Follows the parity of the last valid heartbeat counter.
pub const PONG_LED_GPIO: i32 = 12;
/// Toggles on every transmit tick.
pub const ACTIVITY_LED_GPIO: i32 = 13;
/// Latched fault.
pub const FAULT_LED_GPIO: i32 = 14;
/// Lit once setup has completed.
pub const READY_LED_GPIO: i32 = 15;

// ---------------------------------------------------------------------------
// User input
// ---------------------------------------------------------------------------

/// Fault-clear button, active LOW with internal pull-up (BOOT button).
pub const BUTTON_GPIO: i32 = 0;
