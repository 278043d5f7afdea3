//! CAN heartbeat library.
//!
//! A transmitter emits a wrapping one-byte counter on a fixed identifier;
//! a receiver validates each frame, mirrors the counter's parity on an
//! indicator and latches a fault on malformed input.  The protocol core
//! in [`app`] is hardware-free; [`runtime::host`] drives it with a
//! software timer over SocketCAN and [`runtime::embedded`] drives it from
//! interrupt events on an ESP32 TWAI controller.
//!
//! ESP-IDF code is guarded by `#[cfg(target_os = "espidf")]` within each
//! module; the same paths build as simulations on the host.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
#[cfg(feature = "host")]
pub mod cli;
pub mod config;
pub mod drivers;
pub mod error;
pub mod events;
pub mod frame;
pub mod pins;
pub mod runtime;
