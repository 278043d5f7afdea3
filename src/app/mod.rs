//! Application core: pure heartbeat logic, zero I/O.
//!
//! Transmitter, receiver, counter-to-indicator mapper and fault latch,
//! composed by [`service::HeartbeatService`].  All interaction with a bus
//! or an LED happens through the **port traits** in [`ports`], so this
//! layer is fully testable without a CAN interface.

pub mod events;
pub mod fault;
pub mod mapper;
pub mod ports;
pub mod receiver;
pub mod service;
pub mod transmitter;
