//! Node drivers: CAN controller, tick timer, button interrupt.
//!
//! Each module carries an ESP-IDF implementation behind
//! `#[cfg(target_os = "espidf")]` and a simulation stub for host builds.

pub mod button;
pub mod hw_init;
pub mod hw_timer;
pub mod twai;
