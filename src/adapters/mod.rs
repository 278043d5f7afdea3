//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter         | Implements     | Connects to                     |
//! |-----------------|----------------|---------------------------------|
//! | `socketcan`     | BusPort        | Linux raw CAN socket (host)     |
//! | `sysfs_led`     | IndicatorPort  | LED class `brightness` file     |
//! | `pin_indicator` | IndicatorPort  | any `embedded-hal` output pin   |
//! | `log_sink`      | EventSink      | `log` facade                    |
//!
//! The node's TWAI bus adapter lives in [`crate::drivers::twai`].

pub mod log_sink;
pub mod pin_indicator;
#[cfg(feature = "host")]
pub mod socketcan;
pub mod sysfs_led;
