//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises one harness against
//! mock adapters.  All tests run on the host with no CAN interface or
//! LED hardware required.

#![cfg(not(target_os = "espidf"))]

mod heartbeat_tests;
mod host_runtime_tests;
mod lifecycle_tests;
mod mock_hw;
