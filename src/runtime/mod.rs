//! Runtime harnesses.
//!
//! Both harnesses drive the same [`HeartbeatService`](crate::app::service::HeartbeatService);
//! they differ only in where events come from:
//!
//! - [`host`]: a software tick timer thread plus a blocking bus read loop,
//!   terminated by SIGINT/SIGTERM.
//! - [`embedded`]: interrupt callbacks that push into the lock-free
//!   [`EventQueue`](crate::events::EventQueue), drained by the main task.

pub mod embedded;
pub mod host;
pub mod lifecycle;
