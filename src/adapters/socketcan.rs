//! SocketCAN bus adapter (host roles).
//!
//! Opens a raw CAN socket bound to one interface and moves whole
//! `struct can_frame` images through plain `read(2)`/`write(2)`, so the
//! byte counts the protocol validates are exactly what the kernel
//! returned.  No kernel-side id filter is installed; the receiver does the
//! filtering.

use std::fs::File;
use std::io::{Read, Write};
use std::os::fd::{FromRawFd, IntoRawFd};
use std::time::Duration;

use ::socketcan::{CanSocket, Socket};

use crate::app::ports::BusPort;
use crate::error::{BusError, DeviceError};
use crate::frame::WireFrame;

/// How long one blocking read may wait before the pong loop gets a chance
/// to look for a termination request.
pub const READ_POLL_INTERVAL: Duration = Duration::from_millis(250);

pub struct SocketCanBus {
    interface: String,
    fd: File,
}

impl SocketCanBus {
    /// Bind a raw CAN socket to `interface`.
    pub fn open(interface: &str) -> Result<Self, DeviceError> {
        let bind_err = |e: std::io::Error| DeviceError::BusOpen {
            interface: interface.to_owned(),
            reason: e.to_string(),
        };

        let socket = CanSocket::open(interface).map_err(bind_err)?;
        socket.set_read_timeout(READ_POLL_INTERVAL).map_err(bind_err)?;

        // SAFETY: `into_raw_fd` hands over sole ownership of a valid,
        // open descriptor; the `File` becomes responsible for closing it.
        let fd = unsafe { File::from_raw_fd(socket.into_raw_fd()) };

        Ok(Self {
            interface: interface.to_owned(),
            fd,
        })
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }
}

impl BusPort for SocketCanBus {
    fn write_frame(&mut self, frame: &WireFrame) -> Result<usize, BusError> {
        Ok(self.fd.write(frame)?)
    }

    fn read_frame(&mut self, buf: &mut WireFrame) -> Result<usize, BusError> {
        Ok(self.fd.read(buf)?)
    }
}
