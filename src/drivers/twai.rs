//! TWAI (CAN) controller driver for the node.
//!
//! Installs the ESP-IDF TWAI driver with an accept-all filter and exposes
//! it as a [`BusPort`].  Frames cross the port in the same 16-byte wire
//! image the host uses, so the receiver validates identically on both.
//!
//! The receive path is alert-driven: the main task sleeps in
//! [`TwaiBus::wait_for_rx`] and the harness drains the RX queue with
//! [`BusPort::frame_pending`] / [`BusPort::read_frame`].
//!
//! On non-espidf targets the driver is a loopback simulation: every
//! written frame becomes readable, as in self-test mode.

use crate::app::ports::BusPort;
use crate::config::{BitTiming, BusMode};
use crate::error::{BusError, DeviceError};
use crate::frame::WireFrame;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

#[cfg(target_os = "espidf")]
use crate::frame::{self, MAX_DATA_LEN, WIRE_FRAME_SIZE};

/// Flag bits of the wire identifier word.
#[cfg(target_os = "espidf")]
const CAN_EFF_FLAG: u32 = 0x8000_0000;
#[cfg(target_os = "espidf")]
const CAN_RTR_FLAG: u32 = 0x4000_0000;
#[cfg(target_os = "espidf")]
const CAN_EFF_MASK: u32 = 0x1FFF_FFFF;

/// Receive queue depth in the driver.
pub const RX_QUEUE_LEN: u32 = 16;
/// Transmit queue depth in the driver.
pub const TX_QUEUE_LEN: u32 = 4;

pub struct TwaiBus {
    mode: BusMode,
    #[cfg(not(target_os = "espidf"))]
    loopback: heapless::Deque<WireFrame, { RX_QUEUE_LEN as usize }>,
}

impl TwaiBus {
    pub fn mode(&self) -> BusMode {
        self.mode
    }
}

// ── ESP-IDF ───────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
fn ms_to_ticks(ms: u32) -> u32 {
    ms.saturating_mul(configTICK_RATE_HZ) / 1_000
}

/// Install and start the driver.
#[cfg(target_os = "espidf")]
pub fn install(
    tx_gpio: i32,
    rx_gpio: i32,
    timing: BitTiming,
    mode: BusMode,
) -> Result<TwaiBus, DeviceError> {
    let general = twai_general_config_t {
        mode: match mode {
            BusMode::Normal => twai_mode_t_TWAI_MODE_NORMAL,
            BusMode::SelfTest => twai_mode_t_TWAI_MODE_NO_ACK,
        },
        tx_io: tx_gpio,
        rx_io: rx_gpio,
        clkout_io: -1,
        bus_off_io: -1,
        tx_queue_len: TX_QUEUE_LEN,
        rx_queue_len: RX_QUEUE_LEN,
        alerts_enabled: TWAI_ALERT_RX_DATA,
        clkout_divider: 0,
        ..Default::default()
    };
    let timing_cfg = twai_timing_config_t {
        brp: timing.prescaler,
        tseg_1: timing.tseg1,
        tseg_2: timing.tseg2,
        sjw: timing.sjw,
        triple_sampling: false,
        ..Default::default()
    };
    let filter = twai_filter_config_t {
        acceptance_code: 0,
        acceptance_mask: 0xFFFF_FFFF,
        single_filter: true,
    };

    // SAFETY: configs live on this stack frame for the duration of the
    // call; the driver copies them.  Called once from the main task.
    unsafe {
        let ret = twai_driver_install(&general, &timing_cfg, &filter);
        if ret != ESP_OK as i32 {
            return Err(DeviceError::Driver { op: "twai_driver_install", code: ret });
        }
        let ret = twai_start();
        if ret != ESP_OK as i32 {
            return Err(DeviceError::Driver { op: "twai_start", code: ret });
        }
    }

    info!(
        "twai: started, {} bit/s, {:?} mode",
        timing.bitrate(80_000_000),
        mode
    );
    Ok(TwaiBus { mode })
}

#[cfg(target_os = "espidf")]
impl TwaiBus {
    /// Sleep until the controller raises an RX alert or `timeout_ms`
    /// passes.  Returns `true` if frames arrived.
    pub fn wait_for_rx(&mut self, timeout_ms: u32) -> bool {
        let mut alerts: u32 = 0;
        // SAFETY: driver installed in `install`; `alerts` outlives the call.
        let ret = unsafe { twai_read_alerts(&mut alerts, ms_to_ticks(timeout_ms)) };
        ret == ESP_OK as i32 && alerts & TWAI_ALERT_RX_DATA != 0
    }
}

#[cfg(target_os = "espidf")]
impl BusPort for TwaiBus {
    fn write_frame(&mut self, wire: &WireFrame) -> Result<usize, BusError> {
        let frame = frame::decode(wire).map_err(|_| BusError::Driver(ESP_ERR_INVALID_ARG as i32))?;

        let mut msg = twai_message_t::default();
        let mut flags = 0;
        if frame.identifier & CAN_EFF_FLAG != 0 {
            flags |= TWAI_MSG_FLAG_EXTD;
        }
        if self.mode == BusMode::SelfTest {
            flags |= TWAI_MSG_FLAG_SELF;
        }
        msg.__bindgen_anon_1.flags = flags;
        msg.identifier = frame.identifier & CAN_EFF_MASK;
        msg.data_length_code = frame.length.min(MAX_DATA_LEN as u8);
        msg.data = frame.payload;

        // SAFETY: `msg` is fully initialised; the driver copies it into
        // its TX queue.  Zero ticks: never block the main task.
        let ret = unsafe { twai_transmit(&msg, 0) };
        if ret != ESP_OK as i32 {
            return Err(BusError::Driver(ret));
        }
        Ok(WIRE_FRAME_SIZE)
    }

    fn read_frame(&mut self, buf: &mut WireFrame) -> Result<usize, BusError> {
        let mut msg = twai_message_t::default();
        // SAFETY: `msg` outlives the call; zero ticks, never blocks.
        let ret = unsafe { twai_receive(&mut msg, 0) };
        if ret == ESP_ERR_TIMEOUT as i32 {
            return Err(BusError::Timeout);
        }
        if ret != ESP_OK as i32 {
            return Err(BusError::Driver(ret));
        }

        // SAFETY: every view of the flags union is a plain u32 bitfield.
        let flags = unsafe { msg.__bindgen_anon_1.flags };
        let mut identifier = msg.identifier;
        if flags & TWAI_MSG_FLAG_EXTD != 0 {
            identifier |= CAN_EFF_FLAG;
        }
        if flags & TWAI_MSG_FLAG_RTR != 0 {
            identifier |= CAN_RTR_FLAG;
        }

        *buf = frame::PingFrame {
            identifier,
            length: msg.data_length_code,
            payload: msg.data,
        }
        .to_wire();
        Ok(WIRE_FRAME_SIZE)
    }

    fn frame_pending(&mut self) -> bool {
        let mut status = twai_status_info_t::default();
        // SAFETY: `status` outlives the call.
        let ret = unsafe { twai_get_status_info(&mut status) };
        ret == ESP_OK as i32 && status.msgs_to_rx > 0
    }
}

// ── Simulation ────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
pub fn install(
    tx_gpio: i32,
    rx_gpio: i32,
    timing: BitTiming,
    mode: BusMode,
) -> Result<TwaiBus, DeviceError> {
    log::info!(
        "twai(sim): loopback on tx={} rx={}, brp={} ({:?})",
        tx_gpio,
        rx_gpio,
        timing.prescaler,
        mode
    );
    Ok(TwaiBus {
        mode,
        loopback: heapless::Deque::new(),
    })
}

#[cfg(not(target_os = "espidf"))]
impl TwaiBus {
    pub fn wait_for_rx(&mut self, _timeout_ms: u32) -> bool {
        !self.loopback.is_empty()
    }

    /// Queue a frame as if another node had sent it.
    pub fn inject(&mut self, wire: WireFrame) -> bool {
        self.loopback.push_back(wire).is_ok()
    }
}

#[cfg(not(target_os = "espidf"))]
impl BusPort for TwaiBus {
    fn write_frame(&mut self, wire: &WireFrame) -> Result<usize, BusError> {
        // A full receive queue drops the echo, like the real controller.
        let _ = self.loopback.push_back(*wire);
        Ok(wire.len())
    }

    fn read_frame(&mut self, buf: &mut WireFrame) -> Result<usize, BusError> {
        let wire = self.loopback.pop_front().ok_or(BusError::Timeout)?;
        *buf = wire;
        Ok(wire.len())
    }

    fn frame_pending(&mut self) -> bool {
        !self.loopback.is_empty()
    }
}
