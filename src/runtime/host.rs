//! Host runtime harness (Linux, SocketCAN).
//!
//! ```text
//!  TickTimer thread ──PingTick──▶ ┌────────────┐
//!  SIGINT/SIGTERM  ──Shutdown───▶ │ EventQueue │──▶ main thread ──▶ HeartbeatService
//!                                 └────────────┘     (park / drain)
//! ```
//!
//! Timer and signal contexts only enqueue an event and unpark the main
//! thread.  Everything else, including the bus write, happens on the
//! main thread.
//!
//! The pong loop is a plain blocking read.  The bus adapter's short read
//! timeout exists only so a termination request is noticed; silence on
//! the bus is not reported.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle, Thread};
use std::time::{Duration, Instant};

use log::{error, info, warn};

use crate::app::ports::{BusPort, EventSink, IndicatorPort};
use crate::app::receiver::ReceiveCounts;
use crate::app::service::{HeartbeatService, ServiceStats, is_malformed};
use crate::config::{MalformedFramePolicy, ProtocolConfig};
use crate::error::{DeviceError, Error};
use crate::events::{Event, EventQueue};

// ── Tick schedule ─────────────────────────────────────────────

/// First tick after `initial_delay`, then one every `period`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickSchedule {
    pub initial_delay: Duration,
    pub period: Duration,
}

impl TickSchedule {
    pub fn from_config(config: &ProtocolConfig) -> Self {
        Self {
            initial_delay: Duration::from_millis(u64::from(config.initial_delay_ms)),
            period: Duration::from_millis(u64::from(config.tick_interval_ms)),
        }
    }

    /// Offset of tick `n` (0-based) from the moment the timer was armed.
    pub fn deadline(&self, n: u32) -> Duration {
        self.initial_delay + self.period * n
    }
}

// ── Tick timer thread ─────────────────────────────────────────

/// Periodic tick source.  Deadlines are computed from the arming instant,
/// so a slow main loop does not make the cadence drift.  Dropping the
/// timer stops and joins the thread.
pub struct TickTimer {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl TickTimer {
    pub fn spawn(
        schedule: TickSchedule,
        queue: Arc<EventQueue>,
        consumer: Thread,
    ) -> std::io::Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);

        let handle = thread::Builder::new()
            .name("ping-tick".into())
            .spawn(move || {
                let armed = Instant::now();
                let mut n: u32 = 0;
                while !stop_flag.load(Ordering::Acquire) {
                    let due = armed + schedule.deadline(n);
                    let now = Instant::now();
                    if now < due {
                        thread::park_timeout(due - now);
                        continue;
                    }
                    if !queue.push(Event::PingTick) {
                        warn!("tick dropped: event queue full");
                    }
                    consumer.unpark();
                    n = n.wrapping_add(1);
                }
            })?;

        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }
}

impl Drop for TickTimer {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            handle.thread().unpark();
            let _ = handle.join();
        }
    }
}

// ── Termination ───────────────────────────────────────────────

/// Route SIGINT / SIGTERM into `queue` as [`Event::Shutdown`].
#[cfg(feature = "host")]
pub fn install_termination_handler(
    queue: Arc<EventQueue>,
    consumer: Thread,
) -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(move || {
        queue.push(Event::Shutdown);
        consumer.unpark();
    })
}

// ── Run report ────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitReason {
    /// Clean shutdown after a termination request.
    Terminated,
    /// Unrecoverable error; cleanup has still run.
    Fatal(Error),
}

impl ExitReason {
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Terminated => 0,
            Self::Fatal(_) => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub reason: ExitReason,
    pub stats: ServiceStats,
    pub receive: ReceiveCounts,
}

// ── Ping ──────────────────────────────────────────────────────

/// Transmit on `schedule` until a [`Event::Shutdown`] arrives.
///
/// Must be called on the thread that `queue` producers unpark.
pub fn run_ping<B, I, F>(
    mut service: HeartbeatService<B, I, F>,
    queue: Arc<EventQueue>,
    schedule: TickSchedule,
    sink: &mut impl EventSink,
) -> RunReport
where
    B: BusPort,
    I: IndicatorPort,
    F: IndicatorPort,
{
    let mut reason = match service.start(sink) {
        Ok(()) => ExitReason::Terminated,
        Err(e) => ExitReason::Fatal(e),
    };

    if reason == ExitReason::Terminated {
        match TickTimer::spawn(schedule, Arc::clone(&queue), thread::current()) {
            Ok(timer) => {
                ping_loop(&mut service, &queue, sink);
                drop(timer);
            }
            Err(e) => {
                error!("cannot start tick timer: {e}");
                reason = ExitReason::Fatal(Error::Device(DeviceError::Driver {
                    op: "tick timer spawn",
                    code: e.raw_os_error().unwrap_or(-1),
                }));
            }
        }
    }

    finish(service, reason, sink)
}

fn ping_loop<B, I, F>(
    service: &mut HeartbeatService<B, I, F>,
    queue: &EventQueue,
    sink: &mut impl EventSink,
) where
    B: BusPort,
    I: IndicatorPort,
    F: IndicatorPort,
{
    loop {
        let mut stop = false;
        queue.drain(|event| match event {
            Event::Shutdown => stop = true,
            Event::PingTick if !stop => {
                service.on_tick(sink);
            }
            _ => {}
        });
        if stop {
            info!("termination requested");
            return;
        }
        thread::park();
    }
}

// ── Pong ──────────────────────────────────────────────────────

/// Receive until a termination request or an unrecoverable error.
pub fn run_pong<B, I, F>(
    mut service: HeartbeatService<B, I, F>,
    queue: &EventQueue,
    sink: &mut impl EventSink,
) -> RunReport
where
    B: BusPort,
    I: IndicatorPort,
    F: IndicatorPort,
{
    let policy = service.policy().malformed;
    let reason = match service.start(sink) {
        Err(e) => ExitReason::Fatal(e),
        Ok(()) => loop {
            if queue.take(Event::Shutdown) {
                info!("termination requested");
                break ExitReason::Terminated;
            }
            match service.receive_one(sink) {
                Ok(_) => {}
                Err(e) if is_malformed(&e) && policy == MalformedFramePolicy::FaultAndContinue => {
                    warn!("{e}; fault latched, continuing");
                }
                Err(e) => {
                    error!("{e}");
                    break ExitReason::Fatal(e);
                }
            }
        },
    };

    finish(service, reason, sink)
}

fn finish<B, I, F>(
    service: HeartbeatService<B, I, F>,
    mut reason: ExitReason,
    sink: &mut impl EventSink,
) -> RunReport
where
    B: BusPort,
    I: IndicatorPort,
    F: IndicatorPort,
{
    let stats = service.stats();
    let receive = service.receive_counts();

    if let Err(e) = service.shutdown(sink) {
        error!("cleanup: {e}");
        if reason == ExitReason::Terminated {
            reason = ExitReason::Fatal(e);
        }
    }

    RunReport {
        reason,
        stats,
        receive,
    }
}
