//! Mock hardware adapters for integration tests.
//!
//! Records every bus write and indicator call so tests can assert on the
//! full history without a CAN interface or LED.

use std::collections::VecDeque;
use std::sync::Arc;

use canpingpong::app::events::AppEvent;
use canpingpong::app::mapper::IndicatorState;
use canpingpong::app::ports::{BusPort, EventSink, IndicatorPort};
use canpingpong::error::{BusError, IndicatorError};
use canpingpong::events::{Event, EventQueue};
use canpingpong::frame::{self, WIRE_FRAME_SIZE, WireFrame};

// ── MockBus ───────────────────────────────────────────────────

/// Scripted bus.  Reads pop `inbound` (any byte count, so truncated reads
/// can be staged); writes are recorded in `sent`.
#[derive(Default)]
pub struct MockBus {
    pub inbound: VecDeque<Vec<u8>>,
    pub sent: Vec<WireFrame>,
    /// Per-write results, consumed in order; a full write once empty.
    pub write_script: VecDeque<Result<usize, BusError>>,
    /// Push [`Event::Shutdown`] when a read finds `inbound` empty.
    pub shutdown_when_drained: Option<Arc<EventQueue>>,
    /// Push [`Event::Shutdown`] once this many frames have been written.
    pub shutdown_after_writes: Option<(usize, Arc<EventQueue>)>,
}

#[allow(dead_code)]
impl MockBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_frames(frames: impl IntoIterator<Item = WireFrame>) -> Self {
        let mut bus = Self::new();
        for f in frames {
            bus.push_frame(f);
        }
        bus
    }

    pub fn push_frame(&mut self, wire: WireFrame) {
        self.inbound.push_back(wire.to_vec());
    }

    pub fn push_raw(&mut self, bytes: &[u8]) {
        self.inbound.push_back(bytes.to_vec());
    }

    /// Counters carried by everything written so far.
    pub fn sent_counters(&self) -> Vec<u8> {
        self.sent
            .iter()
            .map(|w| frame::decode(w).expect("whole frame").payload[0])
            .collect()
    }
}

impl BusPort for MockBus {
    fn write_frame(&mut self, wire: &WireFrame) -> Result<usize, BusError> {
        self.sent.push(*wire);
        if let Some((n, queue)) = &self.shutdown_after_writes {
            if self.sent.len() == *n {
                queue.push(Event::Shutdown);
            }
        }
        self.write_script.pop_front().unwrap_or(Ok(WIRE_FRAME_SIZE))
    }

    fn read_frame(&mut self, buf: &mut WireFrame) -> Result<usize, BusError> {
        match self.inbound.pop_front() {
            Some(bytes) => {
                let n = bytes.len().min(WIRE_FRAME_SIZE);
                buf[..n].copy_from_slice(&bytes[..n]);
                Ok(n)
            }
            None => {
                if let Some(queue) = &self.shutdown_when_drained {
                    queue.push(Event::Shutdown);
                }
                Err(BusError::Timeout)
            }
        }
    }

    fn frame_pending(&mut self) -> bool {
        !self.inbound.is_empty()
    }
}

// ── MockIndicator ─────────────────────────────────────────────

#[derive(Default)]
pub struct MockIndicator {
    pub calls: Vec<IndicatorState>,
    /// Fail every write from this call index on.
    pub fail_from: Option<usize>,
}

#[allow(dead_code)]
impl MockIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<IndicatorState> {
        self.calls.last().copied()
    }
}

impl IndicatorPort for MockIndicator {
    fn set(&mut self, state: IndicatorState) -> Result<(), IndicatorError> {
        if self.fail_from.is_some_and(|n| self.calls.len() >= n) {
            return Err(IndicatorError::Io(std::io::ErrorKind::PermissionDenied));
        }
        self.calls.push(state);
        Ok(())
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
