//! Interrupt-driven harness for the CAN node.
//!
//! The node runs both roles at once.  Three interrupt sources feed the
//! [`EventQueue`]:
//!
//! | Source            | Event          | Handling                              |
//! |-------------------|----------------|---------------------------------------|
//! | CAN RX alert      | `FramePending` | drain every queued frame              |
//! | Button edge       | `ButtonEdge`   | debounce, then clear the fault latch  |
//! | Tick timer        | `PingTick`     | transmit, toggle the activity LED     |
//! | Tick timer        | `TimerFault`   | latch the fault (pings have stopped)  |
//!
//! The queue hands events over in that priority order, so a backlog of
//! ticks never starves the receive path.  The node never shuts down;
//! a stray `Shutdown` is ignored.

use core::fmt::Display;

use log::{debug, error, warn};

use crate::app::fault::FaultCause;
use crate::app::mapper::IndicatorState;
use crate::app::ports::{BusPort, EventSink, IndicatorPort};
use crate::app::service::HeartbeatService;
use crate::drivers::button::ButtonDebounce;
use crate::events::{Event, EventQueue};

pub struct NodeDispatcher<A> {
    activity: A,
    activity_state: IndicatorState,
    button: ButtonDebounce,
}

impl<A: IndicatorPort> NodeDispatcher<A> {
    pub fn new(activity: A) -> Self {
        Self {
            activity,
            activity_state: IndicatorState::Off,
            button: ButtonDebounce::new(),
        }
    }

    pub fn activity_state(&self) -> IndicatorState {
        self.activity_state
    }

    /// Handle one event.  `now_ms` is the monotonic clock used for
    /// button debounce.
    pub fn handle<B, I, F>(
        &mut self,
        event: Event,
        service: &mut HeartbeatService<B, I, F>,
        now_ms: u32,
        sink: &mut impl EventSink,
    ) where
        B: BusPort,
        I: IndicatorPort,
        F: IndicatorPort,
    {
        match event {
            Event::FramePending => {
                let n = service.drain_pending(sink);
                debug!("drained {n} frame(s)");
            }
            Event::ButtonEdge => {
                if self.button.accept(now_ms) {
                    service.clear_fault(sink);
                }
            }
            Event::PingTick => {
                service.on_tick(sink);
                self.toggle_activity();
            }
            Event::TimerFault => {
                error!("tick timer stopped; no further pings");
                service.raise_external_fault(FaultCause::TickTimer, sink);
            }
            Event::Shutdown => debug!("shutdown ignored on node"),
        }
    }

    /// Drain `queue` in priority order.  Returns the number of events handled.
    pub fn dispatch<B, I, F>(
        &mut self,
        queue: &EventQueue,
        service: &mut HeartbeatService<B, I, F>,
        now_ms: u32,
        sink: &mut impl EventSink,
    ) -> usize
    where
        B: BusPort,
        I: IndicatorPort,
        F: IndicatorPort,
    {
        queue.drain(|event| self.handle(event, service, now_ms, sink))
    }

    fn toggle_activity(&mut self) {
        let next = self.activity_state.toggled();
        match self.activity.set(next) {
            Ok(()) => self.activity_state = next,
            Err(e) => warn!("activity LED: {e}"),
        }
    }
}

/// Report a setup failure: log it and light the fault LED.  The caller
/// halts afterwards.
pub fn signal_setup_failure(fault_led: &mut impl IndicatorPort, e: &dyn Display) {
    error!("setup failed: {e}; halting");
    if let Err(led) = fault_led.set(IndicatorState::On) {
        warn!("fault LED: {led}");
    }
}
