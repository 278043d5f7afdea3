//! Heartbeat service: the hexagonal core.
//!
//! [`HeartbeatService`] is the runtime context of one protocol run.  It
//! owns the counter, the bus and indicator capabilities, the fault latch
//! and the lifecycle.  Runtime harnesses call into it from a single main
//! loop; nothing here is global.
//!
//! ```text
//!   BusPort ◀──▶ ┌───────────────────────────┐ ──▶ EventSink
//!                │     HeartbeatService       │
//! IndicatorPort ◀│ Transmitter · Receiver     │
//!  fault output ◀│ Mapper · FaultController   │
//!                └───────────────────────────┘
//! ```

use log::{info, warn};

use crate::config::{ProtocolConfig, RolePolicy};
use crate::error::{Error, ReceiveError, Result};
use crate::runtime::lifecycle::{Lifecycle, LifecycleState};

use super::events::AppEvent;
use super::fault::{FaultCause, FaultController, FaultState};
use super::mapper::{IndicatorState, indicator_for};
use super::ports::{BusPort, EventSink, IndicatorPort};
use super::receiver::{ReceiveCounts, Receiver};
use super::transmitter::{TransmitOutcome, Transmitter};

/// Upper bound on frames handled per [`HeartbeatService::drain_pending`]
/// call, so a babbling node cannot pin the main loop forever.
pub const MAX_DRAIN_PER_CALL: usize = 64;

/// Running totals for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServiceStats {
    pub ticks: u32,
    pub short_writes: u32,
    pub transmit_failures: u32,
    pub indicator_updates: u32,
}

pub struct HeartbeatService<B, I, F> {
    config: ProtocolConfig,
    policy: RolePolicy,
    bus: B,
    indicator: I,
    fault_output: F,
    transmitter: Transmitter,
    receiver: Receiver,
    fault: FaultController,
    lifecycle: Lifecycle,
    indicator_state: IndicatorState,
    stats: ServiceStats,
}

impl<B, I, F> HeartbeatService<B, I, F>
where
    B: BusPort,
    I: IndicatorPort,
    F: IndicatorPort,
{
    // ── Lifecycle ─────────────────────────────────────────────

    /// Take ownership of the acquired capabilities and force both outputs
    /// Off.  Uninitialized → Bound.  Any failure is fatal to the run.
    pub fn bind(
        config: ProtocolConfig,
        policy: RolePolicy,
        bus: B,
        mut indicator: I,
        mut fault_output: F,
    ) -> Result<Self> {
        config.validate()?;
        indicator.set(IndicatorState::Off)?;
        fault_output.set(IndicatorState::Off)?;

        let mut lifecycle = Lifecycle::new();
        lifecycle.advance(LifecycleState::Bound)?;

        Ok(Self {
            transmitter: Transmitter::new(config.target_id),
            receiver: Receiver::new(config.target_id),
            config,
            policy,
            bus,
            indicator,
            fault_output,
            fault: FaultController::new(),
            lifecycle,
            indicator_state: IndicatorState::Off,
            stats: ServiceStats::default(),
        })
    }

    /// Bound → Running.
    pub fn start(&mut self, sink: &mut impl EventSink) -> Result<()> {
        self.transition(LifecycleState::Running, sink)?;
        sink.emit(&AppEvent::Started {
            target_id: self.config.target_id,
        });
        info!("heartbeat service running (id {:#X})", self.config.target_id);
        Ok(())
    }

    /// Running (or Bound) → ShuttingDown → Stopped.
    ///
    /// Forces the indicator Off, then drops the capabilities.  Consuming
    /// `self` makes the cleanup run at most once.  An indicator write error
    /// is reported after the lifecycle has still reached `Stopped`.
    pub fn shutdown(mut self, sink: &mut impl EventSink) -> Result<()> {
        self.transition(LifecycleState::ShuttingDown, sink)?;

        let cleared = self.indicator.set(IndicatorState::Off);
        if cleared.is_ok() {
            self.indicator_state = IndicatorState::Off;
        }
        if let Err(e) = self.fault_output.set(IndicatorState::Off) {
            warn!("fault output not cleared on shutdown: {e}");
        }

        self.transition(LifecycleState::Stopped, sink)?;
        sink.emit(&AppEvent::Stopped);
        cleared.map_err(Error::from)
    }

    fn transition(&mut self, to: LifecycleState, sink: &mut impl EventSink) -> Result<()> {
        let from = self.lifecycle.advance(to)?;
        sink.emit(&AppEvent::LifecycleChanged { from, to });
        Ok(())
    }

    // ── Ping ──────────────────────────────────────────────────

    /// One transmit tick.  Never fails: short writes and rejected writes
    /// are reported and, if the role policy says so, latch the fault.
    pub fn on_tick(&mut self, sink: &mut impl EventSink) -> TransmitOutcome {
        let outcome = self.transmitter.tick(&mut self.bus);
        self.stats.ticks = self.stats.ticks.wrapping_add(1);

        match outcome {
            TransmitOutcome::Sent { counter } => {
                sink.emit(&AppEvent::PingSent { counter });
            }
            TransmitOutcome::ShortWrite { counter, written } => {
                self.stats.short_writes = self.stats.short_writes.wrapping_add(1);
                sink.emit(&AppEvent::ShortWrite { counter, written });
                if self.policy.fault_on_transmit_error {
                    self.raise_fault(FaultCause::ShortWrite, sink);
                }
            }
            TransmitOutcome::Failed { counter, error } => {
                self.stats.transmit_failures = self.stats.transmit_failures.wrapping_add(1);
                sink.emit(&AppEvent::TransmitFailed { counter, error });
                if self.policy.fault_on_transmit_error {
                    self.raise_fault(FaultCause::TransmitFailed, sink);
                }
            }
        }
        outcome
    }

    // ── Pong ──────────────────────────────────────────────────

    /// Read and handle one frame.
    ///
    /// - `Ok(Some(counter))`: indicator now shows `indicator_for(counter)`.
    /// - `Ok(None)`: foreign frame or read timeout; nothing changed.
    /// - `Err(Error::Receive(..))` with a malformed cause: the fault has
    ///   already been raised; the caller applies the role's
    ///   [`MalformedFramePolicy`](crate::config::MalformedFramePolicy).
    /// - any other error is a device failure.
    pub fn receive_one(&mut self, sink: &mut impl EventSink) -> Result<Option<u8>> {
        match self.receiver.receive_one(&mut self.bus) {
            Ok(Some(counter)) => {
                let state = indicator_for(counter);
                self.indicator.set(state)?;
                self.indicator_state = state;
                self.stats.indicator_updates = self.stats.indicator_updates.wrapping_add(1);
                sink.emit(&AppEvent::PongReceived {
                    counter,
                    indicator: state,
                });
                Ok(Some(counter))
            }
            Ok(None) => Ok(None),
            Err(e) => {
                if let Some(cause) = malformed_cause(e) {
                    sink.emit(&AppEvent::FrameRejected(e));
                    self.raise_fault(cause, sink);
                }
                Err(e.into())
            }
        }
    }

    /// Handle every frame the controller has queued.  Malformed frames
    /// latch the fault and draining continues.  Returns the number of
    /// frames read.
    pub fn drain_pending(&mut self, sink: &mut impl EventSink) -> usize {
        let mut handled = 0;
        while handled < MAX_DRAIN_PER_CALL && self.bus.frame_pending() {
            if let Err(e) = self.receive_one(sink) {
                if !is_malformed(&e) {
                    warn!("receive failed while draining: {e}");
                }
            }
            handled += 1;
        }
        handled
    }

    // ── Fault ─────────────────────────────────────────────────

    fn raise_fault(&mut self, cause: FaultCause, sink: &mut impl EventSink) {
        if self.fault.raise(cause) {
            sink.emit(&AppEvent::FaultRaised(cause));
            if let Err(e) = self.fault_output.set(IndicatorState::On) {
                warn!("fault output not raised: {e}");
            }
        }
    }

    /// Latch a fault detected outside the protocol path (timer failure).
    /// Returns `true` if the fault was newly raised.
    pub fn raise_external_fault(&mut self, cause: FaultCause, sink: &mut impl EventSink) -> bool {
        let was_set = self.fault.is_set();
        self.raise_fault(cause, sink);
        !was_set
    }

    /// External clear trigger (button).  Returns `true` if a fault was
    /// actually cleared.
    pub fn clear_fault(&mut self, sink: &mut impl EventSink) -> bool {
        if !self.fault.clear() {
            return false;
        }
        if let Err(e) = self.fault_output.set(IndicatorState::Off) {
            warn!("fault output not cleared: {e}");
        }
        sink.emit(&AppEvent::FaultCleared);
        true
    }

    // ── Accessors ─────────────────────────────────────────────

    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    pub fn policy(&self) -> RolePolicy {
        self.policy
    }

    pub fn lifecycle_state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    pub fn fault_state(&self) -> FaultState {
        self.fault.state()
    }

    pub fn fault_cause(&self) -> Option<FaultCause> {
        self.fault.cause()
    }

    /// Last level successfully written to the indicator.
    pub fn indicator_state(&self) -> IndicatorState {
        self.indicator_state
    }

    pub fn next_counter(&self) -> u8 {
        self.transmitter.next_counter()
    }

    pub fn stats(&self) -> ServiceStats {
        self.stats
    }

    pub fn receive_counts(&self) -> ReceiveCounts {
        self.receiver.counts()
    }

    /// Direct access to the bus adapter, for harnesses that wait on
    /// controller-specific signals (RX alerts).
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }
}

fn malformed_cause(e: ReceiveError) -> Option<FaultCause> {
    match e {
        ReceiveError::Truncated { .. } => Some(FaultCause::Truncated),
        ReceiveError::BadShape { .. } => Some(FaultCause::BadShape),
        ReceiveError::Bus(_) => None,
    }
}

/// Whether `e` is a malformed-frame rejection (as opposed to a device error).
pub fn is_malformed(e: &Error) -> bool {
    matches!(e, Error::Receive(r) if r.is_malformed())
}
