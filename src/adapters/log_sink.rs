//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the `log` facade (ESP-IDF logger on the node, `env_logger` on hosts).
//! Per-frame lines are `debug`; state changes and faults are louder.

use log::{debug, error, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started { target_id } => {
                info!("START | id={:#X}", target_id);
            }
            AppEvent::LifecycleChanged { from, to } => {
                debug!("STATE | {:?} -> {:?}", from, to);
            }
            AppEvent::PingSent { counter } => {
                debug!("PING  | counter={}", counter);
            }
            AppEvent::ShortWrite { counter, written } => {
                warn!(
                    "PING  | wrote incorrect size to socket (counter={}, {} bytes)",
                    counter, written
                );
            }
            AppEvent::TransmitFailed { counter, error } => {
                warn!("PING  | transmit failed (counter={}): {}", counter, error);
            }
            AppEvent::PongReceived { counter, indicator } => {
                debug!("PONG  | counter={} led={:?}", counter, indicator);
            }
            AppEvent::FrameRejected(e) => {
                error!("PONG  | {}", e);
            }
            AppEvent::FaultRaised(cause) => {
                warn!("FAULT | raised ({:?})", cause);
            }
            AppEvent::FaultCleared => {
                info!("FAULT | cleared");
            }
            AppEvent::Stopped => {
                info!("STOP  | indicator off");
            }
        }
    }
}
