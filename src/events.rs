//! Interrupt-driven event queue.
//!
//! Events are produced by:
//! - the CAN controller (a frame is waiting in the receive FIFO)
//! - the push-button edge interrupt
//! - the ping tick timer (hardware timer on the node, a thread on hosts),
//!   including its own failure to re-arm
//! - the termination signal handler (hosts only)
//!
//! and consumed by a single main loop:
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ CAN RX      │────▶│              │     │              │
//! │ Button ISR  │────▶│  EventQueue  │────▶│  Main Loop   │
//! │ Tick timer  │────▶│  (lock-free) │     │  (consumer)  │
//! │ Signal      │────▶│              │     │              │
//! └─────────────┘     └──────────────┘     └──────────────┘
//! ```
//!
//! When several events are pending at once, [`EventQueue::drain`] hands
//! them over in priority order: inbound frames before the button, the
//! button before the tick, the tick before a timer failure report.

use heapless::mpmc::Q32;

/// Maximum number of pending events.
pub const EVENT_QUEUE_CAP: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Event {
    /// SIGINT / SIGTERM received.
    Shutdown = 0,
    /// At least one frame is waiting to be read.
    FramePending = 1,
    /// Falling edge on the fault-clear button (not yet debounced).
    ButtonEdge = 2,
    /// The ping tick timer fired.
    PingTick = 3,
    /// The tick timer failed to arm its periodic phase.
    TimerFault = 4,
}

impl Event {
    /// Lower value = handled first.
    pub const fn priority(self) -> u8 {
        self as u8
    }
}

/// Multi-producer queue shared between interrupt context and the main loop.
///
/// Producers only ever call [`push`](Self::push); it never blocks and never
/// allocates, so it is safe from an ISR or a signal-handling thread.
pub struct EventQueue {
    inner: Q32<Event>,
}

impl EventQueue {
    pub const fn new() -> Self {
        Self { inner: Q32::new() }
    }

    /// Enqueue an event.  Returns `false` if the queue is full (event dropped).
    pub fn push(&self, event: Event) -> bool {
        self.inner.enqueue(event).is_ok()
    }

    /// Dequeue the oldest event.
    pub fn pop(&self) -> Option<Event> {
        self.inner.dequeue()
    }

    /// Take everything currently pending and hand it to `handler` in
    /// priority order.  Events pushed while the handler runs wait for the
    /// next call.  Returns the number of events handled.
    pub fn drain(&self, mut handler: impl FnMut(Event)) -> usize {
        let mut batch: heapless::Vec<Event, EVENT_QUEUE_CAP> = heapless::Vec::new();
        while !batch.is_full() {
            match self.pop() {
                Some(event) => {
                    let _ = batch.push(event);
                }
                None => break,
            }
        }
        batch.sort_unstable_by_key(|e| e.priority());
        for &event in &batch {
            handler(event);
        }
        batch.len()
    }

    /// Whether any event of the given kind is waiting.  Consumes nothing
    /// except that kind.
    pub fn take(&self, wanted: Event) -> bool {
        let mut found = false;
        let mut keep: heapless::Vec<Event, EVENT_QUEUE_CAP> = heapless::Vec::new();
        while let Some(event) = self.pop() {
            if event == wanted {
                found = true;
            } else if keep.push(event).is_err() {
                break;
            }
        }
        for event in keep {
            self.push(event);
        }
        found
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Queue fed by the node's interrupt callbacks.  ISRs cannot capture
/// state, so this one has to be a static.
pub static ISR_EVENTS: EventQueue = EventQueue::new();
