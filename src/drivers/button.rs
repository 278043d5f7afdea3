//! Fault-clear push-button.
//!
//! ## Hardware
//!
//! Active-low momentary switch with pull-up.  The GPIO interrupt fires on
//! the falling edge and only enqueues [`Event::ButtonEdge`]; bounce is
//! filtered here, in the main loop.
//!
//! Debounce is a lockout: the first edge is accepted, further edges within
//! [`DEBOUNCE_MS`] of it are dropped.
//!
//! [`Event::ButtonEdge`]: crate::events::Event::ButtonEdge

pub const DEBOUNCE_MS: u32 = 50;

#[derive(Debug, Clone, Copy, Default)]
pub struct ButtonDebounce {
    last_accepted_ms: Option<u32>,
}

impl ButtonDebounce {
    pub const fn new() -> Self {
        Self {
            last_accepted_ms: None,
        }
    }

    /// Returns `true` if the edge at `now_ms` counts as a press.
    /// `now_ms` is a wrapping millisecond clock.
    pub fn accept(&mut self, now_ms: u32) -> bool {
        if let Some(last) = self.last_accepted_ms {
            if now_ms.wrapping_sub(last) < DEBOUNCE_MS {
                return false;
            }
        }
        self.last_accepted_ms = Some(now_ms);
        true
    }
}
