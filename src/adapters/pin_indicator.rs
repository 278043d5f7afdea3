//! GPIO indicator adapter.
//!
//! Any `embedded-hal` output pin is an [`IndicatorPort`].  On the node the
//! pins are `esp-idf-hal` `PinDriver`s; tests use a recording pin.

use embedded_hal::digital::OutputPin;

use crate::app::mapper::IndicatorState;
use crate::app::ports::IndicatorPort;
use crate::error::IndicatorError;

pub struct PinIndicator<P> {
    pin: P,
    active_low: bool,
}

impl<P: OutputPin> PinIndicator<P> {
    /// LED lit when the pin is driven high.
    pub fn new(pin: P) -> Self {
        Self {
            pin,
            active_low: false,
        }
    }

    /// LED lit when the pin is driven low.
    pub fn active_low(pin: P) -> Self {
        Self {
            pin,
            active_low: true,
        }
    }

    pub fn into_inner(self) -> P {
        self.pin
    }
}

impl<P: OutputPin> IndicatorPort for PinIndicator<P> {
    fn set(&mut self, state: IndicatorState) -> Result<(), IndicatorError> {
        let high = state.is_on() != self.active_low;
        let res = if high {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        res.map_err(|_| IndicatorError::Gpio)
    }
}
