//! Counter → indicator mapping.

/// Binary indicator level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IndicatorState {
    #[default]
    Off,
    On,
}

impl IndicatorState {
    pub const fn is_on(self) -> bool {
        matches!(self, Self::On)
    }

    /// ASCII level as written to a sysfs `brightness` file.
    pub const fn as_ascii(self) -> u8 {
        match self {
            Self::Off => b'0',
            Self::On => b'1',
        }
    }

    pub const fn toggled(self) -> Self {
        match self {
            Self::Off => Self::On,
            Self::On => Self::Off,
        }
    }
}

impl From<bool> for IndicatorState {
    fn from(on: bool) -> Self {
        if on { Self::On } else { Self::Off }
    }
}

/// On for odd counters, Off for even.  With one tick every 0.5 s this
/// blinks at 1 Hz.
pub const fn indicator_for(counter: u8) -> IndicatorState {
    if counter & 1 == 1 {
        IndicatorState::On
    } else {
        IndicatorState::Off
    }
}
