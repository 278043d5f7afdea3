//! sysfs LED indicator adapter.
//!
//! Writes a single ASCII `'0'` or `'1'` to an LED class `brightness` file.

use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::app::mapper::IndicatorState;
use crate::app::ports::IndicatorPort;
use crate::error::{DeviceError, IndicatorError};

/// User LED 0 on a BeagleBone.
pub const DEFAULT_LED_PATH: &str = "/sys/class/leds/beaglebone:green:usr0/brightness";

pub struct SysfsLed {
    path: PathBuf,
    file: File,
}

impl SysfsLed {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DeviceError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .write(true)
            .open(&path)
            .map_err(|e| DeviceError::IndicatorOpen {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl IndicatorPort for SysfsLed {
    fn set(&mut self, state: IndicatorState) -> Result<(), IndicatorError> {
        let io = |e: std::io::Error| IndicatorError::Io(e.kind());
        // sysfs attributes are read from offset 0 on every write.
        self.file.seek(SeekFrom::Start(0)).map_err(io)?;
        let written = self.file.write(&[state.as_ascii()]).map_err(io)?;
        if written != 1 {
            return Err(IndicatorError::ShortWrite { written });
        }
        Ok(())
    }
}
