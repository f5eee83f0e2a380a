//! Linux sysfs GPIO output lines.

use std::thread;
use std::time::Duration;

use sysfs_gpio::{Direction, Pin};

use super::DigitalOutput;
use crate::error::MotionError;

/// One exported sysfs GPIO line configured as an output.
#[derive(Debug)]
pub struct SysfsOutput {
    pin: Pin,
    high: bool,
}

impl SysfsOutput {
    /// Export `line`, configure it as an output and drive it low.
    ///
    /// # Errors
    ///
    /// Returns `Err(MotionError::Output)` if the line cannot be exported or
    /// configured, so a missing GPIO fails startup instead of the control loop.
    pub fn open(line: u64) -> Result<Self, MotionError> {
        let pin = Pin::new(line);
        pin.export().map_err(|e| fault(line, e))?;
        // udev needs a moment to fix permissions on the freshly exported line
        thread::sleep(Duration::from_millis(10));
        pin.set_direction(Direction::Out).map_err(|e| fault(line, e))?;
        pin.set_value(0).map_err(|e| fault(line, e))?;
        tracing::debug!(line, "sysfs gpio exported as output");
        Ok(Self { pin, high: false })
    }

    fn write(&mut self, value: u8) -> Result<(), MotionError> {
        self.pin
            .set_value(value)
            .map_err(|e| fault(self.pin.get_pin(), e))?;
        self.high = value != 0;
        Ok(())
    }
}

fn fault(line: u64, err: sysfs_gpio::Error) -> MotionError {
    MotionError::Output(format!("gpio {}: {}", line, err))
}

impl DigitalOutput for SysfsOutput {
    type Error = MotionError;

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.write(1)
    }

    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.write(0)
    }

    fn is_set_high(&self) -> bool {
        self.high
    }
}
