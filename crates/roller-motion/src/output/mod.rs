//! Digital output facade for the stepper driver.
//!
//! The driver takes three independent lines: enable, direction and step.
//! Writes are fire-and-forget with no feedback from the driver; the only
//! readback is the level this side last commanded.

pub mod sim;
#[cfg(feature = "gpio-hardware")]
pub mod sysfs;

use spin_sleep::SpinSleeper;
use std::time::Duration;

use crate::error::MotionError;
use crate::settings::Direction;

/// Capability to set a digital output state (high/low).
pub trait DigitalOutput {
    /// Error raised by a failed write.
    type Error;

    /// Drive the line high.
    fn set_high(&mut self) -> Result<(), Self::Error>;

    /// Drive the line low.
    fn set_low(&mut self) -> Result<(), Self::Error>;

    /// Level last commanded on this line.
    fn is_set_high(&self) -> bool;
}

/// The three lines of a step/direction/enable driver.
pub struct StepperPins<P: DigitalOutput> {
    enable: P,
    direction: P,
    step: P,
}

impl<P> StepperPins<P>
where
    P: DigitalOutput,
    P::Error: Into<MotionError>,
{
    /// Take ownership of the lines and drive all of them low.
    pub fn new(mut enable: P, mut direction: P, mut step: P) -> Result<Self, MotionError> {
        enable.set_low().map_err(Into::into)?;
        direction.set_low().map_err(Into::into)?;
        step.set_low().map_err(Into::into)?;
        Ok(Self {
            enable,
            direction,
            step,
        })
    }

    /// Enable the driver and set the direction line (high = increasing).
    pub fn energize(&mut self, direction: Direction) -> Result<(), MotionError> {
        self.enable.set_high().map_err(Into::into)?;
        if direction.is_increasing() {
            self.direction.set_high().map_err(Into::into)
        } else {
            self.direction.set_low().map_err(Into::into)
        }
    }

    /// One full step cycle: high for `half_period`, then low for `half_period`.
    pub fn pulse(&mut self, half_period: Duration, sleeper: &SpinSleeper) -> Result<(), MotionError> {
        self.step.set_high().map_err(Into::into)?;
        sleeper.sleep(half_period);
        self.step.set_low().map_err(Into::into)?;
        sleeper.sleep(half_period);
        Ok(())
    }

    /// Drive enable and direction low.
    pub fn de_energize(&mut self) -> Result<(), MotionError> {
        self.enable.set_low().map_err(Into::into)?;
        self.direction.set_low().map_err(Into::into)
    }

    /// Whether the enable line is commanded high.
    pub fn is_energized(&self) -> bool {
        self.enable.is_set_high()
    }
}
