//! Simulated output lines.
//!
//! Used when no GPIO hardware is attached, and by the tests. Each line keeps
//! its level and a count of rising edges in a [`LineProbe`] that can be read
//! from any thread while the controller drives the line.

use core::convert::Infallible;
use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicU64, Ordering},
};

use super::DigitalOutput;

/// Observable state of one simulated line.
#[derive(Debug, Default)]
pub struct LineProbe {
    high: AtomicBool,
    rising_edges: AtomicU64,
}

impl LineProbe {
    /// Current level of the line.
    pub fn is_high(&self) -> bool {
        self.high.load(Ordering::Acquire)
    }

    /// Number of low-to-high transitions so far.
    pub fn rising_edges(&self) -> u64 {
        self.rising_edges.load(Ordering::Acquire)
    }
}

/// A named output line that only records what it is told.
#[derive(Debug, Clone)]
pub struct SimulatedOutput {
    name: &'static str,
    line: u64,
    probe: Arc<LineProbe>,
}

impl SimulatedOutput {
    /// A line labelled `name` standing in for GPIO `line`, starting low.
    pub fn new(name: &'static str, line: u64) -> Self {
        Self {
            name,
            line,
            probe: Arc::default(),
        }
    }

    /// Shared handle on this line's level and edge count.
    pub fn probe(&self) -> Arc<LineProbe> {
        Arc::clone(&self.probe)
    }
}

impl DigitalOutput for SimulatedOutput {
    type Error = Infallible;

    fn set_high(&mut self) -> Result<(), Self::Error> {
        if !self.probe.high.swap(true, Ordering::AcqRel) {
            self.probe.rising_edges.fetch_add(1, Ordering::AcqRel);
            tracing::trace!(line = self.line, name = self.name, "high");
        }
        Ok(())
    }

    fn set_low(&mut self) -> Result<(), Self::Error> {
        if self.probe.high.swap(false, Ordering::AcqRel) {
            tracing::trace!(line = self.line, name = self.name, "low");
        }
        Ok(())
    }

    fn is_set_high(&self) -> bool {
        self.probe.is_high()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::StepperPins;
    use crate::settings::Direction;
    use spin_sleep::SpinSleeper;
    use std::time::Duration;

    #[test]
    fn test_rising_edges_count_only_transitions() {
        let mut out = SimulatedOutput::new("step", 16);
        let probe = out.probe();
        out.set_high().unwrap();
        out.set_high().unwrap();
        out.set_low().unwrap();
        out.set_high().unwrap();
        assert_eq!(probe.rising_edges(), 2);
        assert!(probe.is_high());
    }

    #[test]
    fn test_pins_start_low_and_track_energize() {
        let enable = SimulatedOutput::new("enable", 25);
        let direction = SimulatedOutput::new("direction", 12);
        let step = SimulatedOutput::new("step", 16);
        let (en, dir, stp) = (enable.probe(), direction.probe(), step.probe());

        let mut pins = StepperPins::new(enable, direction, step).unwrap();
        assert!(!en.is_high() && !dir.is_high() && !stp.is_high());

        pins.energize(Direction::Increasing).unwrap();
        assert!(pins.is_energized());
        assert!(dir.is_high());

        pins.pulse(Duration::from_micros(1), &SpinSleeper::new(100_000)).unwrap();
        assert_eq!(stp.rising_edges(), 1);
        assert!(!stp.is_high());

        pins.energize(Direction::Decreasing).unwrap();
        assert!(!dir.is_high());

        pins.de_energize().unwrap();
        assert!(!en.is_high());
        assert!(!dir.is_high());
    }
}
