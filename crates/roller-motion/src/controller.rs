//! The stepping control loop.
//!
//! [`MotionController::run`] owns a dedicated thread for the life of the
//! process. Each cycle it polls the blackboard; on a mismatch it latches the
//! direction, energizes the driver and pulses the step line until the stop
//! rule ends the burst, then settles and de-energizes.

use spin_sleep::SpinSleeper;
use std::thread;
use tracing::{debug, error, info};

use crate::blackboard::{Poll, SharedBoard};
use crate::error::MotionError;
use crate::output::{DigitalOutput, StepperPins};
use crate::settings::{Direction, MotionConfig};

/// Summary of one burst.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BurstReport {
    /// Direction latched when the burst opened.
    pub direction: Direction,
    /// Step pulses issued.
    pub steps: u64,
    /// Current position after the last step.
    pub final_position: i64,
}

/// Outcome of one controller cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cycle {
    /// Nothing to do.
    Idle,
    /// On target with a stop request pending; the loop exits.
    Halted,
    /// A burst ran to completion.
    Burst(BurstReport),
}

/// Drives the stepper lines toward the blackboard target.
pub struct MotionController<P: DigitalOutput> {
    pins: StepperPins<P>,
    config: MotionConfig,
    board: SharedBoard,
    sleeper: SpinSleeper,
}

impl<P> MotionController<P>
where
    P: DigitalOutput,
    P::Error: Into<MotionError>,
{
    /// Spin for the last 100 µs of each half-period.
    const NATIVE_ACCURACY_NS: u32 = 100_000;

    /// Create a controller over `pins`. The pins are expected to be low.
    pub fn new(pins: StepperPins<P>, config: MotionConfig, board: SharedBoard) -> Self {
        Self {
            pins,
            config,
            board,
            sleeper: SpinSleeper::new(Self::NATIVE_ACCURACY_NS),
        }
    }

    /// Run until a stop request has been honoured.
    ///
    /// Sleeps one poll interval between cycles; that interval bounds how stale
    /// a new target can be before motion starts.
    ///
    /// # Errors
    ///
    /// Returns the first output failure. Outputs are de-energized on a best
    /// effort basis before returning.
    pub fn run(mut self) -> Result<(), MotionError> {
        info!(config = %self.config, "Motion controller started.");
        loop {
            thread::sleep(self.config.poll_interval());
            if let Cycle::Halted = self.cycle()? {
                info!(position = self.board.snapshot().current, "Stop request honoured, motion controller exiting.");
                return Ok(());
            }
        }
    }

    /// Poll once and run a burst if the target differs from the current
    /// position.
    pub fn cycle(&mut self) -> Result<Cycle, MotionError> {
        match self.board.poll() {
            Poll::Idle => Ok(Cycle::Idle),
            Poll::Halted => Ok(Cycle::Halted),
            Poll::Pending(direction) => self.burst(direction).map(Cycle::Burst),
        }
    }

    fn burst(&mut self, direction: Direction) -> Result<BurstReport, MotionError> {
        debug!(%direction, "Burst started.");
        match self.drive(direction) {
            Ok(steps) => {
                let positions = self.board.finish_burst();
                let report = BurstReport {
                    direction,
                    steps,
                    final_position: positions.current,
                };
                info!(
                    %direction,
                    steps,
                    current = positions.current,
                    target = positions.target,
                    "Burst finished."
                );
                Ok(report)
            }
            Err(e) => {
                error!(error = %e, "Output failure during burst, de-energizing.");
                if let Err(de) = self.pins.de_energize() {
                    error!(error = %de, "Failed to de-energize outputs after output failure.");
                }
                self.board.finish_burst();
                Err(e)
            }
        }
    }

    fn drive(&mut self, direction: Direction) -> Result<u64, MotionError> {
        let half_period = self.config.half_period();
        let rule = self.config.stop_rule();
        let mut steps = 0;

        self.pins.energize(direction)?;
        while self.board.advance(direction, rule).is_some() {
            self.pins.pulse(half_period, &self.sleeper)?;
            steps += 1;
        }

        thread::sleep(self.config.settle_delay());
        self.pins.de_energize()?;
        Ok(steps)
    }

    /// Whether the enable line is commanded high.
    pub fn is_energized(&self) -> bool {
        self.pins.is_energized()
    }
}

/// Fast pulses, no settling.
#[cfg(test)]
pub(crate) fn fast_config(steps_per_percent: f64) -> Result<MotionConfig, MotionError> {
    Ok(MotionConfig::new(500_000, steps_per_percent)?
        .with_settle_delay(std::time::Duration::ZERO)
        .with_poll_interval(std::time::Duration::from_millis(1)))
}
