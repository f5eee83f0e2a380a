//! Percentage commands over the step-unit blackboard.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::blackboard::SharedBoard;
use crate::error::CommandError;

/// Highest accepted percentage.
pub const MAX_PERCENT: i64 = 100;

/// Convert a percentage in `0..=100` into a step target.
///
/// Rounds half to even.
///
/// # Errors
///
/// Returns `Err(CommandError::OutOfRange)` for any percentage outside `0..=100`.
pub fn percent_to_steps(percent: i64, steps_per_percent: f64) -> Result<i64, CommandError> {
    if !(0..=MAX_PERCENT).contains(&percent) {
        return Err(CommandError::OutOfRange(percent));
    }
    Ok((percent as f64 * steps_per_percent).round_ties_even() as i64)
}

/// Convert a step position into a display percentage.
///
/// Negative results wrap by adding 100; they only occur when the sign of the
/// position disagrees with the sign of `steps_per_percent`.
pub fn steps_to_percent(steps: i64, steps_per_percent: f64) -> i64 {
    let percent = (steps as f64 / steps_per_percent).round_ties_even() as i64;
    if percent < 0 { percent + MAX_PERCENT } else { percent }
}

/// Snapshot reported to clients.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollerState {
    /// Current position as a percentage.
    pub current_pos: i64,
    /// Target position as a percentage.
    pub target_pos: i64,
    /// Sign of pending motion in step units: -1, 0 or 1.
    pub state: i8,
}

/// Translates percentage commands into blackboard targets.
#[derive(Debug, Clone)]
pub struct CommandInterface {
    board: SharedBoard,
    steps_per_percent: f64,
}

impl CommandInterface {
    /// Create a command interface over `board`.
    pub fn new(board: SharedBoard, steps_per_percent: f64) -> Self {
        Self {
            board,
            steps_per_percent,
        }
    }

    /// [`percent_to_steps`] with this interface's ratio.
    pub fn percent_to_steps(&self, percent: i64) -> Result<i64, CommandError> {
        percent_to_steps(percent, self.steps_per_percent)
    }

    /// [`steps_to_percent`] with this interface's ratio.
    pub fn steps_to_percent(&self, steps: i64) -> i64 {
        steps_to_percent(steps, self.steps_per_percent)
    }

    /// Current and target percentages plus the pending motion sign, all from
    /// one locked snapshot.
    pub fn get_state(&self) -> RollerState {
        let p = self.board.snapshot();
        RollerState {
            current_pos: self.steps_to_percent(p.current),
            target_pos: self.steps_to_percent(p.target),
            state: (p.target - p.current).signum() as i8,
        }
    }

    /// Validate `percent` and publish it as the new target. Returns the step
    /// target. Does not wait for motion.
    pub fn set_target(&self, percent: i64) -> Result<i64, CommandError> {
        let steps = self.percent_to_steps(percent)?;
        self.board.set_target(steps)?;
        tracing::info!(percent, steps, "New target published.");
        Ok(steps)
    }
}
