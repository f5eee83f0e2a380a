//! Error types for the motion crate.
//!
//! [`MotionError`] covers configuration and hardware output failures;
//! [`CommandError`] covers rejected position commands.

use core::convert::Infallible;
use core::fmt;

/// Errors raised while configuring or running the motion controller.
#[derive(Debug, Clone, PartialEq)]
pub enum MotionError {
    /// Error for an invalid pulse rate.
    /// This variant is returned when the pulse rate is zero.
    InvalidPulseRate(&'static str),
    /// Error for an invalid steps-per-percent ratio.
    /// This variant is returned when the ratio is zero, NaN or infinite.
    InvalidStepRatio(&'static str),
    /// A digital output could not be written or opened.
    Output(String),
}

impl fmt::Display for MotionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MotionError::InvalidPulseRate(msg) => write!(f, "Invalid pulse rate: {}", msg),
            MotionError::InvalidStepRatio(msg) => write!(f, "Invalid steps per percent: {}", msg),
            MotionError::Output(msg) => write!(f, "Output failure: {}", msg),
        }
    }
}

impl core::error::Error for MotionError {}

impl From<Infallible> for MotionError {
    fn from(err: Infallible) -> Self {
        match err {}
    }
}

/// Errors returned to callers of the command interface.
///
/// A rejected command never mutates the target position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    /// The requested percentage is outside `0..=100`.
    OutOfRange(i64),
    /// A shutdown stop request has been published; new targets are refused.
    ShuttingDown,
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::OutOfRange(pos) => {
                write!(f, "Position {} is out of range (expected 0..=100)", pos)
            }
            CommandError::ShuttingDown => write!(f, "Shutdown in progress, target is locked"),
        }
    }
}

impl core::error::Error for CommandError {}
