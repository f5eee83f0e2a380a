//! Immutable motion configuration and the direction/stop-rule types the
//! controller latches per burst.

use core::fmt;
use core::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::MotionError;

/// Direction of a burst, latched when the burst starts.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Position counts down.
    Decreasing,
    /// Position counts up.
    Increasing,
}

impl Direction {
    /// Direction of pending motion from `current` toward `target`, or `None`
    /// when they are equal.
    pub fn between(current: i64, target: i64) -> Option<Direction> {
        match target.cmp(&current) {
            core::cmp::Ordering::Greater => Some(Direction::Increasing),
            core::cmp::Ordering::Less => Some(Direction::Decreasing),
            core::cmp::Ordering::Equal => None,
        }
    }

    /// The signed unit step for this direction.
    pub fn delta(self) -> i64 {
        match self {
            Direction::Increasing => 1,
            Direction::Decreasing => -1,
        }
    }

    /// Whether this is [`Direction::Increasing`].
    pub fn is_increasing(self) -> bool {
        self == Direction::Increasing
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Increasing => write!(f, "increasing"),
            Direction::Decreasing => write!(f, "decreasing"),
        }
    }
}

/// Condition that keeps a burst stepping, evaluated against the live target
/// before every step.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StopRule {
    /// Keep stepping while `target - current` has the latched sign.
    ///
    /// Bursts stop exactly on target in both directions, and a stop request
    /// (`target := current`) ends a burst at the next check.
    #[default]
    SameSign,
    /// Keep stepping while `increasing XOR (current > target)`.
    ///
    /// Decreasing bursts stop exactly on target. Increasing bursts keep going
    /// while `current <= target`, so they finish one step past the target and
    /// the next poll starts a one-step corrective burst.
    Latched,
}

impl StopRule {
    /// Whether a burst latched in `direction` takes another step.
    pub fn continues(self, direction: Direction, current: i64, target: i64) -> bool {
        match self {
            StopRule::SameSign => Direction::between(current, target) == Some(direction),
            StopRule::Latched => direction.is_increasing() ^ (current > target),
        }
    }
}

/// Motion configuration, fixed for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionConfig {
    pulse_rate: u32,
    steps_per_percent: f64,
    settle_delay: Duration,
    poll_interval: Duration,
    stop_rule: StopRule,
}

impl MotionConfig {
    /// Default pause after a burst before outputs are de-energized.
    pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(1);
    /// Default sleep between controller loop iterations.
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

    /// Construct a configuration with default settle delay, poll interval and
    /// stop rule.
    ///
    /// # Arguments
    ///
    /// * `pulse_rate`: Step pulses per second.
    /// * `steps_per_percent`: Steps that move the roller by 1%. A negative
    ///   value reverses the spin.
    ///
    /// # Errors
    ///
    /// Returns `Err(MotionError::InvalidPulseRate)` if `pulse_rate` is zero.
    /// Returns `Err(MotionError::InvalidStepRatio)` if `steps_per_percent` is
    /// zero or not finite.
    pub fn new(pulse_rate: u32, steps_per_percent: f64) -> Result<Self, MotionError> {
        if pulse_rate == 0 {
            return Err(MotionError::InvalidPulseRate("must be positive"));
        }
        if !steps_per_percent.is_finite() {
            return Err(MotionError::InvalidStepRatio("must be finite"));
        }
        if steps_per_percent == 0.0 {
            return Err(MotionError::InvalidStepRatio("must be non-zero"));
        }
        Ok(MotionConfig {
            pulse_rate,
            steps_per_percent,
            settle_delay: Self::DEFAULT_SETTLE_DELAY,
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
            stop_rule: StopRule::default(),
        })
    }

    /// Replace the settle delay.
    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    /// Replace the poll interval.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Replace the stop rule.
    pub fn with_stop_rule(mut self, stop_rule: StopRule) -> Self {
        self.stop_rule = stop_rule;
        self
    }

    /// Step pulses per second.
    pub fn pulse_rate(&self) -> u32 {
        self.pulse_rate
    }

    /// Duration of each on and off phase of a pulse: `1 / (2 * pulse_rate)`.
    pub fn half_period(&self) -> Duration {
        Duration::from_secs_f64(0.5 / f64::from(self.pulse_rate))
    }

    /// Steps per percent of travel. The sign encodes spin direction.
    pub fn steps_per_percent(&self) -> f64 {
        self.steps_per_percent
    }

    /// Pause after a burst before outputs are de-energized.
    pub fn settle_delay(&self) -> Duration {
        self.settle_delay
    }

    /// Sleep between controller loop iterations.
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Stop rule evaluated before every step.
    pub fn stop_rule(&self) -> StopRule {
        self.stop_rule
    }
}

impl fmt::Display for MotionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MotionConfig ({} pps, {:.2} steps/%, settle {:?}, poll {:?}, {:?})",
            self.pulse_rate, self.steps_per_percent, self.settle_delay, self.poll_interval, self.stop_rule
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_constructor() {
        let config = MotionConfig::new(840, 192.0).unwrap();
        assert_eq!(config.pulse_rate(), 840);
        assert_eq!(config.steps_per_percent(), 192.0);
        assert_eq!(config.settle_delay(), Duration::from_secs(1));
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
        assert_eq!(config.stop_rule(), StopRule::SameSign);
    }

    #[test]
    fn test_half_period() {
        let config = MotionConfig::new(500, 1.0).unwrap();
        assert!((config.half_period().as_secs_f64() - 0.001).abs() < 1e-9);
        let config = MotionConfig::new(840, 1.0).unwrap();
        let expected = 0.5 / 840.0;
        assert!((config.half_period().as_secs_f64() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_config_rejects_zero_pulse_rate() {
        let result = MotionConfig::new(0, 192.0);
        assert!(matches!(result, Err(MotionError::InvalidPulseRate("must be positive"))));
    }

    #[test]
    fn test_config_rejects_bad_ratio() {
        assert!(matches!(
            MotionConfig::new(840, 0.0),
            Err(MotionError::InvalidStepRatio("must be non-zero"))
        ));
        assert!(matches!(
            MotionConfig::new(840, f64::NAN),
            Err(MotionError::InvalidStepRatio("must be finite"))
        ));
        // Negative ratios are valid: they reverse the spin.
        assert!(MotionConfig::new(840, -192.0).is_ok());
    }

    #[test]
    fn test_direction_between() {
        assert_eq!(Direction::between(0, 10), Some(Direction::Increasing));
        assert_eq!(Direction::between(10, 0), Some(Direction::Decreasing));
        assert_eq!(Direction::between(5, 5), None);
        assert_eq!(Direction::Increasing.delta(), 1);
        assert_eq!(Direction::Decreasing.delta(), -1);
    }

    #[test]
    fn test_same_sign_rule_stops_on_target() {
        let rule = StopRule::SameSign;
        assert!(rule.continues(Direction::Increasing, 95, 96));
        assert!(!rule.continues(Direction::Increasing, 96, 96));
        assert!(!rule.continues(Direction::Increasing, 96, 50));
        assert!(rule.continues(Direction::Decreasing, 97, 96));
        assert!(!rule.continues(Direction::Decreasing, 96, 96));
        assert!(!rule.continues(Direction::Decreasing, 10, 50));
    }

    #[test]
    fn test_latched_rule_is_asymmetric() {
        let rule = StopRule::Latched;
        // Increasing bursts still step when already on target.
        assert!(rule.continues(Direction::Increasing, 96, 96));
        assert!(!rule.continues(Direction::Increasing, 97, 96));
        // Decreasing bursts stop on target.
        assert!(rule.continues(Direction::Decreasing, 97, 96));
        assert!(!rule.continues(Direction::Decreasing, 96, 96));
    }
}
