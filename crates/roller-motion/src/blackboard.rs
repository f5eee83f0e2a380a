//! Shared position state.
//!
//! The blackboard is the only state shared between the controller thread, the
//! command handlers and the shutdown path. Every read and write goes through
//! one mutex, so a reader never sees a half-written position and a snapshot
//! always pairs `current` and `target` from the same instant. The lock is
//! never held across a sleep or an output write.

use parking_lot::{Condvar, Mutex};
use std::{sync::Arc, time::Duration};

use crate::error::CommandError;
use crate::settings::{Direction, StopRule};

/// Positions in step units plus the controller's burst flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Positions {
    /// Ground-truth position, written only by the controller.
    pub current: i64,
    /// Desired position, written by commands and the shutdown path.
    pub target: i64,
    /// A burst is in progress and outputs may be energized.
    pub bursting: bool,
    /// A shutdown stop request has been published.
    pub halting: bool,
}

impl Positions {
    /// On target with no burst in flight.
    pub fn is_idle(&self) -> bool {
        self.current == self.target && !self.bursting
    }
}

/// What the controller should do after a poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Poll {
    /// On target, nothing to do.
    Idle,
    /// On target and a stop request is pending: the loop should exit.
    Halted,
    /// A burst was opened in the latched direction.
    Pending(Direction),
}

/// Mutex-guarded [`Positions`] plus a condvar signalled when a burst ends.
#[derive(Debug, Default)]
pub struct Blackboard {
    state: Mutex<Positions>,
    idle: Condvar,
}

/// Handle passed to the controller, command handlers and shutdown path.
pub type SharedBoard = Arc<Blackboard>;

impl Blackboard {
    /// A board at position zero with a matching target.
    pub fn new() -> Self {
        Self::default()
    }

    /// A board whose current and target positions both start at `position`.
    pub fn at(position: i64) -> Self {
        Blackboard {
            state: Mutex::new(Positions {
                current: position,
                target: position,
                ..Positions::default()
            }),
            idle: Condvar::new(),
        }
    }

    /// Copy of the positions taken under the lock.
    pub fn snapshot(&self) -> Positions {
        *self.state.lock()
    }

    /// Publish a new target.
    ///
    /// Refused with [`CommandError::ShuttingDown`] once a stop request exists.
    pub fn set_target(&self, target: i64) -> Result<(), CommandError> {
        let mut g = self.state.lock();
        if g.halting {
            return Err(CommandError::ShuttingDown);
        }
        g.target = target;
        Ok(())
    }

    /// Check for pending motion and open a burst if there is some.
    pub fn poll(&self) -> Poll {
        let mut g = self.state.lock();
        match Direction::between(g.current, g.target) {
            Some(direction) => {
                g.bursting = true;
                Poll::Pending(direction)
            }
            None if g.halting => Poll::Halted,
            None => Poll::Idle,
        }
    }

    /// Take one step in `direction` if `rule` still allows it against the live
    /// target. Returns the new current position.
    pub fn advance(&self, direction: Direction, rule: StopRule) -> Option<i64> {
        let mut g = self.state.lock();
        if rule.continues(direction, g.current, g.target) {
            g.current += direction.delta();
            Some(g.current)
        } else {
            None
        }
    }

    /// Close the burst opened by [`Blackboard::poll`] and wake idle waiters.
    pub fn finish_burst(&self) -> Positions {
        let snapshot = {
            let mut g = self.state.lock();
            g.bursting = false;
            *g
        };
        self.idle.notify_all();
        snapshot
    }

    /// Stop request: pin the target to the current position and refuse
    /// further targets. Returns the position the roller is asked to hold.
    pub fn request_halt(&self) -> i64 {
        let mut g = self.state.lock();
        g.halting = true;
        g.target = g.current;
        g.current
    }

    /// Block until idle or until `timeout` elapses.
    ///
    /// Returns the idle positions, or `Err` with the last positions seen on
    /// timeout.
    pub fn wait_for_idle(&self, timeout: Duration) -> Result<Positions, Positions> {
        let mut g = self.state.lock();
        let _ = self.idle.wait_while_for(&mut g, |p| !p.is_idle(), timeout);
        if g.is_idle() { Ok(*g) } else { Err(*g) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn test_poll_opens_burst() {
        let bb = Blackboard::new();
        assert_eq!(bb.poll(), Poll::Idle);
        bb.set_target(3).unwrap();
        assert_eq!(bb.poll(), Poll::Pending(Direction::Increasing));
        assert!(bb.snapshot().bursting);
        assert!(!bb.snapshot().is_idle());
    }

    #[test]
    fn test_advance_reads_live_target() {
        let bb = Blackboard::new();
        bb.set_target(2).unwrap();
        assert_eq!(bb.advance(Direction::Increasing, StopRule::SameSign), Some(1));
        bb.set_target(1).unwrap();
        assert_eq!(bb.advance(Direction::Increasing, StopRule::SameSign), None);
        assert_eq!(bb.snapshot().current, 1);
    }

    #[test]
    fn test_halt_pins_target_and_locks_it() {
        let bb = Blackboard::at(40);
        bb.set_target(90).unwrap();
        assert_eq!(bb.request_halt(), 40);
        let p = bb.snapshot();
        assert_eq!((p.current, p.target), (40, 40));
        assert_eq!(bb.set_target(10), Err(CommandError::ShuttingDown));
        assert_eq!(bb.snapshot().target, 40);
        assert_eq!(bb.poll(), Poll::Halted);
    }

    #[test]
    fn test_wait_for_idle_returns_immediately_when_idle() {
        let bb = Blackboard::at(7);
        let started = Instant::now();
        let p = bb.wait_for_idle(Duration::from_secs(5)).unwrap();
        assert_eq!(p.current, 7);
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_wait_for_idle_wakes_on_finish_burst() {
        let bb: SharedBoard = Arc::new(Blackboard::new());
        bb.set_target(1).unwrap();
        assert_eq!(bb.poll(), Poll::Pending(Direction::Increasing));

        let worker = {
            let bb = Arc::clone(&bb);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(20));
                bb.advance(Direction::Increasing, StopRule::SameSign);
                bb.finish_burst();
            })
        };

        let p = bb.wait_for_idle(Duration::from_secs(5)).unwrap();
        assert_eq!((p.current, p.target, p.bursting), (1, 1, false));
        worker.join().unwrap();
    }

    #[test]
    fn test_wait_for_idle_times_out() {
        let bb = Blackboard::new();
        bb.set_target(5).unwrap();
        let last = bb.wait_for_idle(Duration::from_millis(10)).unwrap_err();
        assert_eq!((last.current, last.target), (0, 5));
    }
}
