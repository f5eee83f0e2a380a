//! Bounded stop-then-exit protocol.
//!
//! A termination request pins the target to the current position and then
//! waits on the blackboard condvar until the controller reports idle. The wait
//! is bounded so a controller that cannot converge never hangs the process.

use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::blackboard::SharedBoard;

/// How the stop request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// The controller reached idle with outputs de-energized.
    Idle {
        /// Position the roller stopped at.
        position: i64,
        /// Time spent waiting for idle.
        waited: Duration,
    },
    /// The timeout elapsed before the controller reported idle.
    TimedOut {
        /// Current position when the wait gave up.
        current: i64,
        /// Target position when the wait gave up.
        target: i64,
    },
}

/// Publishes the stop request and waits for the controller to settle.
#[derive(Debug, Clone)]
pub struct ShutdownCoordinator {
    board: SharedBoard,
    timeout: Duration,
}

impl ShutdownCoordinator {
    /// Default upper bound on the wait for idle.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

    /// Create a coordinator that waits at most `timeout` for idle.
    pub fn new(board: SharedBoard, timeout: Duration) -> Self {
        Self { board, timeout }
    }

    /// Set `target := current` and lock the target against further commands.
    /// Returns the position the roller is asked to hold.
    pub fn request_stop(&self) -> i64 {
        let hold = self.board.request_halt();
        info!(position = hold, "Stop requested.");
        hold
    }

    /// Block until the controller is idle or the timeout elapses.
    pub fn wait_for_idle(&self) -> ShutdownOutcome {
        let started = Instant::now();
        match self.board.wait_for_idle(self.timeout) {
            Ok(p) => ShutdownOutcome::Idle {
                position: p.current,
                waited: started.elapsed(),
            },
            Err(p) => {
                warn!(
                    current = p.current,
                    target = p.target,
                    bursting = p.bursting,
                    timeout = ?self.timeout,
                    "Controller did not reach idle before the shutdown timeout."
                );
                ShutdownOutcome::TimedOut {
                    current: p.current,
                    target: p.target,
                }
            }
        }
    }

    /// [`request_stop`](Self::request_stop) followed by
    /// [`wait_for_idle`](Self::wait_for_idle).
    pub fn stop_and_wait(&self) -> ShutdownOutcome {
        self.request_stop();
        self.wait_for_idle()
    }
}
