/*!
 * Clock Interrupt
 * Periodic reference-bit clearing for NRU
 */

use super::types::ScalingPolicy;
use std::time::Duration;

/// Decides when the periodic clock interrupt fires
///
/// Fed with the host's elapsed simulation time. The interval is tracked in
/// every mode but the interrupt only fires while NRU is active. Time moving
/// backwards (a restarted simulation) resets the last mark to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockInterrupt {
    interval: Duration,
    last_mark: Duration,
}

impl ClockInterrupt {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_mark: Duration::ZERO,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Advance to `elapsed`; true when reference bits should be cleared now
    pub fn tick(&mut self, elapsed: Duration, policy: ScalingPolicy) -> bool {
        if elapsed < self.last_mark {
            self.last_mark = Duration::ZERO;
        }

        if elapsed - self.last_mark < self.interval {
            return false;
        }

        self.last_mark = elapsed;
        policy == ScalingPolicy::Nru
    }

    pub fn reset(&mut self) {
        self.last_mark = Duration::ZERO;
    }
}
