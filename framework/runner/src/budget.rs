use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Source of monotonic time for the driver.
pub trait Clock {
    /// Time elapsed since an arbitrary, fixed origin.
    fn now(&self) -> Duration;
}

/// Wall clock time.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

/// Approximate time limit for a single sweep.
///
/// The duration of the point that just finished is used as the estimate for the next one, so a
/// sweep is stopped when `elapsed + last_point > limit`. Reaching the limit exactly still allows
/// another point, and a point that is already running is never interrupted, so a sweep can
/// overshoot the limit by up to one point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeBudget {
    limit: Duration,
}

impl TimeBudget {
    pub fn new(limit: Duration) -> Self {
        Self { limit }
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }

    /// Whether the sweep should stop instead of starting another point.
    pub fn is_exhausted(&self, sweep_elapsed: Duration, last_point: Duration) -> bool {
        sweep_elapsed.saturating_add(last_point) > self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn test_should_allow_another_point_at_the_limit() {
        let budget = TimeBudget::new(secs(3));

        assert!(!budget.is_exhausted(secs(1), secs(1)));
        assert!(!budget.is_exhausted(secs(2), secs(1)));
        assert!(budget.is_exhausted(secs(7), secs(5)));
        assert!(budget.is_exhausted(secs(2), Duration::from_millis(1001)));
    }

    #[test]
    fn test_should_share_manual_time_between_clones() {
        let clock = ManualClock::new();
        let other = clock.clone();

        other.advance(secs(2));
        clock.advance(Duration::from_millis(500));

        assert_eq!(clock.now(), Duration::from_millis(2500));
        assert_eq!(other.now(), clock.now());
    }

    #[test]
    fn test_should_move_system_clock_forward() {
        let clock = SystemClock::new();
        let first = clock.now();
        assert!(clock.now() >= first);
    }
}
