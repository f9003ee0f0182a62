//! Exponential backoff schedule.

use std::time::Duration;

/// Strictly doubling delay sequence with an optional cap.
///
/// A zero initial delay yields nothing: no waiting between attempts.
/// A zero cap leaves growth unbounded (saturating at `Duration::MAX`).
/// The cap applies from the second delay on, once doubling meets or exceeds it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backoff {
    current: Duration,
    max: Duration,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self { current: initial, max }
    }

    /// Delay to wait now, advancing the schedule.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.current.is_zero() {
            return None;
        }

        let delay = self.current;
        let doubled = self.current.saturating_mul(2);
        self.current = if !self.max.is_zero() && doubled >= self.max {
            self.max
        } else {
            doubled
        };

        Some(delay)
    }
}

impl Iterator for Backoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        self.next_delay()
    }
}
