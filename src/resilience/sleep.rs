//! Blocking wait used between synchronous retry attempts.

use std::time::Duration;

/// Blocks the calling thread for a delay.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, delay: Duration);
}

/// `std::thread::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, delay: Duration) {
        std::thread::sleep(delay);
    }
}
