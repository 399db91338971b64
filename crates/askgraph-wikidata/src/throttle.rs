//! Pacing for remote calls.
//!
//! Two guarantees, both with the same `delay`:
//! - dispatches through one `Throttle` start at least `delay` apart, across
//!   all threads sharing it;
//! - the calling thread pauses `delay` after each call completes.

use parking_lot::Mutex;
use std::thread;
use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct Throttle {
    delay: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl Throttle {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            next_slot: Mutex::new(None),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Run one remote call under the pacing contract.
    pub fn run<T>(&self, call: impl FnOnce() -> T) -> T {
        self.admit();
        let out = call();
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
        out
    }

    /// Reserve the next dispatch slot and wait for it.
    fn admit(&self) {
        if self.delay.is_zero() {
            return;
        }
        let wait = {
            let mut next = self.next_slot.lock();
            let now = Instant::now();
            let slot = match *next {
                Some(at) if at > now => at,
                _ => now,
            };
            *next = Some(slot + self.delay);
            slot.saturating_duration_since(now)
        };
        if !wait.is_zero() {
            tracing::trace!(wait_ms = wait.as_millis() as u64, "throttled");
            thread::sleep(wait);
        }
    }
}
