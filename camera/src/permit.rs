//! Capacity-1 permit guarding the camera hardware handle.

use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Mutual-exclusion token with a bounded-wait acquire.
///
/// Unlike a `Mutex`, acquisition and release may happen on different
/// threads: `open()` acquires on the caller thread and the device-ready
/// callback releases on the event thread.
pub struct Permit {
    available: Mutex<bool>,
    freed: Condvar,
}

impl Permit {
    pub fn new() -> Self {
        Self {
            available: Mutex::new(true),
            freed: Condvar::new(),
        }
    }

    /// Acquires the permit, waiting at most `timeout`.
    ///
    /// Returns `false` when the wait expired without acquisition.
    pub fn try_acquire(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut available = self.lock();
        loop {
            if *available {
                *available = false;
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let (guard, _) = self
                .freed
                .wait_timeout(available, deadline - now)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            available = guard;
        }
    }

    /// Acquires the permit, blocking without bound.
    pub fn acquire(&self) {
        let mut available = self.lock();
        while !*available {
            available = self
                .freed
                .wait(available)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
        *available = false;
    }

    /// Returns the permit; wakes one waiter.
    pub fn release(&self) {
        *self.lock() = true;
        self.freed.notify_one();
    }

    fn lock(&self) -> MutexGuard<'_, bool> {
        self.available
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for Permit {
    fn default() -> Self {
        Self::new()
    }
}
