// ─────────────────────────────────────────────────────────────────────
// Drivegate — Monotonic Clock Interface
// ─────────────────────────────────────────────────────────────────────
//! Injected clock capability for the time-faded policy.
//!
//! Fade anchors are durations since an arbitrary origin, read once per
//! cycle. The source must be monotonic: a wall clock that can step
//! backwards would corrupt fade durations. The fake clock lets tests
//! advance time deterministically.

use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Trait for monotonic time sources.
pub trait MonotonicClock: Send + Sync {
    /// Time elapsed since the clock's origin.
    fn now(&self) -> Duration;
}

/// Production clock over [`std::time::Instant`].
pub struct StdClock {
    origin: Instant,
}

impl StdClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for StdClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock for StdClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Deterministic clock for tests; advances only when told to.
#[derive(Default)]
pub struct FakeClock {
    now: Mutex<Duration>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }

    pub fn set(&self, to: Duration) {
        *self.now.lock() = to;
    }
}

impl MonotonicClock for FakeClock {
    fn now(&self) -> Duration {
        *self.now.lock()
    }
}
