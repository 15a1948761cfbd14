//! Monotonic time sources.
//!
//! The engine reasons exclusively in monotonic milliseconds since an
//! arbitrary epoch; wall-clock time never enters the domain. The clock is
//! injected everywhere it is consumed so tests can supply synthetic time.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Instant;

/// Provider of monotonic milliseconds since an arbitrary epoch.
pub trait MonotonicClock: Send + Sync {
    fn now_ms(&self) -> i64;
}

/// Clock anchored at an [`Instant`] captured on construction.
#[derive(Debug)]
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

impl MonotonicClock for SystemClock {
    fn now_ms(&self) -> i64 {
        self.origin.elapsed().as_millis() as i64
    }
}

/// Manually advanced clock for deterministic tests and simulations.
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ms: AtomicI64,
}

impl ManualClock {
    pub fn new(start_ms: i64) -> Self {
        Self {
            now_ms: AtomicI64::new(start_ms),
        }
    }

    pub fn advance(&self, delta_ms: i64) {
        self.now_ms.fetch_add(delta_ms, Ordering::SeqCst);
    }

    pub fn set(&self, now_ms: i64) {
        self.now_ms.store(now_ms, Ordering::SeqCst);
    }
}

impl MonotonicClock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}
