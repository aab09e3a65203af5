//! General time utility functions and clock sources
//!
//! Anything that has to wait on time (the routine executor for instance)
//! does so through the [`Clock`] trait, so that it can be driven by a
//! [`SimClock`] in tests and by a [`SystemClock`] on the robot.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Number of nanoseconds in a second
pub const NANOS_PER_SECOND: i64 = 1_000_000_000;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A monotonic source of time in milliseconds.
pub trait Clock {
    /// Milliseconds elapsed since the clock's own epoch.
    fn now_ms(&self) -> u64;

    /// Yield for the given period.
    ///
    /// A real clock blocks the calling thread, a simulated clock advances its
    /// time by the period instead.
    fn sleep(&self, period: Duration);
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Wall clock backed by [`Instant`], with its epoch at construction.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    epoch: Instant,
}

/// Simulated clock which only moves when told to.
///
/// Clones share the same time, so a test can hold one copy while the code
/// under test sleeps on another.
#[derive(Debug, Clone, Default)]
pub struct SimClock {
    now_ms: Arc<AtomicU64>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SystemClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    fn sleep(&self, period: Duration) {
        thread::sleep(period);
    }
}

impl SimClock {
    /// Create a simulated clock starting at the given time.
    pub fn starting_at(start_ms: u64) -> Self {
        Self {
            now_ms: Arc::new(AtomicU64::new(start_ms)),
        }
    }

    /// Move the clock forward by `ms` milliseconds.
    pub fn advance(&self, ms: u64) {
        self.now_ms.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for SimClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.load(Ordering::SeqCst)
    }

    fn sleep(&self, period: Duration) {
        // Always move by at least a millisecond, otherwise a zero period
        // would never let a waiting loop make progress
        self.advance((period.as_millis() as u64).max(1));
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Convert a duration into a number of seconds, or `None` if overflow
pub fn duration_to_seconds(duration: chrono::Duration) -> Option<f64> {
    duration
        .num_nanoseconds()
        .map(|ns| ns as f64 / NANOS_PER_SECOND as f64)
}

/// Milliseconds elapsed between `start_ms` and `now_ms`, zero if `now_ms` is
/// earlier than the start.
pub fn elapsed_ms(start_ms: u64, now_ms: u64) -> u64 {
    now_ms.saturating_sub(start_ms)
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
