//! # Routine Context
//!
//! Bundles the capabilities a routine is allowed to use: resolving actuators, reading the time and
//! checking whether the host has asked it to stop.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use hw_if::HardwareMap;
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};
use util::time::Clock;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Period between two samples of the clock while waiting.
pub const DEFAULT_POLL_PERIOD_MS: u64 = 10;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Stop request shared between the host and a running routine.
///
/// Clones share the same flag, the host keeps one and the routine polls another.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    flag: Arc<AtomicBool>,
}

/// Everything a routine needs from the outside world.
pub struct RoutineContext<'a> {
    hardware: &'a dyn HardwareMap,
    clock: &'a dyn Clock,
    stop: StopSignal,
    poll_period: Duration,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the routine to stop at its next poll.
    pub fn request(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

impl<'a> RoutineContext<'a> {
    pub fn new(hardware: &'a dyn HardwareMap, clock: &'a dyn Clock, stop: StopSignal) -> Self {
        Self {
            hardware,
            clock,
            stop,
            poll_period: Duration::from_millis(DEFAULT_POLL_PERIOD_MS),
        }
    }

    /// Set the period between two samples of the clock while waiting.
    pub fn with_poll_period(mut self, poll_period: Duration) -> Self {
        self.poll_period = poll_period;
        self
    }

    pub fn hardware(&self) -> &dyn HardwareMap {
        self.hardware
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock
    }

    pub fn poll_period(&self) -> Duration {
        self.poll_period
    }

    pub fn stop_requested(&self) -> bool {
        self.stop.is_requested()
    }
}
