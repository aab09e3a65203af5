//! # Wait Primitive
//!
//! Replaces a busy loop on the wall clock. The condition is checked against the context's clock,
//! and between checks the clock is asked to sleep for the poll period, which a simulated clock
//! turns into an advance of simulated time.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{trace, warn};
use serde::Serialize;
use util::time::elapsed_ms;

use crate::context::RoutineContext;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// How a wait ended.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The condition held at the given clock time
    Satisfied { at_ms: u64 },

    /// A stop was requested before the condition held
    Stopped { at_ms: u64 },
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl WaitOutcome {
    /// Clock time at which the wait ended.
    pub fn at_ms(&self) -> u64 {
        match *self {
            WaitOutcome::Satisfied { at_ms } => at_ms,
            WaitOutcome::Stopped { at_ms } => at_ms,
        }
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self, WaitOutcome::Stopped { .. })
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Block until `condition` holds for the current clock time, or a stop is requested.
///
/// The condition is evaluated before the stop signal on every sample, so a condition which already
/// holds returns `Satisfied` without sleeping.
pub fn wait_until<F>(ctx: &RoutineContext, mut condition: F) -> WaitOutcome
where
    F: FnMut(u64) -> bool,
{
    loop {
        let now_ms = ctx.clock().now_ms();

        if condition(now_ms) {
            return WaitOutcome::Satisfied { at_ms: now_ms };
        }

        if ctx.stop_requested() {
            warn!("Stop requested while waiting at {} ms", now_ms);
            return WaitOutcome::Stopped { at_ms: now_ms };
        }

        ctx.clock().sleep(ctx.poll_period());
    }
}

/// Block until at least `duration_ms` have elapsed since `start_ms`, or a stop is requested.
pub fn wait_elapsed(ctx: &RoutineContext, start_ms: u64, duration_ms: u64) -> WaitOutcome {
    trace!("Waiting {} ms from {} ms", duration_ms, start_ms);

    wait_until(ctx, |now_ms| elapsed_ms(start_ms, now_ms) >= duration_ms)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::context::StopSignal;
    use hw_if::{sim::SimHardwareMap, HardwareConfig};
    use std::{sync::Arc, thread, time::Duration};
    use util::time::{Clock, SimClock, SystemClock};

    fn hardware(clock: &SimClock) -> SimHardwareMap {
        SimHardwareMap::new(&HardwareConfig::default(), Arc::new(clock.clone())).unwrap()
    }

    #[test]
    fn test_never_exits_early() {
        // Awkward poll periods make sure the exit isn't just landing on the duration by luck
        for &poll_ms in [1u64, 7, 10, 333].iter() {
            for &duration_ms in [0u64, 1, 5, 10, 999, 3000].iter() {
                let clock = SimClock::starting_at(1234);
                let hw = hardware(&clock);
                let ctx = RoutineContext::new(&hw, &clock, StopSignal::new())
                    .with_poll_period(Duration::from_millis(poll_ms));

                let start_ms = clock.now_ms();
                let outcome = wait_elapsed(&ctx, start_ms, duration_ms);

                let waited_ms = outcome.at_ms() - start_ms;
                assert!(!outcome.is_stopped());
                assert!(waited_ms >= duration_ms);
                assert!(waited_ms < duration_ms + poll_ms.max(1));
            }
        }
    }

    #[test]
    fn test_zero_duration_exits_immediately() {
        let clock = SimClock::starting_at(50);
        let hw = hardware(&clock);
        let ctx = RoutineContext::new(&hw, &clock, StopSignal::new());

        assert_eq!(
            wait_elapsed(&ctx, 50, 0),
            WaitOutcome::Satisfied { at_ms: 50 }
        );
        assert_eq!(clock.now_ms(), 50);
    }

    #[test]
    fn test_stop_ends_wait() {
        let clock = SimClock::default();
        let hw = hardware(&clock);
        let stop = StopSignal::new();
        let ctx = RoutineContext::new(&hw, &clock, stop.clone());

        // Request the stop from inside the condition once 100 ms have gone by
        let outcome = wait_until(&ctx, |now_ms| {
            if now_ms >= 100 {
                stop.request();
            }
            false
        });

        assert_eq!(outcome, WaitOutcome::Stopped { at_ms: 100 });
    }

    #[test]
    fn test_stop_from_another_thread() {
        let clock = SystemClock::new();
        let hw = SimHardwareMap::new(&HardwareConfig::default(), Arc::new(clock)).unwrap();
        let stop = StopSignal::new();
        let ctx = RoutineContext::new(&hw, &clock, stop.clone())
            .with_poll_period(Duration::from_millis(1));

        let bg_stop = stop.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            bg_stop.request();
        });

        let outcome = wait_until(&ctx, |_| false);
        handle.join().unwrap();

        assert!(outcome.is_stopped());
        assert!(outcome.at_ms() >= 10);
    }
}
