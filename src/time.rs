//! Simulated time.
//!
//! The clock only moves when every actor is suspended and at least one of
//! them is sleeping. It then jumps straight to the earliest wake-up time.

use crate::rt;

use std::time::Duration;

/// Returns the simulated time elapsed since the start of the run.
pub fn now() -> Duration {
    rt::execution(|execution| execution.clock)
}

/// Suspends the running actor for `duration` of simulated time.
///
/// Sleeping for a zero duration is equivalent to
/// [`yield_now`](crate::actor::yield_now).
pub fn sleep(duration: Duration) {
    rt::sleep(duration);
}
