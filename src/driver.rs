//! Clock-driven run loop
//!
//! Sleeps until the next event of an [`Animation`], then advances it by
//! exactly that much. The real clock blocks the thread; the manual clock
//! only counts, which makes timing assertions exact.

use std::thread;
use std::time::Duration;

use rand::Rng;

use crate::engine::{Animation, RunState, SelectionSink};

/// Time source a run waits on
pub trait Clock {
    /// Block (or pretend to) for `ms` milliseconds
    fn sleep_ms(&mut self, ms: u64);
}

/// Wall clock backed by `std::thread::sleep`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn sleep_ms(&mut self, ms: u64) {
        if ms > 0 {
            thread::sleep(Duration::from_millis(ms));
        }
    }
}

/// Clock that never blocks, recording how long it was asked to wait
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    pub elapsed_ms: u64,
    /// Number of sleep calls (one per scheduled wake-up)
    pub wakeups: u32,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clock for ManualClock {
    fn sleep_ms(&mut self, ms: u64) {
        self.elapsed_ms += ms;
        self.wakeups += 1;
    }
}

/// Drive `animation` until it completes or is cancelled.
///
/// A cancel issued from another thread takes effect at the next wake-up; a
/// cancel issued from inside the sink takes effect before the next event.
pub fn run_to_completion<T, R, C, S>(
    animation: &mut Animation<T, R>,
    clock: &mut C,
    sink: &mut S,
) -> RunState
where
    T: Clone,
    R: Rng,
    C: Clock + ?Sized,
    S: SelectionSink<T> + ?Sized,
{
    if animation.state() == RunState::Idle {
        animation.start();
    }
    while let Some(wait) = animation.next_wait_ms() {
        clock.sleep_ms(wait);
        animation.advance(wait, sink);
    }
    animation.state()
}
