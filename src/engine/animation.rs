//! Phased selection animation
//!
//! A run walks the fixed [`SCHEDULE`], handing a decorative subset to the sink
//! on every tick, then delivers one independent draw over the whole pool as
//! the authoritative result. The reveal may differ from the last tick shown.
//!
//! Time only moves through [`Animation::advance`], so the same run can be
//! driven by a real clock, browser timers, or a test loop.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::consts::PHASE_GAP_MS;

use super::cancel::CancelToken;
use super::schedule::{SCHEDULE, phase_start_ms};
use super::select::{clamp_winner_count, select_winners};

/// Receiver for the two callbacks of a run
pub trait SelectionSink<T> {
    /// Currently highlighted subset. Decorative only.
    fn on_tick(&mut self, subset: &[T]);
    /// Final winners, delivered exactly once per completed run
    fn on_complete(&mut self, winners: &[T]);
}

impl<T> SelectionSink<T> for () {
    fn on_tick(&mut self, _subset: &[T]) {}
    fn on_complete(&mut self, _winners: &[T]) {}
}

impl<T, S: SelectionSink<T> + ?Sized> SelectionSink<T> for &mut S {
    fn on_tick(&mut self, subset: &[T]) {
        (**self).on_tick(subset);
    }

    fn on_complete(&mut self, winners: &[T]) {
        (**self).on_complete(winners);
    }
}

/// Closure pair adapter for [`SelectionSink`]
pub struct Callbacks<F, G> {
    pub on_tick: F,
    pub on_complete: G,
}

impl<F, G> Callbacks<F, G> {
    pub fn new(on_tick: F, on_complete: G) -> Self {
        Self {
            on_tick,
            on_complete,
        }
    }
}

impl<T, F, G> SelectionSink<T> for Callbacks<F, G>
where
    F: FnMut(&[T]),
    G: FnMut(&[T]),
{
    fn on_tick(&mut self, subset: &[T]) {
        (self.on_tick)(subset);
    }

    fn on_complete(&mut self, winners: &[T]) {
        (self.on_complete)(winners);
    }
}

/// Lifecycle of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Created but not started
    Idle,
    /// Animating; `phase` indexes [`SCHEDULE`], `tick` counts ticks already
    /// delivered in that phase
    Running { phase: usize, tick: u32 },
    /// Final winners delivered (or the pool was empty)
    Completed,
    /// Stopped before completion; no further callbacks
    Cancelled,
}

/// One lottery run over an owned candidate pool
#[derive(Debug)]
pub struct Animation<T, R = Pcg32> {
    pool: Vec<T>,
    winner_count: usize,
    rng: R,
    state: RunState,
    /// Time since start
    elapsed_ms: u64,
    /// Universe for the current phase's ticks (`None` = whole pool)
    shortlist: Option<Vec<T>>,
    winners: Option<Vec<T>>,
    ticks_delivered: u32,
    /// Skip every tick and reveal on the next advance
    instant: bool,
    cancel: CancelToken,
}

impl<T: Clone> Animation<T, Pcg32> {
    /// Create a run whose randomness replays from `seed`
    pub fn with_seed(pool: Vec<T>, winner_count: usize, seed: u64) -> Self {
        Self::new(pool, winner_count, Pcg32::seed_from_u64(seed))
    }
}

impl<T: Clone, R: Rng> Animation<T, R> {
    /// Create an idle run. `winner_count` is clamped to `[1, pool.len()]`.
    pub fn new(pool: Vec<T>, winner_count: usize, rng: R) -> Self {
        let winner_count = clamp_winner_count(winner_count, pool.len());
        Self {
            pool,
            winner_count,
            rng,
            state: RunState::Idle,
            elapsed_ms: 0,
            shortlist: None,
            winners: None,
            ticks_delivered: 0,
            instant: false,
            cancel: CancelToken::new(),
        }
    }

    /// Skip the flicker phases: the first advance delivers the final winners
    pub fn reveal_immediately(mut self) -> Self {
        self.instant = true;
        self
    }

    /// Share an existing cancellation flag instead of a fresh one
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Leave `Idle` and enter the first phase.
    ///
    /// An empty pool completes on the spot without invoking any callback.
    pub fn start(&mut self) {
        if self.state != RunState::Idle || self.cancel.is_cancelled() {
            return;
        }
        if self.pool.is_empty() {
            log::debug!("Empty candidate pool, nothing to animate");
            self.winners = Some(Vec::new());
            self.state = RunState::Completed;
            return;
        }
        log::debug!(
            "Run started: {} candidates, {} winner(s)",
            self.pool.len(),
            self.winner_count
        );
        self.enter_phase(0);
    }

    /// Move time forward by `dt_ms`, delivering every event that became due,
    /// in order. Returns the number of callbacks invoked.
    pub fn advance<S: SelectionSink<T> + ?Sized>(&mut self, dt_ms: u64, sink: &mut S) -> u32 {
        if !matches!(self.state, RunState::Running { .. }) {
            return 0;
        }
        self.elapsed_ms = self.elapsed_ms.saturating_add(dt_ms);

        let mut delivered = 0;
        loop {
            // Checked before every event so a sink may cancel mid-advance
            if self.cancel.is_cancelled() {
                self.mark_cancelled();
                break;
            }
            match self.next_deadline_ms() {
                Some(deadline) if deadline <= self.elapsed_ms => delivered += self.fire(sink),
                _ => break,
            }
        }
        delivered
    }

    /// Stop the run. No callback fires afterwards.
    pub fn cancel(&mut self) {
        self.cancel.cancel();
        self.mark_cancelled();
    }

    fn mark_cancelled(&mut self) {
        if matches!(self.state, RunState::Idle | RunState::Running { .. }) {
            log::info!(
                "Run cancelled at {} ms after {} ticks",
                self.elapsed_ms,
                self.ticks_delivered
            );
            self.state = RunState::Cancelled;
            self.shortlist = None;
        }
    }

    /// Deliver the single event at the head of the timeline
    fn fire<S: SelectionSink<T> + ?Sized>(&mut self, sink: &mut S) -> u32 {
        let RunState::Running { phase, tick } = self.state else {
            return 0;
        };
        if self.instant {
            self.complete(sink);
            return 1;
        }

        let current = &SCHEDULE[phase];
        if tick < current.tick_count() {
            let universe = self.shortlist.as_deref().unwrap_or(self.pool.as_slice());
            let subset = select_winners(universe, self.winner_count, &mut self.rng);
            self.state = RunState::Running {
                phase,
                tick: tick + 1,
            };
            self.ticks_delivered += 1;
            sink.on_tick(&subset);
            1
        } else if phase + 1 < SCHEDULE.len() {
            self.enter_phase(phase + 1);
            0
        } else {
            self.complete(sink);
            1
        }
    }

    fn enter_phase(&mut self, index: usize) {
        let phase = &SCHEDULE[index];
        self.shortlist = phase
            .shortlist_len(self.winner_count, self.pool.len())
            .map(|len| select_winners(&self.pool, len, &mut self.rng));
        log::debug!(
            "Phase {} at {} ms: {} ms ticks over {} candidates",
            index + 1,
            self.elapsed_ms,
            phase.tick_interval_ms,
            self.shortlist.as_ref().map_or(self.pool.len(), Vec::len)
        );
        self.state = RunState::Running {
            phase: index,
            tick: 0,
        };
    }

    fn complete<S: SelectionSink<T> + ?Sized>(&mut self, sink: &mut S) {
        // Independent of every shortlist drawn above
        let winners = select_winners(&self.pool, self.winner_count, &mut self.rng);
        self.state = RunState::Completed;
        self.shortlist = None;
        log::info!(
            "Run complete at {} ms: {} ticks, {} winner(s)",
            self.elapsed_ms,
            self.ticks_delivered,
            winners.len()
        );
        let winners = self.winners.insert(winners);
        sink.on_complete(winners.as_slice());
    }
}

impl<T, R> Animation<T, R> {
    /// Current lifecycle state. A cancelled token wins over a stale `Running`.
    pub fn state(&self) -> RunState {
        match self.state {
            RunState::Idle | RunState::Running { .. } if self.cancel.is_cancelled() => {
                RunState::Cancelled
            }
            state => state,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state(), RunState::Completed | RunState::Cancelled)
    }

    /// Absolute time (since start) of the next event, `None` once finished
    pub fn next_deadline_ms(&self) -> Option<u64> {
        let RunState::Running { phase, tick } = self.state() else {
            return None;
        };
        if self.instant {
            return Some(self.elapsed_ms);
        }
        let current = &SCHEDULE[phase];
        let start = phase_start_ms(phase);
        if tick < current.tick_count() {
            Some(start + current.tick_offset_ms(tick))
        } else if phase + 1 < SCHEDULE.len() {
            Some(start + current.duration_ms)
        } else {
            // Reveal after the final tick's trailing pause
            Some(start + current.last_tick_ms() + PHASE_GAP_MS)
        }
    }

    /// Time left until the next event
    pub fn next_wait_ms(&self) -> Option<u64> {
        self.next_deadline_ms()
            .map(|deadline| deadline.saturating_sub(self.elapsed_ms))
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    /// Winner count after clamping
    pub fn winner_count(&self) -> usize {
        self.winner_count
    }

    pub fn pool(&self) -> &[T] {
        &self.pool
    }

    /// Shortlist the current phase draws from, if it narrows
    pub fn shortlist(&self) -> Option<&[T]> {
        self.shortlist.as_deref()
    }

    /// Authoritative winners, available once completed
    pub fn winners(&self) -> Option<&[T]> {
        self.winners.as_deref()
    }

    pub fn ticks_delivered(&self) -> u32 {
        self.ticks_delivered
    }

    /// Handle that cancels this run from anywhere
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }
}

/// Start a run over `pool` picking `winner_count` winners.
///
/// The returned animation is already running; drive it with
/// [`Animation::advance`] (or [`crate::run_to_completion`]).
pub fn animate_selection<T: Clone, R: Rng>(
    pool: Vec<T>,
    winner_count: usize,
    rng: R,
) -> Animation<T, R> {
    let mut animation = Animation::new(pool, winner_count, rng);
    animation.start();
    animation
}
