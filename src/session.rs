//! Lottery session
//!
//! Caller-side state around the engine: the detected pool, the winner count
//! picker, the highlight slot that ticks write into, and the final winners.
//! Only one run owns the highlight slot at a time; starting a new run cancels
//! the previous one first.

use std::collections::HashSet;

use crate::LotteryError;
use crate::driver::Clock;
use crate::engine::{Animation, RunState, SelectionSink, clamp_winner_count};
use crate::face::{Candidate, DetectedFace, FaceDetector};
use crate::settings::Settings;

/// Render-facing view of one candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaceMark<Id> {
    pub id: Id,
    /// 1-based number shown next to the face
    pub label: usize,
    /// Part of the subset currently flickering on screen
    pub highlighted: bool,
    /// Part of the authoritative result
    pub winner: bool,
}

/// Sink that writes into the session's display slot, then forwards
struct DisplaySlot<'a, C: Candidate, O: ?Sized> {
    highlighted: &'a mut Vec<C::Id>,
    winners: &'a mut Vec<C>,
    observer: &'a mut O,
}

impl<C: Candidate, O: SelectionSink<C> + ?Sized> SelectionSink<C> for DisplaySlot<'_, C, O> {
    fn on_tick(&mut self, subset: &[C]) {
        self.highlighted.clear();
        self.highlighted.extend(subset.iter().map(Candidate::id));
        self.observer.on_tick(subset);
    }

    fn on_complete(&mut self, winners: &[C]) {
        self.winners.clear();
        self.winners.extend_from_slice(winners);
        self.highlighted.clear();
        self.highlighted.extend(winners.iter().map(Candidate::id));
        self.observer.on_complete(winners);
    }
}

/// A lottery over one photo's candidates
#[derive(Debug)]
pub struct Lottery<C: Candidate> {
    candidates: Vec<C>,
    winner_count: usize,
    settings: Settings,
    run: Option<Animation<C>>,
    last_seed: Option<u64>,
    highlighted: Vec<C::Id>,
    winners: Vec<C>,
}

impl<C: Candidate> Lottery<C> {
    pub fn new(candidates: Vec<C>) -> Result<Self, LotteryError> {
        Self::with_settings(candidates, Settings::default())
    }

    pub fn with_settings(candidates: Vec<C>, settings: Settings) -> Result<Self, LotteryError> {
        ensure_unique(&candidates)?;
        let winner_count = clamp_picker(settings.winner_count, candidates.len());
        Ok(Self {
            candidates,
            winner_count,
            settings,
            run: None,
            last_seed: None,
            highlighted: Vec::new(),
            winners: Vec::new(),
        })
    }

    pub fn candidates(&self) -> &[C] {
        &self.candidates
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn winner_count(&self) -> usize {
        self.winner_count
    }

    /// Set the winner count, clamped to `[1, candidates]`. Returns the value kept.
    pub fn set_winner_count(&mut self, count: usize) -> usize {
        self.winner_count = clamp_picker(count, self.candidates.len());
        self.winner_count
    }

    /// Swap in a new pool (e.g. a new photo). Cancels any run and clears results.
    pub fn replace_candidates(&mut self, candidates: Vec<C>) -> Result<(), LotteryError> {
        ensure_unique(&candidates)?;
        self.cancel();
        self.candidates = candidates;
        self.winner_count = clamp_picker(self.winner_count, self.candidates.len());
        self.highlighted.clear();
        self.winners.clear();
        self.run = None;
        Ok(())
    }

    /// Start a new run, superseding any run still in flight.
    ///
    /// Returns the seed the run draws from, so it can be replayed.
    pub fn start(&mut self) -> Result<u64, LotteryError> {
        if self.candidates.is_empty() {
            return Err(LotteryError::EmptyPool);
        }
        if self.cancel() {
            log::info!("Superseding in-flight run");
        }

        let seed = self.settings.seed.unwrap_or_else(rand::random);
        let mut run = Animation::with_seed(self.candidates.clone(), self.winner_count, seed);
        if self.settings.reduced_motion {
            run = run.reveal_immediately();
        }
        run.start();

        log::info!(
            "Lottery started with seed {}: {} candidates, {} winner(s)",
            seed,
            self.candidates.len(),
            self.winner_count
        );
        self.highlighted.clear();
        self.winners.clear();
        self.run = Some(run);
        self.last_seed = Some(seed);
        Ok(seed)
    }

    /// Cancel the current run. Returns `true` if a run was in flight.
    pub fn cancel(&mut self) -> bool {
        match self.run.as_mut() {
            Some(run) if !run.is_finished() => {
                run.cancel();
                self.highlighted.clear();
                true
            }
            _ => false,
        }
    }

    /// Move the current run forward by `dt_ms`
    pub fn advance(&mut self, dt_ms: u64) -> u32 {
        self.advance_with(dt_ms, &mut ())
    }

    /// Move the current run forward, forwarding every callback to `observer`
    /// after the display slot has been updated
    pub fn advance_with<O>(&mut self, dt_ms: u64, observer: &mut O) -> u32
    where
        O: SelectionSink<C> + ?Sized,
    {
        let Some(run) = self.run.as_mut() else {
            return 0;
        };
        let mut slot = DisplaySlot {
            highlighted: &mut self.highlighted,
            winners: &mut self.winners,
            observer,
        };
        run.advance(dt_ms, &mut slot)
    }

    /// Block on `clock` until the current run finishes
    pub fn run_until_finished<K, O>(
        &mut self,
        clock: &mut K,
        observer: &mut O,
    ) -> Option<RunState>
    where
        K: Clock + ?Sized,
        O: SelectionSink<C> + ?Sized,
    {
        while let Some(wait) = self.next_wait_ms() {
            clock.sleep_ms(wait);
            self.advance_with(wait, observer);
        }
        self.run_state()
    }

    pub fn next_wait_ms(&self) -> Option<u64> {
        self.run.as_ref().and_then(Animation::next_wait_ms)
    }

    pub fn run_state(&self) -> Option<RunState> {
        self.run.as_ref().map(Animation::state)
    }

    pub fn is_animating(&self) -> bool {
        self.run.as_ref().is_some_and(|run| !run.is_finished())
    }

    /// Seed of the most recent run
    pub fn last_seed(&self) -> Option<u64> {
        self.last_seed
    }

    /// Ids in the display slot: the flickering subset, or the winners once revealed
    pub fn highlighted(&self) -> &[C::Id] {
        &self.highlighted
    }

    pub fn is_highlighted(&self, id: &C::Id) -> bool {
        self.highlighted.contains(id)
    }

    /// Authoritative winners of the last completed run
    pub fn winners(&self) -> &[C] {
        &self.winners
    }

    pub fn is_winner(&self, id: &C::Id) -> bool {
        self.winners.iter().any(|w| &w.id() == id)
    }

    /// Clear results without touching the pool
    pub fn reset(&mut self) {
        self.cancel();
        self.highlighted.clear();
        self.winners.clear();
        self.run = None;
    }

    /// Per-candidate view for a renderer, in pool order
    pub fn marks(&self) -> Vec<FaceMark<C::Id>> {
        self.candidates
            .iter()
            .enumerate()
            .map(|(index, candidate)| {
                let id = candidate.id();
                FaceMark {
                    label: index + 1,
                    highlighted: self.is_highlighted(&id),
                    winner: self.is_winner(&id),
                    id,
                }
            })
            .collect()
    }
}

impl Lottery<DetectedFace> {
    /// Run `detector` over an RGBA image and build a lottery from its faces
    pub fn from_detector<D: FaceDetector + ?Sized>(
        detector: &D,
        rgba: &[u8],
        width: u32,
        height: u32,
        settings: Settings,
    ) -> Result<Self, LotteryError> {
        let faces = detector.detect(rgba, width, height);
        log::info!("Detected {} faces in {}x{} image", faces.len(), width, height);
        Self::with_settings(faces, settings)
    }
}

/// Winner picker range is `[1, n]`; an empty pool keeps the picker at 1
fn clamp_picker(count: usize, pool_len: usize) -> usize {
    clamp_winner_count(count, pool_len).max(1)
}

fn ensure_unique<C: Candidate>(candidates: &[C]) -> Result<(), LotteryError> {
    let mut seen = HashSet::with_capacity(candidates.len());
    for candidate in candidates {
        let id = candidate.id();
        if !seen.insert(id.clone()) {
            return Err(LotteryError::DuplicateCandidate(format!("{:?}", id)));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::ManualClock;
    use crate::engine::{Callbacks, total_duration_ms};
    use crate::face::FaceBox;

    fn faces(n: u32) -> Vec<DetectedFace> {
        (0..n)
            .map(|i| {
                let bounds = FaceBox {
                    x: i as f64 * 50.0,
                    y: 10.0,
                    width: 40.0,
                    height: 40.0,
                };
                DetectedFace::new(i, bounds, 0.9)
            })
            .collect()
    }

    fn seeded(seed: u64) -> Settings {
        Settings {
            seed: Some(seed),
            ..Default::default()
        }
    }

    #[test]
    fn test_winner_count_clamped_to_pool() {
        let mut lottery = Lottery::new(faces(4)).unwrap();
        assert_eq!(lottery.set_winner_count(0), 1);
        assert_eq!(lottery.set_winner_count(3), 3);
        assert_eq!(lottery.set_winner_count(10), 4);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let mut pool = faces(3);
        pool[2].id = 0;
        let err = Lottery::new(pool).unwrap_err();
        assert!(matches!(err, LotteryError::DuplicateCandidate(id) if id == "0"));
    }

    #[test]
    fn test_start_on_empty_pool_fails() {
        let mut lottery = Lottery::<DetectedFace>::new(Vec::new()).unwrap();
        assert!(matches!(lottery.start(), Err(LotteryError::EmptyPool)));
        assert!(!lottery.is_animating());
        assert_eq!(lottery.winner_count(), 1);
    }

    #[test]
    fn test_full_run_fills_display_slot() {
        let mut lottery = Lottery::with_settings(faces(6), seeded(10)).unwrap();
        lottery.set_winner_count(2);
        assert_eq!(lottery.start().unwrap(), 10);
        assert!(lottery.is_animating());

        lottery.advance(50);
        assert_eq!(lottery.highlighted().len(), 2);
        assert!(lottery.winners().is_empty());

        let state = lottery.run_until_finished(&mut ManualClock::new(), &mut ());
        assert_eq!(state, Some(RunState::Completed));
        assert!(!lottery.is_animating());
        assert_eq!(lottery.winners().len(), 2);

        let winner_ids: Vec<u32> = lottery.winners().iter().map(|w| w.id).collect();
        assert_eq!(lottery.highlighted(), winner_ids.as_slice());
        let marks = lottery.marks();
        assert_eq!(marks.len(), 6);
        assert_eq!(marks.iter().filter(|m| m.winner).count(), 2);
        assert!(marks.iter().all(|m| m.label == m.id as usize + 1));
    }

    #[test]
    fn test_restart_supersedes_running_run() {
        let mut lottery = Lottery::with_settings(faces(5), seeded(3)).unwrap();
        lottery.start().unwrap();
        lottery.advance(1500);
        let first = lottery.run.as_ref().map(Animation::cancel_token).unwrap();

        lottery.start().unwrap();
        assert!(first.is_cancelled());
        assert!(lottery.highlighted().is_empty());
        assert_eq!(lottery.run_state(), Some(RunState::Running { phase: 0, tick: 0 }));

        let mut clock = ManualClock::new();
        lottery.run_until_finished(&mut clock, &mut ());
        assert_eq!(clock.elapsed_ms, total_duration_ms());
        assert_eq!(lottery.winners().len(), 1);
    }

    #[test]
    fn test_cancel_stops_run_and_clears_highlight() {
        let mut lottery = Lottery::with_settings(faces(5), seeded(4)).unwrap();
        lottery.start().unwrap();
        lottery.advance(200);
        assert!(!lottery.highlighted().is_empty());

        assert!(lottery.cancel());
        assert!(!lottery.cancel());
        assert_eq!(lottery.run_state(), Some(RunState::Cancelled));
        assert_eq!(lottery.advance(10_000), 0);
        assert!(lottery.highlighted().is_empty());
        assert!(lottery.winners().is_empty());
    }

    #[test]
    fn test_reduced_motion_reveals_immediately() {
        let settings = Settings {
            winner_count: 2,
            seed: Some(1),
            reduced_motion: true,
        };
        let mut lottery = Lottery::with_settings(faces(5), settings).unwrap();
        lottery.start().unwrap();

        let mut ticks = 0;
        let mut completions = 0;
        let mut observer = Callbacks::new(
            |_: &[DetectedFace]| ticks += 1,
            |_: &[DetectedFace]| completions += 1,
        );
        let mut clock = ManualClock::new();
        lottery.run_until_finished(&mut clock, &mut observer);
        drop(observer);

        assert_eq!((ticks, completions), (0, 1));
        assert_eq!(clock.elapsed_ms, 0);
        assert_eq!(lottery.winners().len(), 2);
    }

    #[test]
    fn test_replace_candidates_resets() {
        let mut lottery = Lottery::with_settings(faces(5), seeded(8)).unwrap();
        lottery.set_winner_count(4);
        lottery.start().unwrap();
        lottery.run_until_finished(&mut ManualClock::new(), &mut ());
        assert_eq!(lottery.winners().len(), 4);

        lottery.replace_candidates(faces(2)).unwrap();
        assert!(lottery.winners().is_empty());
        assert_eq!(lottery.winner_count(), 2);
        assert_eq!(lottery.run_state(), None);
    }

    #[test]
    fn test_fixed_seed_replays_winners() {
        let draw = || {
            let mut lottery = Lottery::with_settings(faces(9), seeded(55)).unwrap();
            lottery.set_winner_count(3);
            lottery.start().unwrap();
            lottery.run_until_finished(&mut ManualClock::new(), &mut ());
            lottery.winners().to_vec()
        };
        assert_eq!(draw(), draw());
    }

    struct RowDetector(u32);

    impl FaceDetector for RowDetector {
        fn detect(&self, _rgba: &[u8], _width: u32, _height: u32) -> Vec<DetectedFace> {
            faces(self.0)
        }
    }

    #[test]
    fn test_from_detector_builds_pool() {
        let image = vec![0u8; 64 * 64 * 4];
        let lottery = Lottery::from_detector(&RowDetector(7), &image, 64, 64, seeded(2)).unwrap();
        assert_eq!(lottery.candidates().len(), 7);
        assert_eq!(lottery.winner_count(), 1);
    }

    #[test]
    fn test_string_candidates() {
        let names = vec!["Ada".to_string(), "Grace".to_string(), "Linus".to_string()];
        let mut lottery = Lottery::new(names).unwrap();
        lottery.start().unwrap();
        lottery.run_until_finished(&mut ManualClock::new(), &mut ());
        let winner = lottery.winners()[0].clone();
        assert!(lottery.is_winner(&winner));
    }
}
