//! Fixed phase schedule
//!
//! Four one-second phases with growing tick intervals, separated by short
//! pauses. The table is fixed at compile time.

use crate::consts::*;

/// Which universe a phase draws its tick subsets from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Narrowing {
    /// Every tick is a fresh draw from the whole pool
    Pool,
    /// A shortlist of `k * factor` candidates is drawn once when the phase
    /// starts; ticks draw from that shortlist
    Shortlist { factor: usize },
}

/// One timed segment of the animation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Phase {
    pub duration_ms: u64,
    pub tick_interval_ms: u64,
    pub narrowing: Narrowing,
}

impl Phase {
    /// Number of ticks that fit in the phase (first tick one interval after start)
    pub const fn tick_count(&self) -> u32 {
        (self.duration_ms / self.tick_interval_ms) as u32
    }

    /// Offset of tick `index` (0-based) from the start of the phase
    pub const fn tick_offset_ms(&self, index: u32) -> u64 {
        self.tick_interval_ms * (index as u64 + 1)
    }

    /// Offset of the phase's last tick from its start (zero if it never ticks)
    pub const fn last_tick_ms(&self) -> u64 {
        self.tick_interval_ms * self.tick_count() as u64
    }

    /// Size of the shortlist this phase draws from, `None` for whole-pool phases
    pub fn shortlist_len(&self, winner_count: usize, pool_len: usize) -> Option<usize> {
        match self.narrowing {
            Narrowing::Pool => None,
            Narrowing::Shortlist { factor } => {
                Some(winner_count.saturating_mul(factor).min(pool_len))
            }
        }
    }
}

/// The animation timeline, slowest phase last
pub const SCHEDULE: [Phase; 4] = [
    Phase {
        duration_ms: PHASE_DURATION_MS,
        tick_interval_ms: 50,
        narrowing: Narrowing::Pool,
    },
    Phase {
        duration_ms: PHASE_DURATION_MS,
        tick_interval_ms: 100,
        narrowing: Narrowing::Pool,
    },
    Phase {
        duration_ms: PHASE_DURATION_MS,
        tick_interval_ms: 200,
        narrowing: Narrowing::Shortlist {
            factor: WIDE_SHORTLIST_FACTOR,
        },
    },
    Phase {
        duration_ms: PHASE_DURATION_MS,
        tick_interval_ms: 400,
        narrowing: Narrowing::Shortlist {
            factor: TIGHT_SHORTLIST_FACTOR,
        },
    },
];

/// Start time of phase `index`, measured from the start of the run
pub fn phase_start_ms(index: usize) -> u64 {
    SCHEDULE[..index]
        .iter()
        .map(|phase| phase.duration_ms + PHASE_GAP_MS)
        .sum()
}

/// Total ticks delivered by a full run
pub fn total_ticks() -> u32 {
    SCHEDULE.iter().map(Phase::tick_count).sum()
}

/// Time from run start to the completion callback: the last phase's last
/// tick followed by one more pause
pub fn total_duration_ms() -> u64 {
    let last = SCHEDULE.len() - 1;
    phase_start_ms(last) + SCHEDULE[last].last_tick_ms() + PHASE_GAP_MS
}
