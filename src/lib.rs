//! Face Lottery - phased winner selection over faces detected in a group photo
//!
//! Core modules:
//! - `engine`: Seeded shuffle/selection and the phased animation state machine
//! - `driver`: Clock abstraction that steps an animation in real or mock time
//! - `session`: Caller-side lottery state (pool, winner count, highlight slot)
//! - `face`: Detected face candidates and the face detector seam
//! - `settings`: Persisted user preferences
//! - `web`: Browser binding driven by `setTimeout` (wasm32 only)

pub mod driver;
pub mod engine;
mod error;
pub mod face;
pub mod session;
pub mod settings;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use driver::{Clock, ManualClock, SystemClock, run_to_completion};
pub use engine::{
    Animation, Callbacks, CancelToken, RunState, SelectionSink, animate_selection,
    select_winners, shuffle,
};
pub use error::LotteryError;
pub use face::{Candidate, DetectedFace, FaceBox, FaceDetector};
pub use session::{FaceMark, Lottery};
pub use settings::Settings;

/// Lottery timing constants
pub mod consts {
    /// Pause between two consecutive phases (no ticks fire)
    pub const PHASE_GAP_MS: u64 = 100;
    /// Duration shared by every phase of the schedule
    pub const PHASE_DURATION_MS: u64 = 1000;

    /// Shortlist size multiplier for phase 3 (`k * 3` candidates)
    pub const WIDE_SHORTLIST_FACTOR: usize = 3;
    /// Shortlist size multiplier for phase 4 (`k * 2` candidates)
    pub const TIGHT_SHORTLIST_FACTOR: usize = 2;

    /// Winner count used when nothing else is configured
    pub const DEFAULT_WINNER_COUNT: usize = 1;
}
