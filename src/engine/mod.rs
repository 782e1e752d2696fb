//! Winner selection engine
//!
//! Everything that decides who is shown and who wins lives here. The module is
//! pure and deterministic given its inputs:
//! - Injected RNG only (seed it for replayable runs)
//! - Time only advances through `Animation::advance`
//! - No rendering, timers, or platform dependencies

pub mod animation;
pub mod cancel;
pub mod schedule;
pub mod select;

pub use animation::{Animation, Callbacks, RunState, SelectionSink, animate_selection};
pub use cancel::CancelToken;
pub use schedule::{Narrowing, Phase, SCHEDULE, phase_start_ms, total_duration_ms, total_ticks};
pub use select::{clamp_winner_count, select_winners, shuffle};
