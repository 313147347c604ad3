//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (spawn order, then scheduling order)
//! - No rendering or platform dependencies

pub mod camera;
pub mod challenge;
pub mod difficulty;
pub mod effects;
pub mod movement;
pub mod pool;
pub mod state;
pub mod streamer;
pub mod tick;
pub mod time_scale;
pub mod timer;
pub mod trigger;

pub use camera::{CameraRig, CameraState, Look};
pub use challenge::{
    ArmError, ChallengeClass, ChallengeEngine, ChallengeKind, ChallengeSlot, ChallengeSpec,
    CountdownClock, InputToken, LetterKey, Outcome, Resolution, Side,
};
pub use difficulty::{DifficultyState, Multipliers};
pub use effects::{Effect, effects_for};
pub use movement::PlayerMotion;
pub use pool::{Handle, Pool, PoolError};
pub use state::{DeathCause, GameEvent, GamePhase, RunState};
pub use streamer::{SectionStreamer, SegmentKind, SegmentRecord};
pub use tick::{TickInput, tick};
pub use time_scale::{ScaleOwner, TimeScaleArbiter};
pub use timer::{Scheduler, TimerToken};
pub use trigger::{Trigger, TriggerKind};
