//! Corridor Runner - deterministic core of an endless corridor runner
//!
//! Core modules:
//! - `sim`: Deterministic simulation (segment streaming, quick-time events, difficulty)
//! - `ui`: Headless presentation model fed by simulation events
//! - `platform`: Input source and data directory abstraction
//! - `persistence`: Atomic JSON documents on disk
//! - `tuning`: Data-driven game balance

pub mod highscores;
pub mod persistence;
pub mod platform;
pub mod settings;
pub mod sim;
pub mod tuning;
pub mod ui;

pub use highscores::{HighScoreRecord, HighScoreStore};
pub use settings::Settings;
pub use tuning::{ConfigError, Tuning};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Score awarded per second of survival
    pub const SCORE_PER_SECOND: f32 = 10.0;

    /// Normal simulation time scale
    pub const NORMAL_TIME_SCALE: f32 = 1.0;

    /// Gravity used for jump impulses (units/s²)
    pub const GRAVITY: f32 = 9.81;
}

/// Move `current` toward `target` by at most `max_delta`
#[inline]
pub fn move_towards(current: f32, target: f32, max_delta: f32) -> f32 {
    let delta = target - current;
    if delta.abs() <= max_delta {
        target
    } else {
        current + max_delta.copysign(delta)
    }
}

/// Linear interpolation with `t` clamped to [0, 1]
#[inline]
pub fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_towards_clamps_step() {
        assert_eq!(move_towards(0.0, 4.0, 1.0), 1.0);
        assert_eq!(move_towards(0.0, -4.0, 1.0), -1.0);
        assert_eq!(move_towards(3.5, 4.0, 1.0), 4.0);
    }

    #[test]
    fn test_lerp_clamps_t() {
        assert_eq!(lerp(3.0, 1.0, 0.5), 2.0);
        assert_eq!(lerp(3.0, 1.0, 2.0), 1.0);
        assert_eq!(lerp(3.0, 1.0, -1.0), 3.0);
    }
}
