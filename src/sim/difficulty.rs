//! Survival time, score and difficulty level

use serde::{Deserialize, Serialize};

use crate::consts::SCORE_PER_SECOND;
use crate::tuning::DifficultyConfig;

/// Gameplay multipliers for one difficulty level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Multipliers {
    pub speed: f32,
    pub dodge_speed: f32,
    pub qte_deadline: f32,
    pub camera_tilt: f32,
    pub camera_hold: f32,
}

impl Multipliers {
    pub const fn new(
        speed: f32,
        dodge_speed: f32,
        qte_deadline: f32,
        camera_tilt: f32,
        camera_hold: f32,
    ) -> Self {
        Self {
            speed,
            dodge_speed,
            qte_deadline,
            camera_tilt,
            camera_hold,
        }
    }
}

impl Default for Multipliers {
    fn default() -> Self {
        Self::new(1.0, 1.0, 1.0, 1.0, 1.0)
    }
}

/// Level as a step function of survival time
pub fn level_for(thresholds: &[f32], elapsed: f32) -> u32 {
    1 + thresholds.iter().filter(|t| elapsed >= **t).count() as u32
}

#[derive(Debug, Clone)]
pub struct DifficultyState {
    config: DifficultyConfig,
    elapsed: f32,
    level: u32,
}

impl DifficultyState {
    pub fn new(config: DifficultyConfig) -> Self {
        Self {
            config,
            elapsed: 0.0,
            level: 1,
        }
    }

    /// Survival seconds this run
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn max_level(&self) -> u32 {
        self.config.thresholds.len() as u32 + 1
    }

    pub fn score(&self) -> f32 {
        self.elapsed * SCORE_PER_SECOND
    }

    pub fn multipliers(&self) -> Multipliers {
        self.config
            .levels
            .get(self.level as usize - 1)
            .copied()
            .unwrap_or_default()
    }

    /// Add survival time; returns the new level if it changed
    pub fn advance(&mut self, dt: f32) -> Option<u32> {
        self.elapsed += dt.max(0.0);
        let level = level_for(&self.config.thresholds, self.elapsed);
        if level > self.level {
            self.level = level;
            log::info!(
                "Difficulty level {} at {:.1}s",
                self.level,
                self.elapsed
            );
            Some(level)
        } else {
            None
        }
    }

    /// Jump straight to the next level (debug tooling)
    pub fn force_next_level(&mut self) -> Option<u32> {
        let next = self.config.thresholds.get(self.level as usize - 1).copied()?;
        self.advance((next - self.elapsed).max(0.0))
    }

    pub fn reset(&mut self) {
        self.elapsed = 0.0;
        self.level = 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_level_step_function() {
        let thresholds = [30.0, 60.0, 120.0, 200.0];
        assert_eq!(level_for(&thresholds, 0.0), 1);
        assert_eq!(level_for(&thresholds, 29.9), 1);
        assert_eq!(level_for(&thresholds, 31.0), 2);
        assert_eq!(level_for(&thresholds, 61.0), 3);
        assert_eq!(level_for(&thresholds, 121.0), 4);
        assert_eq!(level_for(&thresholds, 201.0), 5);
    }

    #[test]
    fn test_advance_reports_level_changes_once() {
        let mut difficulty = DifficultyState::new(DifficultyConfig::default());
        assert_eq!(difficulty.advance(29.0), None);
        assert_eq!(difficulty.advance(2.0), Some(2));
        assert_eq!(difficulty.advance(1.0), None);
        assert_eq!(difficulty.level(), 2);
        assert_eq!(difficulty.multipliers().speed, 1.1);
    }

    #[test]
    fn test_big_step_skips_levels() {
        let mut difficulty = DifficultyState::new(DifficultyConfig::default());
        assert_eq!(difficulty.advance(201.0), Some(5));
        assert_eq!(difficulty.level(), difficulty.max_level());
    }

    #[test]
    fn test_score_tracks_survival_time() {
        let mut difficulty = DifficultyState::new(DifficultyConfig::default());
        let _ = difficulty.advance(15.0);
        assert_eq!(difficulty.score(), 150.0);
    }

    #[test]
    fn test_force_next_level() {
        let mut difficulty = DifficultyState::new(DifficultyConfig::default());
        let _ = difficulty.advance(5.0);
        assert_eq!(difficulty.force_next_level(), Some(2));
        assert_eq!(difficulty.elapsed(), 30.0);
        assert_eq!(difficulty.force_next_level(), Some(3));
        assert_eq!(difficulty.force_next_level(), Some(4));
        assert_eq!(difficulty.force_next_level(), Some(5));
        assert_eq!(difficulty.force_next_level(), None);
    }

    #[test]
    fn test_reset_returns_to_level_one() {
        let mut difficulty = DifficultyState::new(DifficultyConfig::default());
        let _ = difficulty.advance(100.0);
        difficulty.reset();
        assert_eq!(difficulty.level(), 1);
        assert_eq!(difficulty.score(), 0.0);
    }

    proptest! {
        #[test]
        fn prop_level_never_decreases(steps in proptest::collection::vec(0.0f32..20.0, 1..100)) {
            let mut difficulty = DifficultyState::new(DifficultyConfig::default());
            let mut last = difficulty.level();
            for dt in steps {
                let _ = difficulty.advance(dt);
                prop_assert!(difficulty.level() >= last);
                prop_assert_eq!(
                    difficulty.level(),
                    level_for(&[30.0, 60.0, 120.0, 200.0], difficulty.elapsed())
                );
                last = difficulty.level();
            }
        }
    }
}
