//! Data-driven game balance
//!
//! Every knob the simulation reads lives here. Defaults reproduce the
//! shipped balance; a JSON file may override any subset of fields.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sim::challenge::CountdownClock;
use crate::sim::difficulty::Multipliers;
use crate::sim::streamer::SegmentKind;

/// Configuration problems detected at startup
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no segment variants configured for {kind:?}")]
    NoVariants { kind: SegmentKind },
    #[error("spawn weights must not all be zero")]
    ZeroSpawnWeights,
    #[error("max_active must be at least 1")]
    EmptyWindow,
    #[error("{field} must be positive (got {value})")]
    NonPositive { field: &'static str, value: f32 },
    #[error("{field} must be non-negative (got {value})")]
    Negative { field: &'static str, value: f32 },
    #[error("trigger layout offsets must satisfy 0 <= cue < hazard < spawn < spawn_distance")]
    TriggerLayout,
    #[error("difficulty thresholds must be positive and strictly ascending")]
    DifficultyThresholds,
    #[error("difficulty table needs {expected} multiplier rows (one per level), found {found}")]
    DifficultyTable { expected: usize, found: usize },
    #[error("failed to read tuning file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("tuning file {path} is not valid: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Relative spawn weights per segment kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnWeights {
    pub corridor: u32,
    pub obstacle: u32,
    pub enemy: u32,
}

impl Default for SpawnWeights {
    fn default() -> Self {
        Self {
            corridor: 60,
            obstacle: 20,
            enemy: 20,
        }
    }
}

impl SpawnWeights {
    pub fn total(&self) -> u32 {
        self.corridor + self.obstacle + self.enemy
    }
}

/// Whether hazard segments may follow each other
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HazardRule {
    /// Pure weighted draw
    AllowConsecutive,
    /// After an obstacle or enemy segment the next one is always a corridor
    #[default]
    ForceCorridorAfterHazard,
}

/// Number of distinct prefab variants per segment kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentVariants {
    pub corridor: u16,
    pub obstacle: u16,
    pub enemy: u16,
}

impl Default for SegmentVariants {
    fn default() -> Self {
        Self {
            corridor: 3,
            obstacle: 4,
            enemy: 2,
        }
    }
}

impl SegmentVariants {
    pub fn for_kind(&self, kind: SegmentKind) -> u16 {
        match kind {
            SegmentKind::Corridor => self.corridor,
            SegmentKind::Obstacle => self.obstacle,
            SegmentKind::Enemy => self.enemy,
        }
    }
}

/// Trigger volume offsets, measured from the segment start along z
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TriggerLayout {
    /// Challenge cue (obstacle and enemy segments)
    pub cue_offset: f32,
    /// Obstacle body (obstacle segments)
    pub hazard_offset: f32,
    /// Spawn-next volume (every segment)
    pub spawn_offset: f32,
}

impl Default for TriggerLayout {
    fn default() -> Self {
        Self {
            cue_offset: 4.0,
            hazard_offset: 24.0,
            spawn_offset: 28.0,
        }
    }
}

/// Section streamer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamerConfig {
    /// Segments spawned at run start (after the anchor)
    pub initial_segments: usize,
    /// Maximum segments kept in the active window
    pub max_active: usize,
    /// Seconds before an overflowing segment is unloaded (0 = immediately)
    pub unload_delay: f32,
    pub weights: SpawnWeights,
    pub hazard_rule: HazardRule,
    /// Distance between consecutive segments (world units)
    pub spawn_distance: f32,
    /// Pre-built instances per variant
    pub pool_size_per_variant: usize,
    pub variants: SegmentVariants,
    pub layout: TriggerLayout,
}

impl Default for StreamerConfig {
    fn default() -> Self {
        Self {
            initial_segments: 4,
            max_active: 5,
            unload_delay: 4.0,
            weights: SpawnWeights::default(),
            hazard_rule: HazardRule::default(),
            spawn_distance: 30.0,
            pool_size_per_variant: 10,
            variants: SegmentVariants::default(),
            layout: TriggerLayout::default(),
        }
    }
}

impl StreamerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for kind in SegmentKind::ALL {
            if self.variants.for_kind(kind) == 0 {
                return Err(ConfigError::NoVariants { kind });
            }
        }
        if self.weights.total() == 0 {
            return Err(ConfigError::ZeroSpawnWeights);
        }
        if self.max_active == 0 {
            return Err(ConfigError::EmptyWindow);
        }
        positive("spawn_distance", self.spawn_distance)?;
        non_negative("unload_delay", self.unload_delay)?;

        let l = &self.layout;
        let ordered = 0.0 <= l.cue_offset
            && l.cue_offset < l.hazard_offset
            && l.hazard_offset < l.spawn_offset
            && l.spawn_offset < self.spawn_distance;
        if !ordered {
            return Err(ConfigError::TriggerLayout);
        }
        Ok(())
    }
}

/// Player movement settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub move_speed: f32,
    pub dodge_speed: f32,
    /// Lateral distance of a dodge from the lane center
    pub dodge_offset: f32,
    pub jump_height: f32,
    pub slide_duration: f32,
    pub max_health: u8,
    /// Starting z position
    pub start_z: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            move_speed: 8.0,
            dodge_speed: 10.0,
            dodge_offset: 4.0,
            jump_height: 6.0,
            slide_duration: 0.8,
            max_health: 1,
            start_z: 1.0,
        }
    }
}

/// Camera look timing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub tilt_duration: f32,
    pub hold_duration: f32,
    /// Pitch for the jump tilt (degrees)
    pub down_tilt_angle: f32,
    /// Yaw for side looks (degrees)
    pub side_tilt_angle: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            tilt_duration: 1.1,
            hold_duration: 1.5,
            down_tilt_angle: 90.0,
            side_tilt_angle: 90.0,
        }
    }
}

/// Quick-time event settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChallengeConfig {
    pub parkour_deadline: f32,
    pub combat_deadline: f32,
    pub parkour_slow_motion: f32,
    pub combat_slow_motion: f32,
    pub parkour_clock: CountdownClock,
    pub combat_clock: CountdownClock,
    /// Delay between the kill shot input and the bullet leaving the gun
    pub bullet_draw_delay: f32,
    pub bullet_flight_time: f32,
    pub bullet_pool_size: usize,
    /// Time for a rushing enemy to reach the player
    pub enemy_rush_time: f32,
}

impl Default for ChallengeConfig {
    fn default() -> Self {
        Self {
            parkour_deadline: 2.0,
            combat_deadline: 1.0,
            parkour_slow_motion: 0.2,
            combat_slow_motion: 0.5,
            parkour_clock: CountdownClock::Scaled,
            combat_clock: CountdownClock::Unscaled,
            bullet_draw_delay: 0.5,
            bullet_flight_time: 0.2,
            bullet_pool_size: 4,
            enemy_rush_time: 0.4,
        }
    }
}

/// Difficulty thresholds and per-level multipliers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultyConfig {
    /// Survival seconds at which levels 2, 3, ... begin
    pub thresholds: Vec<f32>,
    /// One row per level, level 1 first
    pub levels: Vec<Multipliers>,
}

impl Default for DifficultyConfig {
    fn default() -> Self {
        Self {
            thresholds: vec![30.0, 60.0, 120.0, 200.0],
            levels: vec![
                Multipliers::new(1.0, 1.0, 1.0, 1.0, 1.0),
                Multipliers::new(1.1, 1.1, 0.9, 0.9, 0.9),
                Multipliers::new(1.2, 1.2, 0.8, 0.85, 0.8),
                Multipliers::new(1.3, 1.35, 0.7, 0.75, 0.7),
                Multipliers::new(1.45, 1.5, 0.6, 0.65, 0.6),
            ],
        }
    }
}

impl DifficultyConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ascending = self.thresholds.windows(2).all(|w| w[0] < w[1]);
        if !ascending || self.thresholds.iter().any(|t| *t <= 0.0) {
            return Err(ConfigError::DifficultyThresholds);
        }
        let expected = self.thresholds.len() + 1;
        if self.levels.len() != expected {
            return Err(ConfigError::DifficultyTable {
                expected,
                found: self.levels.len(),
            });
        }
        for m in &self.levels {
            positive("speed multiplier", m.speed)?;
            positive("dodge speed multiplier", m.dodge_speed)?;
            positive("deadline multiplier", m.qte_deadline)?;
            positive("camera tilt multiplier", m.camera_tilt)?;
            positive("camera hold multiplier", m.camera_hold)?;
        }
        Ok(())
    }
}

/// Complete tuning document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub streamer: StreamerConfig,
    pub player: PlayerConfig,
    pub camera: CameraConfig,
    pub challenge: ChallengeConfig,
    pub difficulty: DifficultyConfig,
}

impl Tuning {
    /// Validate everything except the streamer, which is checked (and may be
    /// disabled on its own) when the run is built
    pub fn validate_core(&self) -> Result<(), ConfigError> {
        let p = &self.player;
        positive("move_speed", p.move_speed)?;
        positive("dodge_speed", p.dodge_speed)?;
        non_negative("jump_height", p.jump_height)?;
        non_negative("slide_duration", p.slide_duration)?;
        if p.max_health == 0 {
            return Err(ConfigError::NonPositive {
                field: "max_health",
                value: 0.0,
            });
        }

        positive("tilt_duration", self.camera.tilt_duration)?;
        non_negative("hold_duration", self.camera.hold_duration)?;

        let c = &self.challenge;
        positive("parkour_deadline", c.parkour_deadline)?;
        positive("combat_deadline", c.combat_deadline)?;
        positive("parkour_slow_motion", c.parkour_slow_motion)?;
        positive("combat_slow_motion", c.combat_slow_motion)?;
        non_negative("bullet_draw_delay", c.bullet_draw_delay)?;
        non_negative("bullet_flight_time", c.bullet_flight_time)?;
        non_negative("enemy_rush_time", c.enemy_rush_time)?;

        self.difficulty.validate()
    }

    /// Validate the whole document
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.streamer.validate()?;
        self.validate_core()
    }

    /// Load a tuning file and validate everything but the streamer
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let tuning: Tuning = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tuning.validate_core()?;
        log::info!("Loaded tuning from {}", path.display());
        Ok(tuning)
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { field, value })
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::Negative { field, value })
    }
}
