//! Player locomotion: auto-run, dodge, jump, slide and health

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::challenge::Side;
use super::difficulty::Multipliers;
use crate::consts::GRAVITY;
use crate::move_towards;
use crate::tuning::PlayerConfig;

/// Lateral direction of a side (left is -x)
fn side_sign(side: Side) -> f32 {
    match side {
        Side::Left => -1.0,
        Side::Right => 1.0,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerMotion {
    config: PlayerConfig,
    position: Vec3,
    /// Lane the player returns to after a dodge
    lane_x: f32,
    target_x: f32,
    vertical_velocity: f32,
    slide_timer: f32,
    health: u8,
    speed_multiplier: f32,
    dodge_multiplier: f32,
}

impl PlayerMotion {
    pub fn new(config: PlayerConfig) -> Self {
        let health = config.max_health;
        let start_z = config.start_z;
        Self {
            config,
            position: Vec3::new(0.0, 0.0, start_z),
            lane_x: 0.0,
            target_x: 0.0,
            vertical_velocity: 0.0,
            slide_timer: 0.0,
            health,
            speed_multiplier: 1.0,
            dodge_multiplier: 1.0,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.config.clone());
    }

    pub fn set_multipliers(&mut self, multipliers: &Multipliers) {
        self.speed_multiplier = multipliers.speed;
        self.dodge_multiplier = multipliers.dodge_speed;
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Forward speed in units per second of sim time
    pub fn speed(&self) -> f32 {
        self.config.move_speed * self.speed_multiplier
    }

    pub fn health(&self) -> u8 {
        self.health
    }

    pub fn is_dead(&self) -> bool {
        self.health == 0
    }

    pub fn is_grounded(&self) -> bool {
        self.position.y <= 0.0 && self.vertical_velocity <= 0.0
    }

    pub fn is_sliding(&self) -> bool {
        self.slide_timer > 0.0
    }

    /// Integrate one step of scaled sim time
    pub fn advance(&mut self, dt: f32) {
        if dt <= 0.0 {
            return;
        }
        self.position.z += self.speed() * dt;

        let lateral_step = self.config.dodge_speed * self.dodge_multiplier * dt;
        self.position.x = move_towards(self.position.x, self.target_x, lateral_step);

        if !self.is_grounded() {
            self.position.y += self.vertical_velocity * dt;
            self.vertical_velocity -= GRAVITY * dt;
            if self.position.y <= 0.0 {
                self.position.y = 0.0;
                self.vertical_velocity = 0.0;
            }
        }

        self.slide_timer = (self.slide_timer - dt).max(0.0);
    }

    /// Launch with enough impulse to reach the configured jump height
    pub fn jump(&mut self) {
        if !self.is_grounded() {
            return;
        }
        self.vertical_velocity = (2.0 * GRAVITY * self.config.jump_height).sqrt();
        self.slide_timer = 0.0;
    }

    pub fn slide(&mut self) {
        self.slide_timer = self.config.slide_duration;
    }

    /// Sidestep one dodge offset away from the current lane
    pub fn dodge(&mut self, side: Side) {
        self.target_x = self.lane_x + side_sign(side) * self.config.dodge_offset;
    }

    /// Head back to the lane held before the last dodge
    pub fn reverse_dodge(&mut self) {
        self.target_x = self.lane_x;
    }

    /// Apply damage; returns the remaining health
    pub fn take_damage(&mut self, amount: u8) -> u8 {
        self.health = self.health.saturating_sub(amount);
        self.health
    }

    pub fn kill(&mut self) {
        self.health = 0;
    }
}
