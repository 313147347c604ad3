//! Simulation time-scale arbitration
//!
//! Parkour and combat challenges both slow the simulation down and pausing
//! stops it. Requests form a stack: the newest live request wins, and
//! releasing a request restores whatever is beneath it.

use serde::{Deserialize, Serialize};

use crate::consts::NORMAL_TIME_SCALE;

/// Who asked for a time-scale change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScaleOwner {
    Parkour,
    Combat,
    Pause,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ScaleRequest {
    owner: ScaleOwner,
    scale: f32,
}

#[derive(Debug, Clone)]
pub struct TimeScaleArbiter {
    base: f32,
    stack: Vec<ScaleRequest>,
}

impl Default for TimeScaleArbiter {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeScaleArbiter {
    pub fn new() -> Self {
        Self {
            base: NORMAL_TIME_SCALE,
            stack: Vec::new(),
        }
    }

    /// Effective scale
    pub fn current(&self) -> f32 {
        self.stack.last().map_or(self.base, |r| r.scale)
    }

    /// Push a request; an owner with a live request has it replaced in place
    pub fn request(&mut self, owner: ScaleOwner, scale: f32) {
        let scale = scale.max(0.0);
        if let Some(existing) = self.stack.iter_mut().find(|r| r.owner == owner) {
            existing.scale = scale;
            return;
        }
        self.stack.push(ScaleRequest { owner, scale });
    }

    /// Drop `owner`'s request. Returns false if it had none.
    pub fn release(&mut self, owner: ScaleOwner) -> bool {
        let before = self.stack.len();
        self.stack.retain(|r| r.owner != owner);
        self.stack.len() != before
    }

    pub fn holds(&self, owner: ScaleOwner) -> bool {
        self.stack.iter().any(|r| r.owner == owner)
    }

    pub fn clear(&mut self) {
        self.stack.clear();
    }
}
