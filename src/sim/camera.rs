//! Camera look sequences
//!
//! A look tilts the camera towards a target, holds it there, then tilts back
//! to neutral. Only one sequence runs at a time: starting a new look bumps
//! the generation and the in-flight sequence is dropped, with the new tilt
//! starting from wherever the camera currently points.

use serde::{Deserialize, Serialize};

use super::challenge::Side;
use super::difficulty::Multipliers;
use crate::lerp;
use crate::tuning::CameraConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Look {
    Side(Side),
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CameraState {
    Normal,
    Tilting,
    Held,
    Returning,
}

#[derive(Debug, Clone, Copy)]
struct Sequence {
    look: Look,
    phase: CameraState,
    timer: f32,
    from: (f32, f32),
}

#[derive(Debug, Clone)]
pub struct CameraRig {
    config: CameraConfig,
    tilt_multiplier: f32,
    hold_multiplier: f32,
    yaw: f32,
    pitch: f32,
    generation: u64,
    sequence: Option<Sequence>,
}

impl CameraRig {
    pub fn new(config: CameraConfig) -> Self {
        Self {
            config,
            tilt_multiplier: 1.0,
            hold_multiplier: 1.0,
            yaw: 0.0,
            pitch: 0.0,
            generation: 0,
            sequence: None,
        }
    }

    pub fn set_multipliers(&mut self, multipliers: &Multipliers) {
        self.tilt_multiplier = multipliers.camera_tilt;
        self.hold_multiplier = multipliers.camera_hold;
    }

    pub fn state(&self) -> CameraState {
        self.sequence.map_or(CameraState::Normal, |s| s.phase)
    }

    pub fn current_look(&self) -> Option<Look> {
        self.sequence.map(|s| s.look)
    }

    /// Yaw in degrees, negative is left
    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    /// Pitch in degrees, positive is down
    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn tilt_duration(&self) -> f32 {
        self.config.tilt_duration * self.tilt_multiplier
    }

    fn hold_duration(&self) -> f32 {
        self.config.hold_duration * self.hold_multiplier
    }

    fn target(&self, look: Look) -> (f32, f32) {
        match look {
            Look::Side(Side::Left) => (-self.config.side_tilt_angle, 0.0),
            Look::Side(Side::Right) => (self.config.side_tilt_angle, 0.0),
            Look::Down => (0.0, self.config.down_tilt_angle),
        }
    }

    /// Start a look sequence, replacing any in flight
    pub fn look(&mut self, look: Look) -> u64 {
        self.generation += 1;
        if let Some(previous) = self.sequence {
            log::debug!(
                "Camera look {:?} interrupted by {:?} (generation {})",
                previous.look,
                look,
                self.generation
            );
        }
        self.sequence = Some(Sequence {
            look,
            phase: CameraState::Tilting,
            timer: 0.0,
            from: (self.yaw, self.pitch),
        });
        self.generation
    }

    /// Snap back to neutral
    pub fn reset(&mut self) {
        self.generation += 1;
        self.sequence = None;
        self.yaw = 0.0;
        self.pitch = 0.0;
    }

    /// Step the active sequence; returns the states entered, in order
    pub fn advance(&mut self, dt: f32) -> Vec<CameraState> {
        let mut entered = Vec::new();
        let mut remaining = dt.max(0.0);

        while let Some(mut seq) = self.sequence {
            let duration = match seq.phase {
                CameraState::Held => self.hold_duration(),
                _ => self.tilt_duration(),
            };
            let step = remaining.min((duration - seq.timer).max(0.0));
            seq.timer += step;
            remaining -= step;

            let target = self.target(seq.look);
            let t = if duration > 0.0 { seq.timer / duration } else { 1.0 };
            let (yaw, pitch) = match seq.phase {
                CameraState::Tilting => (lerp(seq.from.0, target.0, t), lerp(seq.from.1, target.1, t)),
                CameraState::Held => target,
                CameraState::Returning | CameraState::Normal => {
                    (lerp(target.0, 0.0, t), lerp(target.1, 0.0, t))
                }
            };
            self.yaw = yaw;
            self.pitch = pitch;

            if seq.timer < duration {
                self.sequence = Some(seq);
                break;
            }

            let next = match seq.phase {
                CameraState::Tilting => CameraState::Held,
                CameraState::Held => CameraState::Returning,
                CameraState::Returning | CameraState::Normal => CameraState::Normal,
            };
            entered.push(next);
            if next == CameraState::Normal {
                self.sequence = None;
            } else {
                self.sequence = Some(Sequence {
                    phase: next,
                    timer: 0.0,
                    ..seq
                });
            }
        }
        entered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_sequence() {
        let mut camera = CameraRig::new(CameraConfig::default());
        camera.look(Look::Side(Side::Left));
        assert_eq!(camera.state(), CameraState::Tilting);

        assert!(camera.advance(0.55).is_empty());
        assert!((camera.yaw() + 45.0).abs() < 1e-3);

        assert_eq!(camera.advance(0.55), vec![CameraState::Held]);
        assert_eq!(camera.yaw(), -90.0);

        assert_eq!(camera.advance(1.5), vec![CameraState::Returning]);
        assert_eq!(camera.advance(1.1), vec![CameraState::Normal]);
        assert_eq!(camera.yaw(), 0.0);
        assert_eq!(camera.state(), CameraState::Normal);
    }

    #[test]
    fn test_large_step_walks_every_phase() {
        let mut camera = CameraRig::new(CameraConfig::default());
        camera.look(Look::Down);
        let entered = camera.advance(10.0);
        assert_eq!(
            entered,
            vec![
                CameraState::Held,
                CameraState::Returning,
                CameraState::Normal
            ]
        );
        assert_eq!(camera.pitch(), 0.0);
    }

    #[test]
    fn test_new_look_cancels_in_flight_sequence() {
        let mut camera = CameraRig::new(CameraConfig::default());
        let first = camera.look(Look::Side(Side::Right));
        let _ = camera.advance(1.1);
        assert_eq!(camera.state(), CameraState::Held);

        let second = camera.look(Look::Down);
        assert!(second > first);
        assert_eq!(camera.state(), CameraState::Tilting);
        assert_eq!(camera.current_look(), Some(Look::Down));

        // Tilts from the held yaw back to centre while pitching down
        let _ = camera.advance(1.1);
        assert_eq!(camera.yaw(), 0.0);
        assert_eq!(camera.pitch(), 90.0);
    }

    #[test]
    fn test_multipliers_shorten_durations() {
        let mut camera = CameraRig::new(CameraConfig::default());
        camera.set_multipliers(&Multipliers::new(1.0, 1.0, 1.0, 0.5, 0.5));
        camera.look(Look::Down);
        assert_eq!(camera.advance(0.55), vec![CameraState::Held]);
        assert_eq!(camera.advance(0.75), vec![CameraState::Returning]);
    }

    #[test]
    fn test_reset_returns_to_neutral() {
        let mut camera = CameraRig::new(CameraConfig::default());
        camera.look(Look::Side(Side::Left));
        let _ = camera.advance(0.5);
        camera.reset();
        assert_eq!(camera.state(), CameraState::Normal);
        assert_eq!(camera.yaw(), 0.0);
        assert!(camera.advance(1.0).is_empty());
    }
}
