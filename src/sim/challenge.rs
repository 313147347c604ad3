//! Timed-input challenges (quick-time events)
//!
//! Each challenge class (parkour, combat) has one slot that is either idle or
//! armed with a single [`ChallengeSpec`]. An armed challenge resolves exactly
//! once: success on the matching input before the deadline, failure when the
//! deadline elapses, or cancellation.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::time_scale::{ScaleOwner, TimeScaleArbiter};
use crate::tuning::ChallengeConfig;

/// Independent challenge families, each with its own slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChallengeClass {
    Parkour,
    Combat,
}

impl ChallengeClass {
    pub fn scale_owner(self) -> ScaleOwner {
        match self {
            ChallengeClass::Parkour => ScaleOwner::Parkour,
            ChallengeClass::Combat => ScaleOwner::Combat,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChallengeKind {
    Jump,
    Slide,
    DodgeLeft,
    DodgeRight,
    CombatLeft,
    CombatRight,
}

impl ChallengeKind {
    /// Kinds an obstacle segment can demand
    pub const PARKOUR: [ChallengeKind; 4] = [
        ChallengeKind::Jump,
        ChallengeKind::Slide,
        ChallengeKind::DodgeLeft,
        ChallengeKind::DodgeRight,
    ];

    pub fn class(self) -> ChallengeClass {
        match self {
            ChallengeKind::Jump
            | ChallengeKind::Slide
            | ChallengeKind::DodgeLeft
            | ChallengeKind::DodgeRight => ChallengeClass::Parkour,
            ChallengeKind::CombatLeft | ChallengeKind::CombatRight => ChallengeClass::Combat,
        }
    }

    /// Active side for combat challenges
    pub fn side(self) -> Option<Side> {
        match self {
            ChallengeKind::CombatLeft => Some(Side::Left),
            ChallengeKind::CombatRight => Some(Side::Right),
            _ => None,
        }
    }

    pub fn combat(side: Side) -> Self {
        match side {
            Side::Left => ChallengeKind::CombatLeft,
            Side::Right => ChallengeKind::CombatRight,
        }
    }
}

/// A letter key in A..=Z
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LetterKey(u8);

impl LetterKey {
    pub fn new(c: char) -> Option<Self> {
        let upper = c.to_ascii_uppercase();
        upper.is_ascii_uppercase().then_some(Self(upper as u8))
    }

    pub fn random<R: Rng>(rng: &mut R) -> Self {
        Self(b'A' + rng.random_range(0..26u8))
    }

    pub fn as_char(self) -> char {
        self.0 as char
    }
}

impl fmt::Display for LetterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// The input a challenge waits for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputToken {
    Key(LetterKey),
    Side(Side),
}

/// Which clock a countdown runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CountdownClock {
    /// Simulation time (slowed by the active time scale)
    Scaled,
    /// Real frame time
    Unscaled,
}

/// One armed challenge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeSpec {
    pub id: u64,
    pub kind: ChallengeKind,
    pub token: InputToken,
    /// Countdown length in seconds on the class clock
    pub deadline: f32,
    /// Survival time when the challenge was armed
    pub armed_at: f32,
    /// Spawn index of the segment whose cue armed the challenge
    pub segment: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Success,
    Failure,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub spec: ChallengeSpec,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArmError {
    #[error("{class:?} challenge {active:?} is already armed")]
    AlreadyArmed {
        class: ChallengeClass,
        active: ChallengeKind,
    },
    #[error("{kind:?} cannot be armed in the {slot:?} slot")]
    WrongClass {
        kind: ChallengeKind,
        slot: ChallengeClass,
    },
}

#[derive(Debug, Clone)]
enum SlotState {
    Idle,
    Armed { spec: ChallengeSpec, elapsed: f32 },
}

/// State machine for one challenge class
#[derive(Debug, Clone)]
pub struct ChallengeSlot {
    class: ChallengeClass,
    state: SlotState,
}

impl ChallengeSlot {
    pub fn new(class: ChallengeClass) -> Self {
        Self {
            class,
            state: SlotState::Idle,
        }
    }

    pub fn class(&self) -> ChallengeClass {
        self.class
    }

    /// Idle -> Armed. Arming while armed is rejected.
    pub fn arm(&mut self, spec: ChallengeSpec) -> Result<(), ArmError> {
        if spec.kind.class() != self.class {
            return Err(ArmError::WrongClass {
                kind: spec.kind,
                slot: self.class,
            });
        }
        if let SlotState::Armed { spec: active, .. } = &self.state {
            return Err(ArmError::AlreadyArmed {
                class: self.class,
                active: active.kind,
            });
        }
        self.state = SlotState::Armed { spec, elapsed: 0.0 };
        Ok(())
    }

    /// Resolve with success if `token` is the required one and time remains.
    /// Any other input leaves the slot untouched.
    pub fn handle_input(&mut self, token: &InputToken) -> Option<Resolution> {
        match &self.state {
            SlotState::Armed { spec, elapsed } if spec.token == *token && *elapsed < spec.deadline => {}
            _ => return None,
        }
        self.finish(Outcome::Success)
    }

    /// Run the countdown; resolves with failure once the deadline is reached
    pub fn advance(&mut self, dt: f32) -> Option<Resolution> {
        match &mut self.state {
            SlotState::Armed { spec, elapsed } => {
                *elapsed += dt;
                if *elapsed < spec.deadline {
                    return None;
                }
            }
            SlotState::Idle => return None,
        }
        self.finish(Outcome::Failure)
    }

    /// Armed -> Idle without gameplay consequences
    pub fn cancel(&mut self) -> Option<Resolution> {
        self.finish(Outcome::Cancelled)
    }

    pub fn active(&self) -> Option<&ChallengeSpec> {
        match &self.state {
            SlotState::Armed { spec, .. } => Some(spec),
            SlotState::Idle => None,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.active().is_some()
    }

    /// Countdown progress in [0, 1]
    pub fn progress(&self) -> Option<f32> {
        match &self.state {
            SlotState::Armed { spec, elapsed } => Some((elapsed / spec.deadline).clamp(0.0, 1.0)),
            SlotState::Idle => None,
        }
    }

    fn finish(&mut self, outcome: Outcome) -> Option<Resolution> {
        match std::mem::replace(&mut self.state, SlotState::Idle) {
            SlotState::Armed { spec, .. } => Some(Resolution { spec, outcome }),
            SlotState::Idle => None,
        }
    }
}

/// Both challenge slots plus the rules for arming them
#[derive(Debug, Clone)]
pub struct ChallengeEngine {
    parkour: ChallengeSlot,
    combat: ChallengeSlot,
    config: ChallengeConfig,
    deadline_multiplier: f32,
    next_id: u64,
}

impl ChallengeEngine {
    pub fn new(config: ChallengeConfig) -> Self {
        Self {
            parkour: ChallengeSlot::new(ChallengeClass::Parkour),
            combat: ChallengeSlot::new(ChallengeClass::Combat),
            config,
            deadline_multiplier: 1.0,
            next_id: 1,
        }
    }

    pub fn set_deadline_multiplier(&mut self, multiplier: f32) {
        self.deadline_multiplier = multiplier;
    }

    pub fn slot(&self, class: ChallengeClass) -> &ChallengeSlot {
        match class {
            ChallengeClass::Parkour => &self.parkour,
            ChallengeClass::Combat => &self.combat,
        }
    }

    fn slot_mut(&mut self, class: ChallengeClass) -> &mut ChallengeSlot {
        match class {
            ChallengeClass::Parkour => &mut self.parkour,
            ChallengeClass::Combat => &mut self.combat,
        }
    }

    pub fn clock(&self, class: ChallengeClass) -> CountdownClock {
        match class {
            ChallengeClass::Parkour => self.config.parkour_clock,
            ChallengeClass::Combat => self.config.combat_clock,
        }
    }

    fn base_deadline(&self, class: ChallengeClass) -> f32 {
        match class {
            ChallengeClass::Parkour => self.config.parkour_deadline,
            ChallengeClass::Combat => self.config.combat_deadline,
        }
    }

    fn slow_motion(&self, class: ChallengeClass) -> f32 {
        match class {
            ChallengeClass::Parkour => self.config.parkour_slow_motion,
            ChallengeClass::Combat => self.config.combat_slow_motion,
        }
    }

    /// Arm a challenge of `kind` and slow the simulation down
    pub fn arm<R: Rng>(
        &mut self,
        kind: ChallengeKind,
        segment: Option<u64>,
        now: f32,
        arbiter: &mut TimeScaleArbiter,
        rng: &mut R,
    ) -> Result<ChallengeSpec, ArmError> {
        let class = kind.class();
        if let Some(active) = self.slot(class).active() {
            return Err(ArmError::AlreadyArmed {
                class,
                active: active.kind,
            });
        }

        let token = match kind.side() {
            Some(side) => InputToken::Side(side),
            None => InputToken::Key(LetterKey::random(rng)),
        };
        let spec = ChallengeSpec {
            id: self.next_id,
            kind,
            token,
            deadline: self.base_deadline(class) * self.deadline_multiplier,
            armed_at: now,
            segment,
        };
        self.slot_mut(class).arm(spec.clone())?;
        self.next_id += 1;

        arbiter.request(class.scale_owner(), self.slow_motion(class));
        log::debug!(
            "Armed {:?} challenge #{} ({:?}, {:.2}s)",
            kind,
            spec.id,
            spec.token,
            spec.deadline
        );
        Ok(spec)
    }

    /// Offer one input to both slots
    pub fn handle_input(
        &mut self,
        token: &InputToken,
        arbiter: &mut TimeScaleArbiter,
    ) -> Vec<Resolution> {
        let mut resolved = Vec::new();
        for class in [ChallengeClass::Parkour, ChallengeClass::Combat] {
            if let Some(resolution) = self.slot_mut(class).handle_input(token) {
                arbiter.release(class.scale_owner());
                resolved.push(resolution);
            }
        }
        resolved
    }

    /// Run both countdowns, each on its own clock
    pub fn advance(
        &mut self,
        scaled_dt: f32,
        unscaled_dt: f32,
        arbiter: &mut TimeScaleArbiter,
    ) -> Vec<Resolution> {
        let mut resolved = Vec::new();
        for class in [ChallengeClass::Parkour, ChallengeClass::Combat] {
            let dt = match self.clock(class) {
                CountdownClock::Scaled => scaled_dt,
                CountdownClock::Unscaled => unscaled_dt,
            };
            if let Some(resolution) = self.slot_mut(class).advance(dt) {
                arbiter.release(class.scale_owner());
                resolved.push(resolution);
            }
        }
        resolved
    }

    /// Cancel whatever is armed (scene exit / teardown)
    pub fn cancel_all(&mut self, arbiter: &mut TimeScaleArbiter) -> Vec<Resolution> {
        let mut resolved = Vec::new();
        for class in [ChallengeClass::Parkour, ChallengeClass::Combat] {
            if let Some(resolution) = self.slot_mut(class).cancel() {
                arbiter.release(class.scale_owner());
                resolved.push(resolution);
            }
        }
        resolved
    }
}
