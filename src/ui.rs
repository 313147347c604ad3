//! Headless presentation model
//!
//! The HUD never reads simulation internals: it is driven by `GameEvent`s and
//! the per-frame clocks, so any frontend can render it as it likes.
//! `Hud::follow` wires both up for a run after each tick.

use crate::lerp;
use crate::sim::{
    CameraState, ChallengeClass, CountdownClock, DeathCause, GameEvent, InputToken, RunState,
    Side,
};

/// Circle scale when a parkour prompt appears
pub const PARKOUR_START_SCALE: f32 = 3.0;
/// Circle scale when the parkour deadline is reached
pub const PARKOUR_END_SCALE: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Countdown {
    id: u64,
    deadline: f32,
    elapsed: f32,
    clock: CountdownClock,
}

impl Countdown {
    fn advance(&mut self, scaled_dt: f32, unscaled_dt: f32) {
        self.elapsed += match self.clock {
            CountdownClock::Scaled => scaled_dt,
            CountdownClock::Unscaled => unscaled_dt,
        };
    }

    fn progress(&self) -> f32 {
        if self.deadline <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.deadline).clamp(0.0, 1.0)
        }
    }
}

/// Shrinking circle labelled with the key to press
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParkourIndicator {
    pub label: char,
    countdown: Countdown,
}

impl ParkourIndicator {
    pub fn id(&self) -> u64 {
        self.countdown.id
    }

    pub fn scale(&self) -> f32 {
        lerp(PARKOUR_START_SCALE, PARKOUR_END_SCALE, self.countdown.progress())
    }
}

/// Draining bar on the side the enemy is on
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CombatIndicator {
    pub side: Side,
    countdown: Countdown,
}

impl CombatIndicator {
    pub fn id(&self) -> u64 {
        self.countdown.id
    }

    pub fn fill(&self) -> f32 {
        lerp(1.0, 0.0, self.countdown.progress())
    }
}

#[derive(Debug, Clone)]
pub struct Hud {
    pub score: f32,
    pub high_score: f32,
    pub level: u32,
    pub camera: CameraState,
    pub paused: bool,
    pub death: Option<DeathCause>,
    pub enemies_killed: u32,
    pub parkour: Option<ParkourIndicator>,
    pub combat: Option<CombatIndicator>,
}

impl Hud {
    pub fn new(high_score: f32) -> Self {
        Self {
            score: 0.0,
            high_score,
            level: 1,
            camera: CameraState::Normal,
            paused: false,
            death: None,
            enemies_killed: 0,
            parkour: None,
            combat: None,
        }
    }

    pub fn difficulty_label(&self) -> String {
        format!("Level {}", self.level)
    }

    /// Live score; the displayed best follows it once beaten
    pub fn set_score(&mut self, score: f32) {
        self.score = score;
        self.high_score = self.high_score.max(score);
    }

    pub fn apply(&mut self, event: &GameEvent) {
        match event {
            GameEvent::ChallengeArmed {
                id,
                class,
                token,
                deadline,
                clock,
                ..
            } => {
                let countdown = Countdown {
                    id: *id,
                    deadline: *deadline,
                    elapsed: 0.0,
                    clock: *clock,
                };
                match (class, token) {
                    (ChallengeClass::Parkour, InputToken::Key(key)) => {
                        self.parkour = Some(ParkourIndicator {
                            label: key.as_char(),
                            countdown,
                        });
                    }
                    (ChallengeClass::Combat, InputToken::Side(side)) => {
                        self.combat = Some(CombatIndicator {
                            side: *side,
                            countdown,
                        });
                    }
                    _ => log::warn!("No indicator for {:?} challenge with {:?}", class, token),
                }
            }
            GameEvent::ChallengeResolved { id, class, .. } => {
                let removed = match class {
                    ChallengeClass::Parkour => take_matching(&mut self.parkour, *id, |p| p.id()),
                    ChallengeClass::Combat => take_matching(&mut self.combat, *id, |c| c.id()),
                };
                if !removed {
                    log::debug!("Ignoring resolution #{} with no matching indicator", id);
                }
            }
            GameEvent::DifficultyChanged { level, .. } => self.level = *level,
            GameEvent::CameraStateChanged(state) => self.camera = *state,
            GameEvent::EnemyKilled { .. } => self.enemies_killed += 1,
            GameEvent::PlayerDied { cause, score } => {
                self.death = Some(*cause);
                self.set_score(*score);
                self.parkour = None;
                self.combat = None;
            }
            GameEvent::Paused => self.paused = true,
            GameEvent::Resumed => self.paused = false,
            GameEvent::SegmentSpawned { .. }
            | GameEvent::SegmentRetired { .. }
            | GameEvent::PoolExhausted { .. }
            | GameEvent::ChallengeRejected { .. }
            | GameEvent::PlayerDamaged { .. } => {}
        }
    }

    /// Catch up with `state` after one tick of `dt` real seconds. Uses the
    /// time scale the tick ended on, which is what its countdowns ran at.
    pub fn follow(&mut self, state: &mut RunState, dt: f32) {
        for event in state.drain_events() {
            self.apply(&event);
        }
        self.update(dt * state.arbiter.current(), dt);
    }

    /// Animate the indicators
    pub fn update(&mut self, scaled_dt: f32, unscaled_dt: f32) {
        if let Some(parkour) = self.parkour.as_mut() {
            parkour.countdown.advance(scaled_dt, unscaled_dt);
        }
        if let Some(combat) = self.combat.as_mut() {
            combat.countdown.advance(scaled_dt, unscaled_dt);
        }
    }
}

fn take_matching<T>(slot: &mut Option<T>, id: u64, id_of: impl Fn(&T) -> u64) -> bool {
    if slot.as_ref().is_some_and(|item| id_of(item) == id) {
        *slot = None;
        true
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{ChallengeKind, LetterKey, Outcome};

    fn armed(id: u64, kind: ChallengeKind, token: InputToken, clock: CountdownClock) -> GameEvent {
        GameEvent::ChallengeArmed {
            id,
            class: kind.class(),
            kind,
            token,
            deadline: 2.0,
            clock,
        }
    }

    fn resolved(id: u64, kind: ChallengeKind) -> GameEvent {
        GameEvent::ChallengeResolved {
            id,
            class: kind.class(),
            kind,
            outcome: Outcome::Success,
        }
    }

    #[test]
    fn test_parkour_circle_shrinks_on_scaled_time() {
        let mut hud = Hud::new(0.0);
        let key = InputToken::Key(LetterKey::new('J').unwrap());
        hud.apply(&armed(1, ChallengeKind::Jump, key, CountdownClock::Scaled));

        let indicator = hud.parkour.unwrap();
        assert_eq!(indicator.label, 'J');
        assert_eq!(indicator.scale(), 3.0);

        hud.update(1.0, 5.0);
        assert_eq!(hud.parkour.unwrap().scale(), 2.0);
        hud.update(5.0, 5.0);
        assert_eq!(hud.parkour.unwrap().scale(), 1.0);
    }

    #[test]
    fn test_combat_bar_drains_on_unscaled_time() {
        let mut hud = Hud::new(0.0);
        hud.apply(&armed(
            4,
            ChallengeKind::CombatRight,
            InputToken::Side(Side::Right),
            CountdownClock::Unscaled,
        ));
        hud.update(0.1, 0.5);
        let combat = hud.combat.unwrap();
        assert_eq!(combat.side, Side::Right);
        assert_eq!(combat.fill(), 0.75);
    }

    #[test]
    fn test_indicator_removed_only_by_matching_id() {
        let mut hud = Hud::new(0.0);
        let key = InputToken::Key(LetterKey::new('Q').unwrap());
        hud.apply(&armed(7, ChallengeKind::Slide, key, CountdownClock::Scaled));

        hud.apply(&resolved(6, ChallengeKind::Slide));
        assert!(hud.parkour.is_some());

        hud.apply(&resolved(7, ChallengeKind::Slide));
        assert!(hud.parkour.is_none());

        // A later prompt survives a duplicate of the old resolution
        hud.apply(&armed(8, ChallengeKind::Jump, key, CountdownClock::Scaled));
        hud.apply(&resolved(7, ChallengeKind::Slide));
        assert_eq!(hud.parkour.unwrap().id(), 8);
    }

    #[test]
    fn test_classes_are_independent() {
        let mut hud = Hud::new(0.0);
        let key = InputToken::Key(LetterKey::new('Z').unwrap());
        hud.apply(&armed(1, ChallengeKind::DodgeLeft, key, CountdownClock::Scaled));
        hud.apply(&armed(
            2,
            ChallengeKind::CombatLeft,
            InputToken::Side(Side::Left),
            CountdownClock::Unscaled,
        ));
        hud.apply(&resolved(2, ChallengeKind::CombatLeft));
        assert!(hud.combat.is_none());
        assert!(hud.parkour.is_some());
    }

    #[test]
    fn test_status_fields_follow_events() {
        let mut hud = Hud::new(120.0);
        hud.apply(&GameEvent::DifficultyChanged {
            level: 3,
            multipliers: crate::sim::Multipliers::default(),
        });
        hud.apply(&GameEvent::CameraStateChanged(CameraState::Held));
        hud.apply(&GameEvent::Paused);
        assert_eq!(hud.difficulty_label(), "Level 3");
        assert_eq!(hud.camera, CameraState::Held);
        assert!(hud.paused);

        hud.set_score(80.0);
        assert_eq!(hud.high_score, 120.0);
        hud.apply(&GameEvent::PlayerDied {
            cause: DeathCause::Obstacle,
            score: 130.0,
        });
        assert_eq!(hud.high_score, 130.0);
        assert_eq!(hud.death, Some(DeathCause::Obstacle));
    }

    #[test]
    fn test_followed_circle_tracks_the_armed_countdown() {
        use crate::consts::SIM_DT;
        use crate::sim::{TickInput, tick};
        use crate::tuning::{SpawnWeights, StreamerConfig, Tuning};

        let tuning = Tuning {
            streamer: StreamerConfig {
                weights: SpawnWeights {
                    corridor: 0,
                    obstacle: 1,
                    enemy: 0,
                },
                ..StreamerConfig::default()
            },
            ..Tuning::default()
        };
        let mut state = RunState::new(tuning, 5);
        let mut hud = Hud::new(0.0);
        let idle = TickInput::default();
        while hud.parkour.is_none() {
            tick(&mut state, &idle, SIM_DT);
            hud.follow(&mut state, SIM_DT);
        }

        // Same frame the prompt appeared, already at the slowed rate
        let progress = state
            .challenges
            .slot(ChallengeClass::Parkour)
            .progress()
            .unwrap();
        assert!(progress > 0.0);
        assert_eq!(
            hud.parkour.unwrap().scale(),
            lerp(PARKOUR_START_SCALE, PARKOUR_END_SCALE, progress)
        );

        tick(&mut state, &idle, SIM_DT);
        hud.follow(&mut state, SIM_DT);
        let progress = state
            .challenges
            .slot(ChallengeClass::Parkour)
            .progress()
            .unwrap();
        assert_eq!(
            hud.parkour.unwrap().scale(),
            lerp(PARKOUR_START_SCALE, PARKOUR_END_SCALE, progress)
        );
    }
}
