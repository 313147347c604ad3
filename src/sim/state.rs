//! Run state and core simulation types
//!
//! `RunState` owns every subsystem of one run and is the only place where
//! they meet: the streamer feeds trigger volumes, resolved challenges are
//! turned into effects, and everything the presentation layer needs to know
//! is pushed onto `events`.

use glam::Vec3;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::camera::{CameraRig, CameraState, Look};
use super::challenge::{
    ArmError, ChallengeClass, ChallengeEngine, ChallengeKind, CountdownClock, InputToken,
    Outcome, Resolution, Side,
};
use super::difficulty::{DifficultyState, Multipliers};
use super::effects::{Effect, effects_for};
use super::movement::PlayerMotion;
use super::pool::{Handle, Pool};
use super::streamer::{SectionStreamer, SegmentKind, SegmentRecord};
use super::time_scale::TimeScaleArbiter;
use super::timer::Scheduler;
use crate::highscores::HighScoreStore;
use crate::persistence::PersistError;
use crate::tuning::Tuning;

/// Current phase of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    Running,
    Paused,
    /// Run ended
    Dead,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeathCause {
    /// Ran into an obstacle that was not cleared
    Obstacle,
    /// Killed by a rushing enemy
    Enemy,
}

/// Pooled combat props
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectileKind {
    Bullet,
}

/// Deferred combat work
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombatTask {
    /// Draw finished, the shot leaves the gun
    FireBullet(Side),
    /// Bullet reached the enemy
    BulletHit { side: Side, bullet: Handle },
    /// Enemy finished its rush
    EnemyStrike(Side),
}

/// Notifications for the presentation layer, drained once per frame
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    SegmentSpawned {
        index: u64,
        kind: SegmentKind,
        z: f32,
    },
    SegmentRetired {
        index: u64,
        kind: SegmentKind,
    },
    /// A segment had to be built outside the pool
    PoolExhausted {
        kind: SegmentKind,
    },
    ChallengeArmed {
        id: u64,
        class: ChallengeClass,
        kind: ChallengeKind,
        token: InputToken,
        deadline: f32,
        clock: CountdownClock,
    },
    ChallengeRejected {
        kind: ChallengeKind,
        reason: ArmError,
    },
    ChallengeResolved {
        id: u64,
        class: ChallengeClass,
        kind: ChallengeKind,
        outcome: Outcome,
    },
    DifficultyChanged {
        level: u32,
        multipliers: Multipliers,
    },
    CameraStateChanged(CameraState),
    EnemyKilled {
        side: Side,
    },
    PlayerDamaged {
        health: u8,
    },
    PlayerDied {
        cause: DeathCause,
        score: f32,
    },
    Paused,
    Resumed,
}

/// Complete state of one run (deterministic for a given seed and input)
#[derive(Debug, Clone)]
pub struct RunState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    pub phase: GamePhase,
    pub death_cause: Option<DeathCause>,
    /// `None` when the streamer configuration was rejected
    pub streamer: Option<SectionStreamer>,
    pub challenges: ChallengeEngine,
    pub arbiter: TimeScaleArbiter,
    pub difficulty: DifficultyState,
    pub player: PlayerMotion,
    pub camera: CameraRig,
    pub combat: Scheduler<CombatTask>,
    pub bullets: Pool<ProjectileKind>,
    /// Bullets currently in flight
    pub in_flight: Vec<Handle>,
    pub enemies_killed: u32,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Pending notifications (drained by the caller)
    pub events: Vec<GameEvent>,
    tuning: Tuning,
}

impl RunState {
    /// Build a run from `tuning` and start it
    pub fn new(tuning: Tuning, seed: u64) -> Self {
        let streamer = match SectionStreamer::new(tuning.streamer.clone()) {
            Ok(streamer) => Some(streamer),
            Err(e) => {
                log::error!("Segment streaming disabled: {}", e);
                None
            }
        };

        let mut state = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            phase: GamePhase::Running,
            death_cause: None,
            streamer,
            challenges: ChallengeEngine::new(tuning.challenge.clone()),
            arbiter: TimeScaleArbiter::new(),
            difficulty: DifficultyState::new(tuning.difficulty.clone()),
            player: PlayerMotion::new(tuning.player.clone()),
            camera: CameraRig::new(tuning.camera.clone()),
            combat: Scheduler::new(),
            bullets: bullet_pool(tuning.challenge.bullet_pool_size),
            in_flight: Vec::new(),
            enemies_killed: 0,
            time_ticks: 0,
            events: Vec::new(),
            tuning,
        };
        state.begin();
        state
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    /// Track the starting corridor and fill the window ahead of the player
    fn begin(&mut self) {
        self.apply_multipliers();
        let Some(streamer) = self.streamer.as_mut() else {
            return;
        };
        streamer.track_initial(0.0);
        let count = streamer.config().initial_segments;
        for _ in 0..count {
            self.spawn_next_segment();
        }
        log::info!("Run started (seed {})", self.seed);
    }

    /// Start a fresh run on the same seed; replays exactly like a new run
    pub fn reset(&mut self) {
        self.teardown();
        if let Some(streamer) = self.streamer.as_mut() {
            streamer.reset();
        }
        self.challenges = ChallengeEngine::new(self.tuning.challenge.clone());
        self.combat = Scheduler::new();
        self.bullets = bullet_pool(self.tuning.challenge.bullet_pool_size);
        self.rng = Pcg32::seed_from_u64(self.seed);
        self.difficulty.reset();
        self.player.reset();
        self.camera.reset();
        self.phase = GamePhase::Running;
        self.death_cause = None;
        self.enemies_killed = 0;
        self.time_ticks = 0;
        self.events.clear();
        self.begin();
    }

    /// Cancel armed challenges and deferred tasks without gameplay effects
    pub fn teardown(&mut self) {
        for resolution in self.challenges.cancel_all(&mut self.arbiter) {
            self.push_resolved(&resolution);
        }
        self.combat.cancel_all();
        for bullet in std::mem::take(&mut self.in_flight) {
            if let Err(e) = self.bullets.release(bullet) {
                log::error!("Failed to return bullet to pool: {}", e);
            }
        }
        if let Some(streamer) = self.streamer.as_mut() {
            streamer.cancel_pending();
        }
        self.arbiter.clear();
    }

    pub fn score(&self) -> f32 {
        self.difficulty.score()
    }

    pub fn is_running(&self) -> bool {
        self.phase == GamePhase::Running
    }

    /// Submit this run's score; returns whether it is a new high score
    pub fn finish_run(&self, store: &mut HighScoreStore) -> Result<bool, PersistError> {
        store.submit(self.score())
    }

    /// Skip straight to the next difficulty level (debug tooling)
    pub fn debug_advance_difficulty(&mut self) {
        if let Some(level) = self.difficulty.force_next_level() {
            self.on_level_changed(level);
        }
    }

    pub(crate) fn on_level_changed(&mut self, level: u32) {
        self.apply_multipliers();
        self.events.push(GameEvent::DifficultyChanged {
            level,
            multipliers: self.difficulty.multipliers(),
        });
    }

    fn apply_multipliers(&mut self) {
        let multipliers = self.difficulty.multipliers();
        self.player.set_multipliers(&multipliers);
        self.camera.set_multipliers(&multipliers);
        self.challenges
            .set_deadline_multiplier(multipliers.qte_deadline);
    }

    /// Append one segment at the head of the corridor
    pub fn spawn_next_segment(&mut self) {
        let Some(streamer) = self.streamer.as_mut() else {
            return;
        };
        match streamer.spawn_next(&mut self.rng) {
            Ok(spawned) => {
                if spawned.fallback {
                    self.events.push(GameEvent::PoolExhausted {
                        kind: spawned.record.kind,
                    });
                }
                self.events.push(GameEvent::SegmentSpawned {
                    index: spawned.record.index,
                    kind: spawned.record.kind,
                    z: spawned.record.z(),
                });
            }
            Err(e) => log::error!("Failed to spawn segment: {}", e),
        }
    }

    pub(crate) fn push_retired(&mut self, record: &SegmentRecord) {
        self.events.push(GameEvent::SegmentRetired {
            index: record.index,
            kind: record.kind,
        });
    }

    /// Arm the challenge a cue volume asks for
    pub fn arm_challenge(&mut self, kind: ChallengeKind, segment: Option<u64>) {
        let now = self.difficulty.elapsed();
        match self
            .challenges
            .arm(kind, segment, now, &mut self.arbiter, &mut self.rng)
        {
            Ok(spec) => {
                let class = kind.class();
                self.events.push(GameEvent::ChallengeArmed {
                    id: spec.id,
                    class,
                    kind,
                    token: spec.token,
                    deadline: spec.deadline,
                    clock: self.challenges.clock(class),
                });
            }
            Err(reason) => {
                log::warn!("Challenge {:?} rejected: {}", kind, reason);
                self.events
                    .push(GameEvent::ChallengeRejected { kind, reason });
            }
        }
    }

    fn push_resolved(&mut self, resolution: &Resolution) {
        let kind = resolution.spec.kind;
        self.events.push(GameEvent::ChallengeResolved {
            id: resolution.spec.id,
            class: kind.class(),
            kind,
            outcome: resolution.outcome,
        });
    }

    /// Publish a resolution and carry out its consequences
    pub fn resolve(&mut self, resolution: Resolution) {
        self.push_resolved(&resolution);
        let kind = resolution.spec.kind;
        log::debug!(
            "Challenge #{} {:?} resolved: {:?}",
            resolution.spec.id,
            kind,
            resolution.outcome
        );

        if resolution.outcome == Outcome::Success {
            if let Some(segment) = resolution.spec.segment {
                if let Some(streamer) = self.streamer.as_mut() {
                    streamer.mark_cleared(segment);
                }
            }
        }
        for effect in effects_for(kind, resolution.outcome) {
            self.apply_effect(*effect);
        }
    }

    pub fn apply_effect(&mut self, effect: Effect) {
        match effect {
            Effect::Jump => self.player.jump(),
            Effect::Slide => self.player.slide(),
            Effect::Dodge(side) => self.player.dodge(side),
            Effect::ReverseDodge => self.player.reverse_dodge(),
            Effect::Look(side) => self.start_look(Look::Side(side)),
            Effect::TiltDown => self.start_look(Look::Down),
            Effect::ShootEnemy(side) => {
                let _ = self.combat.schedule(
                    self.tuning.challenge.bullet_draw_delay,
                    CombatTask::FireBullet(side),
                );
            }
            Effect::EnemyRush(side) => {
                let _ = self.combat.schedule(
                    self.tuning.challenge.enemy_rush_time,
                    CombatTask::EnemyStrike(side),
                );
            }
        }
    }

    fn start_look(&mut self, look: Look) {
        self.camera.look(look);
        self.events
            .push(GameEvent::CameraStateChanged(self.camera.state()));
    }

    pub(crate) fn run_combat_task(&mut self, task: CombatTask) {
        match task {
            CombatTask::FireBullet(side) => {
                let acquired = match self.bullets.acquire(ProjectileKind::Bullet, &mut self.rng) {
                    Ok(acquired) => acquired,
                    Err(e) => {
                        log::error!("Failed to fire bullet: {}", e);
                        return;
                    }
                };
                let muzzle = self.player.position() + Vec3::new(0.0, 1.5, 0.0);
                if let Err(e) = self.bullets.set_position(acquired.handle, muzzle) {
                    log::error!("Failed to place bullet: {}", e);
                }
                self.in_flight.push(acquired.handle);
                let _ = self.combat.schedule(
                    self.tuning.challenge.bullet_flight_time,
                    CombatTask::BulletHit {
                        side,
                        bullet: acquired.handle,
                    },
                );
            }
            CombatTask::BulletHit { side, bullet } => {
                self.in_flight.retain(|b| *b != bullet);
                if let Err(e) = self.bullets.release(bullet) {
                    log::error!("Failed to return bullet to pool: {}", e);
                }
                self.enemies_killed += 1;
                self.events.push(GameEvent::EnemyKilled { side });
            }
            CombatTask::EnemyStrike(side) => {
                let health = self.player.take_damage(1);
                log::debug!("Enemy on the {:?} struck, health {}", side, health);
                self.events.push(GameEvent::PlayerDamaged { health });
                if self.player.is_dead() {
                    self.die(DeathCause::Enemy);
                }
            }
        }
    }

    /// End the run
    pub fn die(&mut self, cause: DeathCause) {
        if self.phase == GamePhase::Dead {
            return;
        }
        self.player.kill();
        self.phase = GamePhase::Dead;
        self.death_cause = Some(cause);
        self.teardown();
        let score = self.score();
        log::info!("Player died ({:?}) with score {:.0}", cause, score);
        self.events.push(GameEvent::PlayerDied { cause, score });
    }

    /// Take pending events
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

fn bullet_pool(size: usize) -> Pool<ProjectileKind> {
    let mut bullets = Pool::new();
    bullets.prewarm(ProjectileKind::Bullet, 1, size);
    bullets
}
