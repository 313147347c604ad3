//! Section streamer
//!
//! Keeps a bounded window of segments along the forward (z) axis: new
//! segments are appended ahead of the player, and once the window overflows
//! the oldest one is unloaded after a delay and handed back to the pool.

use std::collections::VecDeque;

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::challenge::{ChallengeKind, Side};
use super::pool::{Handle, Pool, PoolError};
use super::timer::Scheduler;
use crate::tuning::{ConfigError, HazardRule, SpawnWeights, StreamerConfig};

/// Segment types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SegmentKind {
    Corridor,
    Obstacle,
    Enemy,
}

impl SegmentKind {
    pub const ALL: [SegmentKind; 3] = [
        SegmentKind::Corridor,
        SegmentKind::Obstacle,
        SegmentKind::Enemy,
    ];

    /// Obstacle and enemy segments are hazards
    pub fn is_hazard(self) -> bool {
        !matches!(self, SegmentKind::Corridor)
    }
}

/// A segment in the active window
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentRecord {
    /// Spawn order, unique within a run
    pub index: u64,
    pub kind: SegmentKind,
    pub position: Vec3,
    /// Pooled instance (`None` for the pre-placed anchor segment)
    pub handle: Option<Handle>,
    /// Challenge the segment's cue arms
    pub encounter: Option<ChallengeKind>,
    /// Set once the encounter has been beaten
    pub cleared: bool,
}

impl SegmentRecord {
    pub fn z(&self) -> f32 {
        self.position.z
    }
}

/// Result of spawning one segment
#[derive(Debug, Clone, PartialEq)]
pub struct Spawned {
    pub record: SegmentRecord,
    /// The pool had no free instance of this kind
    pub fallback: bool,
}

/// Map a roll in `0..weights.total()` onto a kind. The cumulative
/// thresholds cover the whole range.
pub fn kind_for_roll(weights: &SpawnWeights, roll: u32) -> SegmentKind {
    if roll < weights.corridor {
        SegmentKind::Corridor
    } else if roll < weights.corridor + weights.obstacle {
        SegmentKind::Obstacle
    } else {
        SegmentKind::Enemy
    }
}

#[derive(Debug, Clone)]
pub struct SectionStreamer {
    config: StreamerConfig,
    pool: Pool<SegmentKind>,
    window: VecDeque<SegmentRecord>,
    next_spawn_z: f32,
    next_index: u64,
    unloads: Scheduler<()>,
}

impl SectionStreamer {
    /// Validate the configuration and pre-build the segment pool
    pub fn new(config: StreamerConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let pool = segment_pool(&config);
        log::info!(
            "Segment pool ready: {} instances, window of {}",
            pool.len(),
            config.max_active
        );

        Ok(Self {
            config,
            pool,
            window: VecDeque::new(),
            next_spawn_z: 0.0,
            next_index: 0,
            unloads: Scheduler::new(),
        })
    }

    /// Track the pre-placed starting corridor; spawning continues after it
    pub fn track_initial(&mut self, z: f32) {
        self.window.push_back(SegmentRecord {
            index: self.next_index,
            kind: SegmentKind::Corridor,
            position: Vec3::new(0.0, 0.0, z),
            handle: None,
            encounter: None,
            cleared: true,
        });
        self.next_index += 1;
        self.next_spawn_z = z + self.config.spawn_distance;
    }

    /// Seed the window with `count` segments
    pub fn spawn_initial<R: Rng>(
        &mut self,
        count: usize,
        rng: &mut R,
    ) -> Result<Vec<Spawned>, PoolError> {
        (0..count).map(|_| self.spawn_next(rng)).collect()
    }

    /// Spawn one segment at the head of the corridor
    pub fn spawn_next<R: Rng>(&mut self, rng: &mut R) -> Result<Spawned, PoolError> {
        let kind = self.choose_kind(rng);
        let acquired = self.pool.acquire(kind, rng)?;
        let position = Vec3::new(0.0, 0.0, self.next_spawn_z);
        self.pool.set_position(acquired.handle, position)?;

        let encounter = match kind {
            SegmentKind::Corridor => None,
            SegmentKind::Obstacle => {
                let i = rng.random_range(0..ChallengeKind::PARKOUR.len());
                Some(ChallengeKind::PARKOUR[i])
            }
            SegmentKind::Enemy => {
                let side = if rng.random_bool(0.5) {
                    Side::Left
                } else {
                    Side::Right
                };
                Some(ChallengeKind::combat(side))
            }
        };

        let record = SegmentRecord {
            index: self.next_index,
            kind,
            position,
            handle: Some(acquired.handle),
            encounter,
            cleared: encounter.is_none(),
        };
        self.window.push_back(record.clone());
        self.next_index += 1;
        self.next_spawn_z += self.config.spawn_distance;

        if self.window.len() > self.config.max_active {
            let _ = self.unloads.schedule(self.config.unload_delay, ());
        }

        log::debug!(
            "Spawned segment #{} {:?} at z={} ({:?})",
            record.index,
            kind,
            position.z,
            encounter
        );
        Ok(Spawned {
            record,
            fallback: acquired.fallback,
        })
    }

    fn choose_kind<R: Rng>(&self, rng: &mut R) -> SegmentKind {
        if self.config.hazard_rule == HazardRule::ForceCorridorAfterHazard
            && self.window.back().is_some_and(|r| r.kind.is_hazard())
        {
            return SegmentKind::Corridor;
        }
        let roll = rng.random_range(0..self.config.weights.total());
        kind_for_roll(&self.config.weights, roll)
    }

    /// Remove the oldest segment if the window is over capacity
    pub fn retire_oldest(&mut self) -> Option<SegmentRecord> {
        if self.window.len() <= self.config.max_active {
            return None;
        }
        let record = self.window.pop_front()?;
        if let Some(handle) = record.handle {
            if let Err(e) = self.pool.release(handle) {
                log::error!("Failed to return segment #{} to pool: {}", record.index, e);
            }
        }
        log::debug!("Retired segment #{} at z={}", record.index, record.z());
        Some(record)
    }

    /// Run due deferred unloads
    pub fn advance(&mut self, dt: f32) -> Vec<SegmentRecord> {
        let due = self.unloads.advance(dt);
        due.into_iter().filter_map(|()| self.retire_oldest()).collect()
    }

    /// Cancel every scheduled unload
    pub fn cancel_pending(&mut self) {
        self.unloads.cancel_all();
    }

    pub fn pending_unloads(&self) -> usize {
        self.unloads.pending()
    }

    /// Drop every segment and start from an empty corridor with a freshly
    /// built pool, so the next run reuses instances in the same order
    pub fn reset(&mut self) {
        self.cancel_pending();
        self.window.clear();
        self.pool = segment_pool(&self.config);
        self.unloads = Scheduler::new();
        self.next_spawn_z = 0.0;
        self.next_index = 0;
    }

    /// Flag a segment's encounter as beaten
    pub fn mark_cleared(&mut self, index: u64) -> bool {
        match self.window.iter_mut().find(|r| r.index == index) {
            Some(record) => {
                record.cleared = true;
                true
            }
            None => false,
        }
    }

    pub fn segment(&self, index: u64) -> Option<&SegmentRecord> {
        self.window.iter().find(|r| r.index == index)
    }

    /// Active segments, oldest first
    pub fn window(&self) -> &VecDeque<SegmentRecord> {
        &self.window
    }

    pub fn next_spawn_z(&self) -> f32 {
        self.next_spawn_z
    }

    pub fn pool(&self) -> &Pool<SegmentKind> {
        &self.pool
    }

    pub fn config(&self) -> &StreamerConfig {
        &self.config
    }
}

fn segment_pool(config: &StreamerConfig) -> Pool<SegmentKind> {
    let mut pool = Pool::new();
    for kind in SegmentKind::ALL {
        pool.prewarm(
            kind,
            config.variants.for_kind(kind),
            config.pool_size_per_variant,
        );
    }
    pool
}
