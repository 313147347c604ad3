//! Trigger volumes along the corridor
//!
//! Volumes are derived from the active window rather than stored: each
//! segment contributes a spawn-next volume, and hazard segments add a
//! challenge cue (and, for obstacles, the obstacle body).

use serde::{Deserialize, Serialize};

use super::challenge::ChallengeKind;
use super::streamer::{SegmentKind, SegmentRecord};
use crate::tuning::TriggerLayout;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerKind {
    /// Arms the segment's challenge
    Cue(ChallengeKind),
    /// Obstacle body: fatal unless the segment was cleared
    Hazard,
    /// Requests the next segment from the streamer
    SpawnNext,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trigger {
    pub z: f32,
    pub kind: TriggerKind,
    /// Spawn index of the owning segment
    pub segment: u64,
}

/// Volumes belonging to one segment
pub fn segment_triggers(record: &SegmentRecord, layout: &TriggerLayout) -> Vec<Trigger> {
    let start = record.z();
    let mut triggers = Vec::with_capacity(3);
    if let Some(kind) = record.encounter {
        triggers.push(Trigger {
            z: start + layout.cue_offset,
            kind: TriggerKind::Cue(kind),
            segment: record.index,
        });
    }
    if record.kind == SegmentKind::Obstacle {
        triggers.push(Trigger {
            z: start + layout.hazard_offset,
            kind: TriggerKind::Hazard,
            segment: record.index,
        });
    }
    triggers.push(Trigger {
        z: start + layout.spawn_offset,
        kind: TriggerKind::SpawnNext,
        segment: record.index,
    });
    triggers
}

/// Volumes crossed while moving from `from_z` to `to_z`, nearest first
pub fn crossed<'a>(
    window: impl IntoIterator<Item = &'a SegmentRecord>,
    layout: &TriggerLayout,
    from_z: f32,
    to_z: f32,
) -> Vec<Trigger> {
    if to_z <= from_z {
        return Vec::new();
    }
    let mut hits: Vec<Trigger> = window
        .into_iter()
        .flat_map(|record| segment_triggers(record, layout))
        .filter(|t| from_z < t.z && t.z <= to_z)
        .collect();
    hits.sort_by(|a, b| a.z.total_cmp(&b.z));
    hits
}
