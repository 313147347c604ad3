//! Fixed timestep simulation tick
//!
//! Advances a run deterministically. Within a frame the order is fixed:
//! pause toggle, survival clock, player motion, trigger volumes, challenge
//! input, challenge countdowns, deferred tasks, camera.

use super::challenge::{ChallengeClass, InputToken};
use super::effects::Effect;
use super::state::{DeathCause, GameEvent, GamePhase, RunState};
use super::time_scale::ScaleOwner;
use super::trigger::{TriggerKind, crossed};

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Tokens newly pressed this frame, in press order
    pub pressed: Vec<InputToken>,
    /// Pause toggle
    pub pause: bool,
    /// Demo mode - answers every armed challenge correctly
    pub autopilot: bool,
}

/// Advance the run by one frame of `dt` real seconds
pub fn tick(state: &mut RunState, input: &TickInput, dt: f32) {
    // Handle pause toggle
    if input.pause {
        match state.phase {
            GamePhase::Running => {
                state.phase = GamePhase::Paused;
                state.arbiter.request(ScaleOwner::Pause, 0.0);
                state.events.push(GameEvent::Paused);
                log::info!("Paused");
                return;
            }
            GamePhase::Paused => {
                state.phase = GamePhase::Running;
                state.arbiter.release(ScaleOwner::Pause);
                state.events.push(GameEvent::Resumed);
                log::info!("Resumed");
            }
            GamePhase::Dead => {}
        }
    }

    if state.phase != GamePhase::Running {
        return;
    }
    state.time_ticks += 1;

    let scaled_dt = dt * state.arbiter.current();

    // Survival clock, score and difficulty
    if let Some(level) = state.difficulty.advance(scaled_dt) {
        state.on_level_changed(level);
    }

    // Player motion
    let from_z = state.player.position().z;
    state.player.advance(scaled_dt);
    let to_z = state.player.position().z;

    // Trigger volumes crossed this frame, nearest first
    let hits = match state.streamer.as_ref() {
        Some(streamer) => crossed(streamer.window(), &streamer.config().layout, from_z, to_z),
        None => Vec::new(),
    };
    for trigger in hits {
        match trigger.kind {
            TriggerKind::SpawnNext => {
                state.spawn_next_segment();
                state.apply_effect(Effect::ReverseDodge);
            }
            TriggerKind::Cue(kind) => state.arm_challenge(kind, Some(trigger.segment)),
            TriggerKind::Hazard => {
                let cleared = state
                    .streamer
                    .as_ref()
                    .and_then(|s| s.segment(trigger.segment))
                    .is_none_or(|record| record.cleared);
                if !cleared {
                    state.die(DeathCause::Obstacle);
                    return;
                }
            }
        }
    }

    // Challenge input
    let mut pressed = input.pressed.clone();
    if input.autopilot {
        for class in [ChallengeClass::Parkour, ChallengeClass::Combat] {
            if let Some(spec) = state.challenges.slot(class).active() {
                pressed.push(spec.token);
            }
        }
    }
    for token in &pressed {
        for resolution in state.challenges.handle_input(token, &mut state.arbiter) {
            state.resolve(resolution);
        }
    }

    // Countdowns see the time scale as set this frame
    let scaled_dt = dt * state.arbiter.current();
    for resolution in state.challenges.advance(scaled_dt, dt, &mut state.arbiter) {
        state.resolve(resolution);
    }

    // Deferred tasks
    let retired = match state.streamer.as_mut() {
        Some(streamer) => streamer.advance(scaled_dt),
        None => Vec::new(),
    };
    for record in &retired {
        state.push_retired(record);
    }
    for task in state.combat.advance(scaled_dt) {
        state.run_combat_task(task);
        if state.phase == GamePhase::Dead {
            return;
        }
    }

    // Camera
    for camera_state in state.camera.advance(scaled_dt) {
        state.events.push(GameEvent::CameraStateChanged(camera_state));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::sim::challenge::Outcome;
    use crate::sim::streamer::SegmentKind;
    use crate::tuning::{SpawnWeights, StreamerConfig, Tuning};

    fn only(kind: SegmentKind) -> Tuning {
        let weights = match kind {
            SegmentKind::Corridor => SpawnWeights {
                corridor: 1,
                obstacle: 0,
                enemy: 0,
            },
            SegmentKind::Obstacle => SpawnWeights {
                corridor: 0,
                obstacle: 1,
                enemy: 0,
            },
            SegmentKind::Enemy => SpawnWeights {
                corridor: 0,
                obstacle: 0,
                enemy: 1,
            },
        };
        Tuning {
            streamer: StreamerConfig {
                weights,
                ..StreamerConfig::default()
            },
            ..Tuning::default()
        }
    }

    fn run(state: &mut RunState, input: &TickInput, ticks: u32) {
        for _ in 0..ticks {
            tick(state, input, SIM_DT);
            if state.phase == GamePhase::Dead {
                break;
            }
        }
    }

    fn armed_token(state: &RunState) -> Option<InputToken> {
        state.events.iter().rev().find_map(|e| match e {
            GameEvent::ChallengeArmed { token, .. } => Some(*token),
            _ => None,
        })
    }

    #[test]
    fn test_determinism() {
        let input = TickInput {
            autopilot: true,
            ..Default::default()
        };
        let mut a = RunState::new(Tuning::default(), 12345);
        let mut b = RunState::new(Tuning::default(), 12345);
        run(&mut a, &input, 1500);
        run(&mut b, &input, 1500);

        assert_eq!(a.player.position(), b.player.position());
        assert_eq!(a.score(), b.score());
        assert_eq!(a.events, b.events);
    }

    #[test]
    fn test_autopilot_survives_and_levels_up() {
        let input = TickInput {
            autopilot: true,
            ..Default::default()
        };
        let mut state = RunState::new(Tuning::default(), 42);
        run(&mut state, &input, 40 * 60);

        assert_eq!(state.phase, GamePhase::Running);
        assert!(state.difficulty.level() >= 2);
        assert!(state.score() > 300.0);
        let streamer = state.streamer.as_ref().unwrap();
        assert!(streamer.window().len() <= streamer.config().max_active + 2);
        assert!(state.events.iter().any(|e| matches!(
            e,
            GameEvent::SegmentRetired { .. }
        )));
        assert!(!state.events.iter().any(|e| matches!(
            e,
            GameEvent::ChallengeResolved {
                outcome: Outcome::Failure,
                ..
            }
        )));
    }

    #[test]
    fn test_missed_parkour_dies_at_hazard() {
        let mut state = RunState::new(only(SegmentKind::Obstacle), 5);
        run(&mut state, &TickInput::default(), 60 * 60);

        assert_eq!(state.phase, GamePhase::Dead);
        assert_eq!(state.death_cause, Some(DeathCause::Obstacle));
        assert!(state.events.iter().any(|e| matches!(
            e,
            GameEvent::ChallengeResolved {
                outcome: Outcome::Failure,
                ..
            }
        )));
        assert!(state.player.position().z >= 54.0);
    }

    #[test]
    fn test_answered_parkour_passes_hazard() {
        let mut state = RunState::new(only(SegmentKind::Obstacle), 5);
        let idle = TickInput::default();
        while armed_token(&state).is_none() {
            tick(&mut state, &idle, SIM_DT);
        }
        assert_eq!(state.arbiter.current(), 0.2);

        let press = TickInput {
            pressed: vec![armed_token(&state).unwrap()],
            ..Default::default()
        };
        tick(&mut state, &press, SIM_DT);
        assert_eq!(state.arbiter.current(), 1.0);

        // Past the first hazard at z = 54
        run(&mut state, &idle, 60 * 7);
        assert!(state.player.position().z > 60.0);
        assert!(state.events.iter().any(|e| matches!(
            e,
            GameEvent::ChallengeResolved {
                outcome: Outcome::Success,
                ..
            }
        )));
    }

    #[test]
    fn test_arming_frame_countdown_runs_in_slow_motion() {
        let mut state = RunState::new(only(SegmentKind::Obstacle), 5);
        let idle = TickInput::default();
        while !state.challenges.slot(ChallengeClass::Parkour).is_armed() {
            tick(&mut state, &idle, SIM_DT);
        }

        // Armed and counted down in the same frame, at the new scale
        let config = &state.tuning().challenge;
        let expected = SIM_DT * config.parkour_slow_motion / config.parkour_deadline;
        let slot = state.challenges.slot(ChallengeClass::Parkour);
        assert_eq!(slot.progress(), Some(expected));
    }

    #[test]
    fn test_unanswered_combat_kills_player() {
        let mut state = RunState::new(only(SegmentKind::Enemy), 8);
        run(&mut state, &TickInput::default(), 60 * 60);

        assert_eq!(state.phase, GamePhase::Dead);
        assert_eq!(state.death_cause, Some(DeathCause::Enemy));
        assert!(state
            .events
            .iter()
            .any(|e| matches!(e, GameEvent::PlayerDamaged { health: 0 })));
    }

    #[test]
    fn test_wrong_side_is_ignored_and_right_side_kills_enemy() {
        let mut state = RunState::new(only(SegmentKind::Enemy), 8);
        let idle = TickInput::default();
        while armed_token(&state).is_none() {
            tick(&mut state, &idle, SIM_DT);
        }
        let token = armed_token(&state).unwrap();
        let InputToken::Side(side) = token else {
            panic!("combat challenge must ask for a side");
        };

        let wrong = TickInput {
            pressed: vec![InputToken::Side(side.opposite())],
            ..Default::default()
        };
        tick(&mut state, &wrong, SIM_DT);
        assert!(state.challenges.slot(ChallengeClass::Combat).is_armed());

        let right = TickInput {
            pressed: vec![token],
            ..Default::default()
        };
        tick(&mut state, &right, SIM_DT);
        assert!(!state.challenges.slot(ChallengeClass::Combat).is_armed());

        run(&mut state, &idle, 60);
        assert_eq!(state.enemies_killed, 1);
        assert!(state
            .events
            .iter()
            .any(|e| matches!(e, GameEvent::EnemyKilled { side: s } if *s == side)));
    }

    #[test]
    fn test_pause_freezes_simulation() {
        let mut state = RunState::new(Tuning::default(), 1);
        let idle = TickInput::default();
        run(&mut state, &idle, 30);

        let toggle = TickInput {
            pause: true,
            ..Default::default()
        };
        tick(&mut state, &toggle, SIM_DT);
        assert_eq!(state.phase, GamePhase::Paused);
        assert_eq!(state.arbiter.current(), 0.0);

        let z = state.player.position().z;
        let score = state.score();
        run(&mut state, &idle, 120);
        assert_eq!(state.player.position().z, z);
        assert_eq!(state.score(), score);

        tick(&mut state, &toggle, SIM_DT);
        assert_eq!(state.phase, GamePhase::Running);
        assert!(state.player.position().z > z);
        assert!(state.events.contains(&GameEvent::Resumed));
    }

    #[test]
    fn test_dead_run_ignores_ticks() {
        let mut state = RunState::new(Tuning::default(), 1);
        state.die(DeathCause::Obstacle);
        let z = state.player.position().z;
        run(&mut state, &TickInput::default(), 10);
        assert_eq!(state.player.position().z, z);
        assert_eq!(state.time_ticks, 0);
    }

    #[test]
    fn test_corridor_only_run_streams_forever() {
        let mut state = RunState::new(only(SegmentKind::Corridor), 2);
        run(&mut state, &TickInput::default(), 60 * 30);
        assert_eq!(state.phase, GamePhase::Running);
        let streamer = state.streamer.as_ref().unwrap();
        assert!(streamer.next_spawn_z() > state.player.position().z);
        // Overflow waits for the unload delay, which can outlast one segment
        assert!(streamer.window().len() <= streamer.config().max_active + 2);
    }
}
