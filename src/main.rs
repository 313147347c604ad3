//! Corridor Runner entry point
//!
//! Runs a headless demo session: the autopilot plays a seeded run on the
//! fixed-timestep loop, the HUD model follows the event stream, and the
//! score is submitted to the persisted high score at the end.

use std::path::{Path, PathBuf};

use clap::Parser;
use corridor_runner::consts::{MAX_SUBSTEPS, SIM_DT};
use corridor_runner::platform::{self, InputSource, ScriptedInput};
use corridor_runner::sim::{GamePhase, RunState, TickInput, tick};
use corridor_runner::ui::Hud;
use corridor_runner::{HighScoreStore, Settings, Tuning};

/// Simulated display refresh for the headless loop
const FRAME_DT: f32 = 1.0 / 30.0;

#[derive(Debug, Parser)]
#[command(name = "corridor-runner", about = "Headless corridor runner session")]
struct Cli {
    /// Tuning file (JSON); built-in defaults when omitted
    tuning: Option<PathBuf>,

    /// Run seed
    #[arg(long, default_value_t = 0x5EED)]
    seed: u64,

    /// Wall-clock seconds to simulate
    #[arg(long, default_value_t = 90.0)]
    seconds: f32,

    /// Per-substep presses to replay (JSON list of token lists)
    #[arg(long)]
    script: Option<PathBuf>,

    /// Only play the scripted presses
    #[arg(long)]
    no_autopilot: bool,
}

fn load_tuning(path: Option<&Path>) -> Tuning {
    let Some(path) = path else {
        return Tuning::default();
    };
    match Tuning::load(path) {
        Ok(tuning) => tuning,
        Err(e) => {
            log::error!("Invalid tuning, using defaults: {}", e);
            Tuning::default()
        }
    }
}

fn load_script(path: Option<&Path>) -> ScriptedInput {
    let Some(path) = path else {
        return ScriptedInput::default();
    };
    match ScriptedInput::load(path) {
        Ok(script) => script,
        Err(e) => {
            log::error!("Input script unavailable, running without it: {}", e);
            ScriptedInput::default()
        }
    }
}

fn open_high_scores() -> Option<HighScoreStore> {
    let Some(path) = HighScoreStore::default_path() else {
        log::warn!("No data directory; high score will not be saved");
        return None;
    };
    match HighScoreStore::open(path) {
        Ok(store) => Some(store),
        Err(e) => {
            log::error!("High score unavailable: {}", e);
            None
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Corridor Runner (headless) starting...");

    let cli = Cli::parse();
    let tuning = load_tuning(cli.tuning.as_deref());
    let mut store = open_high_scores();
    let settings = platform::data_dir()
        .map(|dir| Settings::load(&dir.join("settings.json")))
        .unwrap_or_default();
    log::info!(
        "Volume: music {}/10, sfx {}/10",
        settings.music_volume,
        settings.sfx_volume
    );

    let mut state = RunState::new(tuning, cli.seed);
    let mut hud = Hud::new(store.as_ref().map_or(0.0, HighScoreStore::high_score));
    let mut source = load_script(cli.script.as_deref());
    let mut input = TickInput {
        autopilot: !cli.no_autopilot,
        ..Default::default()
    };

    let mut accumulator = 0.0f32;
    let mut wall_clock = 0.0f32;
    while wall_clock < cli.seconds && state.phase != GamePhase::Dead {
        wall_clock += FRAME_DT;
        accumulator += FRAME_DT.min(0.1);

        let mut substeps = 0;
        while accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            input.pressed = source.pressed().to_vec();
            tick(&mut state, &input, SIM_DT);
            hud.follow(&mut state, SIM_DT);
            accumulator -= SIM_DT;
            substeps += 1;

            // Clear one-shot inputs after processing
            input.pause = false;
            source.next_frame();
        }
        hud.set_score(state.score());
    }

    log::info!(
        "Run over after {:.1}s: score {:.0}, {}, {} enemies down",
        state.difficulty.elapsed(),
        state.score(),
        hud.difficulty_label(),
        hud.enemies_killed
    );

    if let Some(store) = store.as_mut() {
        match state.finish_run(store) {
            Ok(true) => log::info!("New high score!"),
            Ok(false) => log::info!("High score stands at {:.0}", store.high_score()),
            Err(e) => log::error!("Failed to save high score: {}", e),
        }
    }
    state.teardown();
}
