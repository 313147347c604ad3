//! Platform abstraction layer
//!
//! Handles native differences for:
//! - Input events (edge-triggered tokens per frame)
//! - Storage location for persisted documents

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use crate::persistence::{self, PersistError};
use crate::sim::InputToken;

/// Application directory name under the platform data dir
pub const APP_DIR: &str = "corridor-runner";

/// Per-frame input as seen by the simulation
pub trait InputSource {
    /// Tokens that went down this frame, in press order
    fn pressed(&self) -> &[InputToken];

    /// Move to the next frame
    fn next_frame(&mut self);
}

/// Replays a fixed list of per-frame presses (headless runs and tests)
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    frames: VecDeque<Vec<InputToken>>,
    current: Vec<InputToken>,
}

impl ScriptedInput {
    pub fn new(frames: impl IntoIterator<Item = Vec<InputToken>>) -> Self {
        let mut frames: VecDeque<Vec<InputToken>> = frames.into_iter().collect();
        let current = frames.pop_front().unwrap_or_default();
        Self { frames, current }
    }

    /// Read a script saved as a JSON list of per-frame token lists.
    /// A missing file replays nothing.
    pub fn load(path: &Path) -> Result<Self, PersistError> {
        let frames: Vec<Vec<InputToken>> = persistence::read_json(path)?.unwrap_or_default();
        log::info!("Loaded {} scripted frames from {}", frames.len(), path.display());
        Ok(Self::new(frames))
    }
}

impl InputSource for ScriptedInput {
    fn pressed(&self) -> &[InputToken] {
        &self.current
    }

    fn next_frame(&mut self) {
        self.current = self.frames.pop_front().unwrap_or_default();
    }
}

/// Platform data directory for this application
pub fn data_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join(APP_DIR))
}
