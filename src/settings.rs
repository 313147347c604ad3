//! Player preferences
//!
//! Persisted separately from the high score.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::persistence::{PersistError, read_json, write_json_atomic};

/// Volume sliders run from 0 (muted) to this value
pub const MAX_VOLUME: u8 = 10;

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Music volume (0 - 10)
    pub music_volume: u8,
    /// Sound effects volume (0 - 10)
    pub sfx_volume: u8,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            music_volume: 5,
            sfx_volume: 5,
        }
    }
}

impl Settings {
    /// Pull out-of-range sliders back into 0..=MAX_VOLUME
    pub fn clamped(self) -> Self {
        Self {
            music_volume: self.music_volume.min(MAX_VOLUME),
            sfx_volume: self.sfx_volume.min(MAX_VOLUME),
        }
    }

    /// Slider value as a gain in [0, 1]
    pub fn gain(volume: u8) -> f32 {
        f32::from(volume.min(MAX_VOLUME)) / f32::from(MAX_VOLUME)
    }

    /// Load settings, falling back to defaults if missing or unreadable
    pub fn load(path: &Path) -> Self {
        match read_json::<Settings>(path) {
            Ok(Some(settings)) => {
                log::info!("Loaded settings from {}", path.display());
                settings.clamped()
            }
            Ok(None) => {
                log::info!("Using default settings");
                Self::default()
            }
            Err(e) => {
                log::warn!("Ignoring unreadable settings: {}", e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), PersistError> {
        write_json_atomic(path, self)?;
        log::info!("Settings saved");
        Ok(())
    }
}
