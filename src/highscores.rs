//! Best survival score
//!
//! Persisted as a small JSON document in the application data directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::persistence::{PersistError, read_json, write_json_atomic};

/// On-disk high score document
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct HighScoreRecord {
    #[serde(rename = "playerHighScore")]
    pub player_high_score: f32,
}

/// High score backed by a JSON file
#[derive(Debug, Clone)]
pub struct HighScoreStore {
    path: PathBuf,
    record: HighScoreRecord,
}

impl HighScoreStore {
    /// `<data dir>/corridor-runner/HighScore/playerHighScore.json`
    pub fn default_path() -> Option<PathBuf> {
        crate::platform::data_dir().map(|dir| dir.join("HighScore").join("playerHighScore.json"))
    }

    /// Load the stored high score, creating the file with 0 on first run
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, PersistError> {
        let path = path.into();
        let record = match read_json::<HighScoreRecord>(&path)? {
            Some(record) => {
                log::info!("Loaded high score {:.0}", record.player_high_score);
                record
            }
            None => {
                let record = HighScoreRecord::default();
                write_json_atomic(&path, &record)?;
                log::info!("Initialized high score file at {}", path.display());
                record
            }
        };
        Ok(Self { path, record })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn high_score(&self) -> f32 {
        self.record.player_high_score
    }

    /// Store `score` if it beats the current best; returns whether it did
    pub fn submit(&mut self, score: f32) -> Result<bool, PersistError> {
        if score <= self.record.player_high_score {
            return Ok(false);
        }
        let record = HighScoreRecord {
            player_high_score: score,
        };
        write_json_atomic(&self.path, &record)?;
        self.record = record;
        log::info!("New high score {:.0}", score);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_open_creates_zero_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("HighScore").join("playerHighScore.json");

        let store = HighScoreStore::open(&path).unwrap();
        assert_eq!(store.high_score(), 0.0);
        assert!(path.exists());

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"playerHighScore\""));
    }

    #[test]
    fn test_high_score_only_increases() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("playerHighScore.json");

        let mut store = HighScoreStore::open(&path).unwrap();
        assert!(store.submit(150.0).unwrap());
        assert!(!store.submit(90.0).unwrap());
        assert!(!store.submit(150.0).unwrap());
        assert_eq!(store.high_score(), 150.0);

        let reopened = HighScoreStore::open(&path).unwrap();
        assert_eq!(reopened.high_score(), 150.0);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("playerHighScore.json");
        std::fs::write(&path, "garbage").unwrap();
        assert!(matches!(
            HighScoreStore::open(&path),
            Err(PersistError::Parse { .. })
        ));
    }
}
