//! JSON persistence of the whole engine state, one file per key.

use crate::game::Game;
use crate::roster::Roster;
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const ROSTER_FILE: &str = "roster.json";
pub const HISTORY_FILE: &str = "game-history.json";
pub const ACTIVE_FILE: &str = "active-game.json";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("{}: malformed JSON: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Everything the engine needs to resume where it left off.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub roster: Roster,
    pub history: Vec<Game>,
    pub active: Option<Game>,
}

#[derive(Debug, Clone)]
pub struct Store {
    dir: PathBuf,
}

impl Store {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Load every key. Missing files give the empty default; unreadable ones
    /// are logged and treated as missing.
    pub fn load(&self) -> Snapshot {
        Snapshot {
            roster: self.read_or_default(ROSTER_FILE),
            history: self.read_or_default(HISTORY_FILE),
            active: self.read_or_default(ACTIVE_FILE),
        }
    }

    /// The last saved roster, or `None` if nothing was ever saved.
    pub fn load_roster(&self) -> Result<Option<Roster>, StoreError> {
        self.read(ROSTER_FILE)
    }

    pub fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).map_err(|source| StoreError::Io {
            path: self.dir.clone(),
            source,
        })?;
        self.write(ROSTER_FILE, &snapshot.roster)?;
        self.write(HISTORY_FILE, &snapshot.history)?;
        self.write(ACTIVE_FILE, &snapshot.active)?;
        debug!(
            "saved {} players, {} games to {}",
            snapshot.roster.len(),
            snapshot.history.len(),
            self.dir.display()
        );
        Ok(())
    }

    fn read_or_default<T: DeserializeOwned + Default>(&self, name: &str) -> T {
        match self.read(name) {
            Ok(value) => value.unwrap_or_default(),
            Err(err) => {
                warn!("ignoring stored {name}: {err}");
                T::default()
            }
        }
    }

    fn read<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, StoreError> {
        let path = self.dir.join(name);
        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        serde_json::from_str(&json)
            .map(Some)
            .map_err(|source| StoreError::Json { path, source })
    }

    /// Write to a temp file, then rename over the target.
    fn write<T: Serialize>(&self, name: &str, value: &T) -> Result<(), StoreError> {
        let path = self.dir.join(name);
        let temp_path = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(value).map_err(|source| StoreError::Json {
            path: path.clone(),
            source,
        })?;
        fs::write(&temp_path, json).map_err(|source| StoreError::Io {
            path: temp_path.clone(),
            source,
        })?;
        fs::rename(&temp_path, &path).map_err(|source| StoreError::Io { path, source })
    }
}
