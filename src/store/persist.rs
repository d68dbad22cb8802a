//! Playback preferences that survive a restart.
//!
//! Only volume, shuffle and repeat mode are kept; the queue itself is rebuilt
//! from the track source on every launch.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::default_state_dir;

use super::queue::QueueStore;
use super::types::RepeatMode;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to encode playback state: {0}")]
    Encode(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedPlayback {
    pub volume: f32,
    pub shuffle: bool,
    pub repeat: RepeatMode,
}

impl Default for PersistedPlayback {
    fn default() -> Self {
        Self {
            volume: 1.0,
            shuffle: false,
            repeat: RepeatMode::None,
        }
    }
}

/// `$ENCORE_STATE_PATH`, else `state.toml` in the default state directory.
pub fn state_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os("ENCORE_STATE_PATH") {
        return Some(PathBuf::from(p));
    }
    default_state_dir().map(|d| d.join("state.toml"))
}

impl PersistedPlayback {
    pub fn from_store(store: &QueueStore) -> Self {
        Self {
            volume: store.volume(),
            shuffle: store.is_shuffle(),
            repeat: store.repeat_mode(),
        }
    }

    pub fn apply(&self, store: &mut QueueStore) {
        store.set_volume(self.volume);
        store.set_shuffle(self.shuffle);
        store.set_repeat_mode(self.repeat);
    }

    /// Read saved state. A missing file is not an error.
    pub fn load(path: &Path) -> Result<Option<Self>, PersistError> {
        let text = match fs::read_to_string(path) {
            Ok(t) => t,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(PersistError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        toml::from_str(&text)
            .map(Some)
            .map_err(|source| PersistError::Parse {
                path: path.to_path_buf(),
                source,
            })
    }

    pub fn save(&self, path: &Path) -> Result<(), PersistError> {
        let text = toml::to_string(self)?;
        let io_err = |source| PersistError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        // Readers only ever see a complete file.
        let tmp = path.with_extension("toml.tmp");
        fs::write(&tmp, text).map_err(io_err)?;
        fs::rename(&tmp, path).map_err(io_err)?;
        Ok(())
    }
}
