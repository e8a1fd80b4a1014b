use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::advisor::HeuristicWeights;
use crate::engine::BoardSize;
use crate::session::GameMode;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Application settings loaded from TOML. Every section and key is
/// optional; command-line flags override what is read here.
///
/// ```toml
/// [game]
/// size = 5
/// mode = "endless"
/// seed = 42
///
/// [advisor]
/// empty = 120.0
///
/// [storage]
/// path = "scores.json"
/// ```
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub game: Game,
    #[serde(default)]
    pub advisor: HeuristicWeights,
    #[serde(default)]
    pub storage: StorageSection,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct Game {
    /// Falls back to the last size played.
    #[serde(default)]
    pub size: Option<BoardSize>,
    #[serde(default)]
    pub mode: GameMode,
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct StorageSection {
    /// `None` keeps everything in memory.
    #[serde(default = "defaults::storage_path")]
    pub path: Option<PathBuf>,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self { path: defaults::storage_path() }
    }
}

impl AppConfig {
    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }
}

mod defaults {
    use std::path::PathBuf;

    pub fn storage_path() -> Option<PathBuf> {
        Some(PathBuf::from("game-2048.json"))
    }
}
