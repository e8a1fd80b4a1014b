use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::engine::{BoardSize, Tile};

/// Game mode chosen when a session starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    #[default]
    Classic,
    /// Play past the target; never re-enters the win state.
    Endless,
    Time,
    Step,
    Challenge,
}

impl GameMode {
    pub const ALL: [GameMode; 5] =
        [GameMode::Classic, GameMode::Endless, GameMode::Time, GameMode::Step, GameMode::Challenge];

    pub fn as_str(self) -> &'static str {
        match self {
            GameMode::Classic => "classic",
            GameMode::Endless => "endless",
            GameMode::Time => "time",
            GameMode::Step => "step",
            GameMode::Challenge => "challenge",
        }
    }

    /// Compact byte tag used by the trace format.
    pub(crate) fn tag(self) -> u8 {
        match self {
            GameMode::Classic => 0,
            GameMode::Endless => 1,
            GameMode::Time => 2,
            GameMode::Step => 3,
            GameMode::Challenge => 4,
        }
    }

    pub(crate) fn from_tag(tag: u8) -> Option<GameMode> {
        GameMode::ALL.get(tag as usize).copied()
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown game mode {0:?}")]
pub struct UnknownMode(pub String);

impl FromStr for GameMode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GameMode::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownMode(s.to_string()))
    }
}

/// Per-session rules. Everything except `mode` is fixed once the game starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameConfig {
    size: BoardSize,
    target_score: Tile,
    initial_tiles: usize,
    pub(crate) mode: GameMode,
}

impl GameConfig {
    pub fn new(size: BoardSize, mode: GameMode) -> Self {
        Self { size, target_score: size.target_score(), initial_tiles: size.initial_tiles(), mode }
    }

    #[inline]
    pub fn size(&self) -> BoardSize {
        self.size
    }

    #[inline]
    pub fn target_score(&self) -> Tile {
        self.target_score
    }

    #[inline]
    pub fn initial_tiles(&self) -> usize {
        self.initial_tiles
    }

    #[inline]
    pub fn mode(&self) -> GameMode {
        self.mode
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new(BoardSize::Four, GameMode::Classic)
    }
}
