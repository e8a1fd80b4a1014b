//! Local persistence for best scores, leaderboard, achievements and settings.
//!
//! Values are JSON-encoded and kept under fixed keys of a [`KeyValue`]
//! backend. Reads never fail: missing or unreadable data falls back to the
//! documented defaults and is logged. Writes report errors so callers can
//! log them and carry on with in-memory state.

use log::warn;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::engine::{BoardSize, Score, Tile};
use crate::session::achievements::{Achievement, AchievementProgress, Achievements};
use crate::session::GameMode;
use crate::trace::now_unix_seconds;

mod backend;

pub use backend::{DisabledBackend, JsonFileBackend, KeyValue, MemoryBackend};

const BEST_SCORE_KEY: &str = "2048-best-score";
const BEST_BY_SIZE_KEY: &str = "2048-best-score-by-size";
const LEADERBOARD_KEY: &str = "2048-leaderboard";
const LEADERBOARD_NEXT_ID_KEY: &str = "2048-leaderboard-next-id";
const ACHIEVEMENTS_KEY: &str = "2048-achievements";
const SETTINGS_KEY: &str = "2048-settings";
const SOUND_ENABLED_KEY: &str = "2048-sound-enabled";
const VOLUME_KEY: &str = "2048-sound-volume";

/// Entries kept on the leaderboard.
pub const LEADERBOARD_CAPACITY: usize = 50;
pub const DEFAULT_VOLUME: f32 = 0.5;

#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("storage unavailable")]
    Unavailable,
}

/// Best score for each board size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BestBySize {
    #[serde(rename = "3")]
    pub three: Score,
    #[serde(rename = "4")]
    pub four: Score,
    #[serde(rename = "5")]
    pub five: Score,
    #[serde(rename = "6")]
    pub six: Score,
}

impl BestBySize {
    pub fn get(&self, size: BoardSize) -> Score {
        match size {
            BoardSize::Three => self.three,
            BoardSize::Four => self.four,
            BoardSize::Five => self.five,
            BoardSize::Six => self.six,
        }
    }

    pub fn set(&mut self, size: BoardSize, score: Score) {
        let slot = match size {
            BoardSize::Three => &mut self.three,
            BoardSize::Four => &mut self.four,
            BoardSize::Five => &mut self.five,
            BoardSize::Six => &mut self.six,
        };
        *slot = score;
    }
}

/// Finished-game summary submitted to the leaderboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub score: Score,
    pub max_tile: Tile,
    pub move_count: u32,
    pub board_size: BoardSize,
    pub mode: GameMode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub id: u64,
    pub score: Score,
    pub max_tile: Tile,
    pub move_count: u32,
    pub board_size: BoardSize,
    pub mode: GameMode,
    /// Unix seconds.
    pub timestamp: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub theme: String,
    pub sound_enabled: bool,
    pub animation_enabled: bool,
    pub board_size: BoardSize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: "classic".to_string(),
            sound_enabled: true,
            animation_enabled: true,
            board_size: BoardSize::Four,
        }
    }
}

/// Partial settings update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsPatch {
    pub theme: Option<String>,
    pub sound_enabled: Option<bool>,
    pub animation_enabled: Option<bool>,
    pub board_size: Option<BoardSize>,
}

impl SettingsPatch {
    fn apply(self, settings: &mut Settings) {
        if let Some(theme) = self.theme {
            settings.theme = theme;
        }
        if let Some(enabled) = self.sound_enabled {
            settings.sound_enabled = enabled;
        }
        if let Some(enabled) = self.animation_enabled {
            settings.animation_enabled = enabled;
        }
        if let Some(size) = self.board_size {
            settings.board_size = size;
        }
    }
}

/// Typed persistence facade over a [`KeyValue`] backend.
pub struct Storage {
    backend: Box<dyn KeyValue>,
}

impl Storage {
    pub fn new<B: KeyValue + 'static>(backend: B) -> Self {
        Self { backend: Box::new(backend) }
    }

    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::new())
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.backend.get(key) {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!("discarding unreadable {key}: {e}");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!("could not read {key}: {e}");
                None
            }
        }
    }

    fn write<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value)?;
        self.backend.set(key, raw)
    }

    pub fn best_score(&self) -> Score {
        self.read(BEST_SCORE_KEY).unwrap_or(0)
    }

    pub fn save_best_score(&mut self, score: Score) -> Result<(), StorageError> {
        self.write(BEST_SCORE_KEY, &score)
    }

    pub fn best_scores_by_size(&self) -> BestBySize {
        self.read(BEST_BY_SIZE_KEY).unwrap_or_default()
    }

    pub fn best_score_by_size(&self, size: BoardSize) -> Score {
        self.best_scores_by_size().get(size)
    }

    pub fn save_best_score_by_size(&mut self, size: BoardSize, score: Score) -> Result<(), StorageError> {
        let mut all = self.best_scores_by_size();
        all.set(size, score);
        self.write(BEST_BY_SIZE_KEY, &all)
    }

    /// Score-descending, at most [`LEADERBOARD_CAPACITY`] entries.
    pub fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        self.read(LEADERBOARD_KEY).unwrap_or_default()
    }

    /// Append a finished game. Assigns id and timestamp, re-sorts and
    /// truncates. Equal scores keep their insertion order. Ids are never
    /// reused, even after an entry is truncated away.
    pub fn add_leaderboard_entry(&mut self, record: ScoreRecord) -> Result<LeaderboardEntry, StorageError> {
        let mut board = self.leaderboard();
        let stored_next = board.iter().map(|e| e.id).max().map_or(1, |max| max + 1);
        let id = self.read(LEADERBOARD_NEXT_ID_KEY).unwrap_or(1).max(stored_next);
        let entry = LeaderboardEntry {
            id,
            score: record.score,
            max_tile: record.max_tile,
            move_count: record.move_count,
            board_size: record.board_size,
            mode: record.mode,
            timestamp: now_unix_seconds(),
        };
        board.push(entry.clone());
        board.sort_by(|a, b| b.score.cmp(&a.score));
        board.truncate(LEADERBOARD_CAPACITY);
        self.write(LEADERBOARD_KEY, &board)?;
        self.write(LEADERBOARD_NEXT_ID_KEY, &(id + 1))?;
        Ok(entry)
    }

    /// Catalog joined with saved progress.
    pub fn achievements(&self) -> Achievements {
        let saved: Vec<AchievementProgress> = self.read(ACHIEVEMENTS_KEY).unwrap_or_default();
        Achievements::from_saved(&saved)
    }

    pub fn save_achievements(&mut self, achievements: &Achievements) -> Result<(), StorageError> {
        self.write(ACHIEVEMENTS_KEY, &achievements.progress())
    }

    /// Convenience listing for display.
    pub fn achievement_list(&self) -> Vec<Achievement> {
        self.achievements().iter().cloned().collect()
    }

    pub fn settings(&self) -> Settings {
        self.read(SETTINGS_KEY).unwrap_or_default()
    }

    /// Shallow-merge `patch` into the saved settings and return the result.
    pub fn save_settings(&mut self, patch: SettingsPatch) -> Result<Settings, StorageError> {
        let mut settings = self.settings();
        patch.apply(&mut settings);
        self.write(SETTINGS_KEY, &settings)?;
        Ok(settings)
    }

    pub fn sound_enabled(&self) -> bool {
        self.read(SOUND_ENABLED_KEY).unwrap_or(true)
    }

    pub fn save_sound_enabled(&mut self, enabled: bool) -> Result<(), StorageError> {
        self.write(SOUND_ENABLED_KEY, &enabled)
    }

    pub fn volume(&self) -> f32 {
        self.read::<f32>(VOLUME_KEY)
            .filter(|v| v.is_finite())
            .map_or(DEFAULT_VOLUME, |v| v.clamp(0.0, 1.0))
    }

    pub fn save_volume(&mut self, volume: f32) -> Result<(), StorageError> {
        self.write(VOLUME_KEY, &volume.clamp(0.0, 1.0))
    }
}

impl Default for Storage {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(score: Score) -> ScoreRecord {
        ScoreRecord { score, max_tile: 128, move_count: 10, board_size: BoardSize::Four, mode: GameMode::Classic }
    }

    #[test]
    fn defaults_when_empty() {
        let s = Storage::in_memory();
        assert_eq!(s.best_score(), 0);
        assert_eq!(s.best_score_by_size(BoardSize::Five), 0);
        assert!(s.leaderboard().is_empty());
        assert_eq!(s.settings(), Settings::default());
        assert_eq!(s.volume(), DEFAULT_VOLUME);
        assert_eq!(s.achievements(), Achievements::new());
    }

    #[test]
    fn best_scores_round_trip() {
        let mut s = Storage::in_memory();
        s.save_best_score(1234).unwrap();
        s.save_best_score_by_size(BoardSize::Three, 300).unwrap();
        s.save_best_score_by_size(BoardSize::Six, 9000).unwrap();
        assert_eq!(s.best_score(), 1234);
        assert_eq!(s.best_score_by_size(BoardSize::Three), 300);
        assert_eq!(s.best_score_by_size(BoardSize::Four), 0);
        assert_eq!(s.best_score_by_size(BoardSize::Six), 9000);
    }

    #[test]
    fn corrupt_values_fall_back_to_defaults() {
        let mut backend = MemoryBackend::new();
        backend.set(BEST_SCORE_KEY, "\"lots\"".into()).unwrap();
        backend.set(SETTINGS_KEY, "{\"theme\": \"dark\"}".into()).unwrap();
        backend.set(LEADERBOARD_KEY, "[oops".into()).unwrap();
        let s = Storage::new(backend);
        assert_eq!(s.best_score(), 0);
        assert!(s.leaderboard().is_empty());
        // Partial settings merge over defaults.
        let settings = s.settings();
        assert_eq!(settings.theme, "dark");
        assert!(settings.sound_enabled);
        assert_eq!(settings.board_size, BoardSize::Four);
    }

    #[test]
    fn leaderboard_sorts_and_truncates() {
        let mut s = Storage::in_memory();
        for score in 0..60 {
            s.add_leaderboard_entry(record(score * 10)).unwrap();
        }
        let board = s.leaderboard();
        assert_eq!(board.len(), LEADERBOARD_CAPACITY);
        assert_eq!(board[0].score, 590);
        assert!(board.windows(2).all(|w| w[0].score >= w[1].score));
        assert_eq!(board.last().unwrap().score, 100);
    }

    #[test]
    fn leaderboard_assigns_increasing_ids() {
        let mut s = Storage::in_memory();
        let a = s.add_leaderboard_entry(record(10)).unwrap();
        let b = s.add_leaderboard_entry(record(5)).unwrap();
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert!(b.timestamp >= a.timestamp);
    }

    #[test]
    fn evicted_ids_are_not_reused() {
        let mut s = Storage::in_memory();
        for _ in 0..LEADERBOARD_CAPACITY {
            s.add_leaderboard_entry(record(100)).unwrap();
        }
        let dropped = s.add_leaderboard_entry(record(1)).unwrap();
        assert_eq!(dropped.id, 51);
        assert!(s.leaderboard().iter().all(|e| e.id != 51));
        let next = s.add_leaderboard_entry(record(1)).unwrap();
        assert_eq!(next.id, 52);
    }

    #[test]
    fn settings_patch_is_shallow_merge() {
        let mut s = Storage::in_memory();
        s.save_settings(SettingsPatch { theme: Some("forest".into()), ..Default::default() }).unwrap();
        let merged = s
            .save_settings(SettingsPatch { board_size: Some(BoardSize::Six), ..Default::default() })
            .unwrap();
        assert_eq!(merged.theme, "forest");
        assert_eq!(merged.board_size, BoardSize::Six);
        assert_eq!(s.settings(), merged);
    }

    #[test]
    fn achievements_persist_progress_only() {
        let mut s = Storage::in_memory();
        let mut a = s.achievements();
        a.record_tile(512, 7);
        s.save_achievements(&a).unwrap();
        let loaded = s.achievements();
        assert!(loaded.get(crate::session::achievements::TILE_512).unwrap().unlocked);
        assert_eq!(s.achievement_list().len(), crate::session::achievements::CATALOG.len());
    }

    #[test]
    fn disabled_backend_degrades_to_defaults() {
        let mut s = Storage::new(DisabledBackend);
        assert_eq!(s.best_score(), 0);
        assert!(s.save_best_score(10).is_err());
        assert!(s.add_leaderboard_entry(record(1)).is_err());
        assert_eq!(s.settings(), Settings::default());
    }

    #[test]
    fn volume_is_clamped() {
        let mut s = Storage::in_memory();
        assert!(s.sound_enabled());
        s.save_sound_enabled(false).unwrap();
        assert!(!s.sound_enabled());
        s.save_volume(3.0).unwrap();
        assert_eq!(s.volume(), 1.0);
        s.save_volume(0.25).unwrap();
        assert_eq!(s.volume(), 0.25);
    }
}
