//! Achievement catalog and progress tracking.
//!
//! The catalog is a static table. Only progress/unlock fields are ever
//! persisted; on load they are joined onto the catalog by id, so unknown ids
//! in saved data are dropped and missing ones start from zero.

use serde::{Deserialize, Serialize};

use crate::engine::{BoardSize, Tile};

pub const TILE_512: &str = "tile-512";
pub const TILE_1024: &str = "tile-1024";
pub const TILE_2048: &str = "tile-2048";
pub const TILE_4096: &str = "tile-4096";
pub const MERGE_100: &str = "merge-100";
pub const MERGE_1000: &str = "merge-1000";
pub const PLAY_3X3: &str = "play-3x3";
pub const PLAY_5X5: &str = "play-5x5";
pub const PLAY_6X6: &str = "play-6x6";
pub const NO_UNDO_WIN: &str = "no-undo-win";

/// Static description of an achievement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogEntry {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub max_progress: u32,
}

pub const CATALOG: &[CatalogEntry] = &[
    CatalogEntry { id: TILE_512, name: "Getting There", description: "Create a 512 tile", max_progress: 1 },
    CatalogEntry { id: TILE_1024, name: "Halfway Home", description: "Create a 1024 tile", max_progress: 1 },
    CatalogEntry { id: TILE_2048, name: "2048!", description: "Create a 2048 tile", max_progress: 1 },
    CatalogEntry { id: TILE_4096, name: "Beyond", description: "Create a 4096 tile", max_progress: 1 },
    CatalogEntry { id: MERGE_100, name: "Merger", description: "Merge 100 tiles", max_progress: 100 },
    CatalogEntry { id: MERGE_1000, name: "Merge Master", description: "Merge 1000 tiles", max_progress: 1000 },
    CatalogEntry { id: PLAY_3X3, name: "Tight Quarters", description: "Play 10 games on 3x3", max_progress: 10 },
    CatalogEntry { id: PLAY_5X5, name: "Wide Open", description: "Play 10 games on 5x5", max_progress: 10 },
    CatalogEntry { id: PLAY_6X6, name: "Marathon Board", description: "Play 10 games on 6x6", max_progress: 10 },
    CatalogEntry { id: NO_UNDO_WIN, name: "No Regrets", description: "Win without using undo", max_progress: 1 },
];

const TILE_THRESHOLDS: [(Tile, &str); 4] =
    [(512, TILE_512), (1024, TILE_1024), (2048, TILE_2048), (4096, TILE_4096)];

const MERGE_COUNTERS: [&str; 2] = [MERGE_100, MERGE_1000];

/// Persisted subset of an achievement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementProgress {
    pub id: String,
    #[serde(default)]
    pub progress: u32,
    #[serde(default)]
    pub unlocked: bool,
    #[serde(default)]
    pub unlocked_at: Option<u64>,
}

/// Catalog entry joined with its progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Achievement {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub progress: u32,
    pub max_progress: u32,
    pub unlocked: bool,
    /// Unix seconds.
    pub unlocked_at: Option<u64>,
}

impl Achievement {
    fn from_entry(entry: &CatalogEntry) -> Self {
        Self {
            id: entry.id,
            name: entry.name,
            description: entry.description,
            progress: 0,
            max_progress: entry.max_progress,
            unlocked: false,
            unlocked_at: None,
        }
    }

    /// Raise progress to at least `value`. Returns true if this unlocked it.
    fn reach(&mut self, value: u32, now: u64) -> bool {
        if self.unlocked || value <= self.progress {
            return false;
        }
        self.progress = value.min(self.max_progress);
        if self.progress >= self.max_progress {
            self.unlocked = true;
            self.unlocked_at = Some(now);
            return true;
        }
        false
    }

    fn to_progress(&self) -> AchievementProgress {
        AchievementProgress {
            id: self.id.to_string(),
            progress: self.progress,
            unlocked: self.unlocked,
            unlocked_at: self.unlocked_at,
        }
    }
}

/// Achievement set for a player, in catalog order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Achievements {
    items: Vec<Achievement>,
    dirty: bool,
}

impl Achievements {
    pub fn new() -> Self {
        Self { items: CATALOG.iter().map(Achievement::from_entry).collect(), dirty: false }
    }

    /// Join saved progress onto the catalog.
    pub fn from_saved(saved: &[AchievementProgress]) -> Self {
        let mut set = Self::new();
        for item in &mut set.items {
            if let Some(p) = saved.iter().find(|p| p.id == item.id) {
                item.progress = p.progress.min(item.max_progress);
                item.unlocked = p.unlocked;
                item.unlocked_at = if p.unlocked { p.unlocked_at } else { None };
            }
        }
        set
    }

    pub fn get(&self, id: &str) -> Option<&Achievement> {
        self.items.iter().find(|a| a.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Achievement> {
        self.items.iter()
    }

    pub fn unlocked_count(&self) -> usize {
        self.items.iter().filter(|a| a.unlocked).count()
    }

    /// Persistable view of every achievement.
    pub fn progress(&self) -> Vec<AchievementProgress> {
        self.items.iter().map(Achievement::to_progress).collect()
    }

    /// True if anything changed since the last call.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    fn reach(&mut self, id: &str, value: u32, now: u64, unlocked: &mut Vec<&'static str>) {
        if let Some(item) = self.items.iter_mut().find(|a| a.id == id) {
            let before = item.progress;
            if item.reach(value, now) {
                unlocked.push(item.id);
            }
            if item.progress != before {
                self.dirty = true;
            }
        }
    }

    fn advance(&mut self, id: &str, by: u32, now: u64, unlocked: &mut Vec<&'static str>) {
        let current = self.get(id).map_or(0, |a| a.progress);
        self.reach(id, current.saturating_add(by), now, unlocked);
    }

    /// Tile-value milestones.
    pub fn record_tile(&mut self, max_tile: Tile, now: u64) -> Vec<&'static str> {
        let mut unlocked = Vec::new();
        for (threshold, id) in TILE_THRESHOLDS {
            if max_tile >= threshold {
                self.reach(id, 1, now, &mut unlocked);
            }
        }
        unlocked
    }

    /// Cumulative merge counters.
    pub fn record_merges(&mut self, merges: u32, now: u64) -> Vec<&'static str> {
        let mut unlocked = Vec::new();
        if merges > 0 {
            for id in MERGE_COUNTERS {
                self.advance(id, merges, now, &mut unlocked);
            }
        }
        unlocked
    }

    /// One game started on `size`. 4x4 has no counter.
    pub fn record_play(&mut self, size: BoardSize, now: u64) -> Vec<&'static str> {
        let mut unlocked = Vec::new();
        let id = match size {
            BoardSize::Three => Some(PLAY_3X3),
            BoardSize::Four => None,
            BoardSize::Five => Some(PLAY_5X5),
            BoardSize::Six => Some(PLAY_6X6),
        };
        if let Some(id) = id {
            self.advance(id, 1, now, &mut unlocked);
        }
        unlocked
    }

    /// A win was reached after `undo_count` undos.
    pub fn record_win(&mut self, undo_count: u32, now: u64) -> Vec<&'static str> {
        let mut unlocked = Vec::new();
        if undo_count == 0 {
            self.reach(NO_UNDO_WIN, 1, now, &mut unlocked);
        }
        unlocked
    }
}

impl Default for Achievements {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_thresholds_unlock_once() {
        let mut a = Achievements::new();
        assert_eq!(a.record_tile(256, 1), Vec::<&str>::new());
        assert!(!a.take_dirty());
        assert_eq!(a.record_tile(1024, 2), vec![TILE_512, TILE_1024]);
        assert!(a.take_dirty());
        assert_eq!(a.record_tile(1024, 3), Vec::<&str>::new());
        assert!(!a.take_dirty());
        assert_eq!(a.get(TILE_512).unwrap().unlocked_at, Some(2));
    }

    #[test]
    fn merge_counters_accumulate_and_clamp() {
        let mut a = Achievements::new();
        assert!(a.record_merges(60, 1).is_empty());
        assert_eq!(a.record_merges(60, 2), vec![MERGE_100]);
        let m100 = a.get(MERGE_100).unwrap();
        assert_eq!(m100.progress, 100);
        assert!(m100.unlocked);
        assert_eq!(a.get(MERGE_1000).unwrap().progress, 120);
        // Unlocked achievements never progress again.
        a.record_merges(5, 3);
        assert_eq!(a.get(MERGE_100).unwrap().progress, 100);
        assert_eq!(a.get(MERGE_100).unwrap().unlocked_at, Some(2));
    }

    #[test]
    fn play_counters_by_size() {
        let mut a = Achievements::new();
        a.record_play(BoardSize::Three, 1);
        a.record_play(BoardSize::Four, 1);
        a.record_play(BoardSize::Six, 1);
        assert_eq!(a.get(PLAY_3X3).unwrap().progress, 1);
        assert_eq!(a.get(PLAY_5X5).unwrap().progress, 0);
        assert_eq!(a.get(PLAY_6X6).unwrap().progress, 1);
    }

    #[test]
    fn no_undo_win_requires_zero_undos() {
        let mut a = Achievements::new();
        assert!(a.record_win(1, 1).is_empty());
        assert_eq!(a.record_win(0, 2), vec![NO_UNDO_WIN]);
    }

    #[test]
    fn saved_progress_joins_catalog() {
        let saved = vec![
            AchievementProgress { id: MERGE_100.into(), progress: 500, unlocked: false, unlocked_at: None },
            AchievementProgress { id: TILE_2048.into(), progress: 1, unlocked: true, unlocked_at: Some(42) },
            AchievementProgress { id: "retired-id".into(), progress: 3, unlocked: true, unlocked_at: None },
        ];
        let a = Achievements::from_saved(&saved);
        assert_eq!(a.iter().count(), CATALOG.len());
        assert_eq!(a.get(MERGE_100).unwrap().progress, 100);
        assert_eq!(a.get(TILE_2048).unwrap().unlocked_at, Some(42));
        assert!(a.get("retired-id").is_none());
        assert_eq!(a.unlocked_count(), 1);
        let round = Achievements::from_saved(&a.progress());
        assert_eq!(round.progress(), a.progress());
    }
}
