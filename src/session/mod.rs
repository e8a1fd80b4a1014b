//! The game session: board, score, undo history, win/lose state and the
//! side effects (persistence, sounds, achievements) of every move.
//!
//! # Quick start
//! ```
//! use game_2048::audio::NullAudio;
//! use game_2048::engine::{BoardSize, Move};
//! use game_2048::session::{GameMode, GameSession, GameState};
//! use game_2048::storage::Storage;
//!
//! let mut game = GameSession::new(
//!     Storage::in_memory(),
//!     Box::new(NullAudio),
//!     BoardSize::Four,
//!     GameMode::Classic,
//!     Some(42),
//! );
//! assert_eq!(game.board().count_empty(), 14);
//! for dir in Move::ALL.iter().cycle().take(40) {
//!     game.make_move(*dir);
//! }
//! assert!(game.score() <= game.best_score());
//! assert_ne!(game.state(), GameState::Won);
//! ```

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;
use std::time::{Duration, Instant};

use crate::audio::AudioNotifier;
use crate::engine::{is_terminal, Board, BoardSize, Cell, Move, Score, Tile};
use crate::storage::{ScoreRecord, SettingsPatch, Storage, StorageError};
use crate::trace::{now_unix_seconds, Action, Start, Trace};

pub mod achievements;
mod config;
pub mod history;

pub use achievements::{Achievement, Achievements};
pub use config::{GameConfig, GameMode, UnknownMode};
pub use history::{History, Snapshot, HISTORY_CAPACITY};

/// Undos allowed per game.
pub const UNDO_LIMIT: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    Playing,
    /// Target tile reached. Play may continue, and `continue_endless`
    /// switches a classic game to endless mode.
    Won,
    GameOver,
}

/// What an accepted move did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveReport {
    pub direction: Move,
    pub score_gained: Score,
    pub merges: u32,
    pub largest_merge: Tile,
    /// Cell of the newly spawned tile, if there was room.
    pub spawned: Option<Cell>,
    /// This move reached the target.
    pub won: bool,
    /// This move ended the game.
    pub game_over: bool,
    /// Achievement ids unlocked by this move.
    pub unlocked: Vec<&'static str>,
}

pub struct GameSession {
    config: GameConfig,
    // Mode chosen at init; `restart` returns to it after continuing endless.
    base_mode: GameMode,
    board: Board,
    score: Score,
    best_score: Score,
    best_for_size: Score,
    move_count: u32,
    max_tile: Tile,
    undo_count: u32,
    won: bool,
    win_recorded: bool,
    game_over: bool,
    history: History,
    achievements: Achievements,
    // Unlocked by starting this game (play-count achievements).
    start_unlocks: Vec<&'static str>,
    started: Instant,
    rng: StdRng,
    trace: Trace,
    storage: Storage,
    audio: Box<dyn AudioNotifier>,
}

impl GameSession {
    /// Start a fresh game. Without a seed one is drawn from the thread RNG.
    pub fn new(
        storage: Storage,
        audio: Box<dyn AudioNotifier>,
        size: BoardSize,
        mode: GameMode,
        seed: Option<u64>,
    ) -> Self {
        let seed = seed.unwrap_or_else(|| rand::thread_rng().gen());
        let mut session = Self::blank(storage, audio, GameConfig::new(size, mode), seed);
        session.begin(seed, Start::Fresh);
        session
    }

    /// Continue from an explicit position. No tiles are spawned and the
    /// play counters are left alone.
    pub fn resume(
        storage: Storage,
        audio: Box<dyn AudioNotifier>,
        board: Board,
        mode: GameMode,
        seed: u64,
    ) -> Self {
        let mut session = Self::blank(storage, audio, GameConfig::new(board.size(), mode), seed);
        session.begin(seed, Start::Position(board));
        session
    }

    fn blank(storage: Storage, audio: Box<dyn AudioNotifier>, config: GameConfig, seed: u64) -> Self {
        let size = config.size();
        Self {
            config,
            base_mode: config.mode(),
            board: Board::empty(size),
            score: 0,
            best_score: storage.best_score(),
            best_for_size: storage.best_score_by_size(size),
            move_count: 0,
            max_tile: 0,
            undo_count: 0,
            won: false,
            win_recorded: false,
            game_over: false,
            history: History::new(),
            achievements: storage.achievements(),
            start_unlocks: Vec::new(),
            started: Instant::now(),
            rng: StdRng::seed_from_u64(seed),
            trace: Trace::new(size, config.mode(), seed, Start::Fresh),
            storage,
            audio,
        }
    }

    fn begin(&mut self, seed: u64, start: Start) {
        let size = self.config.size();
        self.rng = StdRng::seed_from_u64(seed);
        self.score = 0;
        self.move_count = 0;
        self.undo_count = 0;
        self.won = false;
        self.win_recorded = false;
        self.history.clear();
        self.start_unlocks.clear();
        self.started = Instant::now();
        self.best_for_size = self.storage.best_score_by_size(size);
        self.trace = Trace::new(size, self.config.mode(), seed, start.clone());

        match start {
            Start::Fresh => {
                let mut board = Board::empty(size);
                for _ in 0..self.config.initial_tiles() {
                    board.insert_random_tile(&mut self.rng);
                }
                self.board = board;
                self.start_unlocks = self.achievements.record_play(size, now_unix_seconds());
                for id in &self.start_unlocks {
                    info!("achievement unlocked: {id}");
                }
                self.save_achievements();
                let patch = SettingsPatch { board_size: Some(size), ..Default::default() };
                log_failure("settings", self.storage.save_settings(patch).map(drop));
            }
            Start::Position(board) => self.board = board,
        }

        self.max_tile = self.board.highest_tile();
        self.game_over = is_terminal(&self.board);
        debug!("new {} game on {size}, seed {seed}", self.config.mode());
    }

    /// Reset to a new game. `None` keeps the current size / initial mode.
    pub fn init_game(&mut self, size: Option<BoardSize>, mode: Option<GameMode>) {
        let size = size.unwrap_or(self.config.size());
        let mode = mode.unwrap_or(self.base_mode);
        self.config = GameConfig::new(size, mode);
        self.base_mode = mode;
        let seed = self.rng.gen();
        self.begin(seed, Start::Fresh);
    }

    pub fn restart(&mut self) {
        self.audio.play_button();
        self.init_game(None, None);
    }

    pub fn change_board_size(&mut self, size: BoardSize) {
        self.audio.play_button();
        self.init_game(Some(size), None);
    }

    /// Slide the board. Returns `None` when the game is over or nothing
    /// would move; in that case no state changes at all.
    pub fn make_move(&mut self, dir: Move) -> Option<MoveReport> {
        if self.game_over {
            return None;
        }
        let res = self.board.shift(dir);
        if !res.moved {
            return None;
        }

        self.history.push(self.snapshot());
        self.board = res.board;
        self.score += res.score_gained;
        self.move_count += 1;
        self.audio.play_move();
        if res.merges > 0 {
            self.audio.play_merge(res.largest_merge);
        }

        let spawned = self.board.insert_random_tile(&mut self.rng);
        self.max_tile = self.board.highest_tile();
        self.update_best_scores();

        let now = now_unix_seconds();
        let mut unlocked = self.achievements.record_tile(self.max_tile, now);
        unlocked.extend(self.achievements.record_merges(res.merges, now));

        let won = self.check_win(now, &mut unlocked);
        let game_over = is_terminal(&self.board);
        if game_over {
            self.game_over = true;
            info!("game over: score {} max tile {} after {} moves", self.score, self.max_tile, self.move_count);
            self.audio.play_game_over();
            self.record_result();
        }

        self.save_achievements();
        self.trace.push(Action::Move(dir));

        Some(MoveReport {
            direction: dir,
            score_gained: res.score_gained,
            merges: res.merges,
            largest_merge: res.largest_merge,
            spawned,
            won,
            game_over,
            unlocked,
        })
    }

    fn check_win(&mut self, now: u64, unlocked: &mut Vec<&'static str>) -> bool {
        if self.won
            || self.win_recorded
            || self.config.mode() == GameMode::Endless
            || self.max_tile < self.config.target_score()
        {
            return false;
        }
        self.won = true;
        self.win_recorded = true;
        info!("reached {} in {} moves, score {}", self.config.target_score(), self.move_count, self.score);
        self.audio.play_win();
        self.record_result();
        unlocked.extend(self.achievements.record_win(self.undo_count, now));
        true
    }

    /// Step back one move. Fails when there is nothing to undo or the undo
    /// budget is spent.
    pub fn undo(&mut self) -> bool {
        if self.undo_count >= UNDO_LIMIT {
            return false;
        }
        let Some(snap) = self.history.pop() else {
            return false;
        };
        self.board = snap.board;
        self.score = snap.score;
        self.move_count = snap.move_count;
        self.max_tile = snap.max_tile;
        self.undo_count += 1;
        // Snapshots are only taken from playable positions.
        self.game_over = false;
        self.trace.push(Action::Undo);
        debug!("undo {}/{UNDO_LIMIT}", self.undo_count);
        true
    }

    /// Keep playing a won classic game in endless mode.
    pub fn continue_endless(&mut self) -> bool {
        if self.state() != GameState::Won || self.config.mode() != GameMode::Classic {
            return false;
        }
        self.audio.play_button();
        self.config.mode = GameMode::Endless;
        self.won = false;
        self.trace.push(Action::ContinueEndless);
        debug!("continuing in endless mode");
        true
    }

    pub fn set_sound_enabled(&mut self, enabled: bool) {
        self.audio.set_enabled(enabled);
        log_failure("sound toggle", self.storage.save_sound_enabled(enabled));
        let patch = SettingsPatch { sound_enabled: Some(enabled), ..Default::default() };
        log_failure("settings", self.storage.save_settings(patch).map(drop));
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.audio.set_volume(volume);
        log_failure("volume", self.storage.save_volume(self.audio.volume()));
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            board: self.board.clone(),
            score: self.score,
            move_count: self.move_count,
            max_tile: self.max_tile,
        }
    }

    fn update_best_scores(&mut self) {
        if self.score > self.best_score {
            self.best_score = self.score;
            log_failure("best score", self.storage.save_best_score(self.score));
        }
        if self.score > self.best_for_size {
            self.best_for_size = self.score;
            let size = self.config.size();
            log_failure("best score by size", self.storage.save_best_score_by_size(size, self.score));
        }
    }

    fn record_result(&mut self) {
        let record = ScoreRecord {
            score: self.score,
            max_tile: self.max_tile,
            move_count: self.move_count,
            board_size: self.config.size(),
            mode: self.config.mode(),
        };
        match self.storage.add_leaderboard_entry(record) {
            Ok(entry) => debug!("leaderboard entry {} ({})", entry.id, entry.score),
            Err(e) => warn!("could not save leaderboard entry: {e}"),
        }
    }

    fn save_achievements(&mut self) {
        if self.achievements.take_dirty() {
            log_failure("achievements", self.storage.save_achievements(&self.achievements));
        }
    }

    pub fn state(&self) -> GameState {
        if self.game_over {
            GameState::GameOver
        } else if self.won {
            GameState::Won
        } else {
            GameState::Playing
        }
    }

    #[inline]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[inline]
    pub fn score(&self) -> Score {
        self.score
    }

    #[inline]
    pub fn best_score(&self) -> Score {
        self.best_score
    }

    /// Best score recorded on the current board size.
    #[inline]
    pub fn best_score_for_size(&self) -> Score {
        self.best_for_size
    }

    #[inline]
    pub fn move_count(&self) -> u32 {
        self.move_count
    }

    #[inline]
    pub fn max_tile(&self) -> Tile {
        self.max_tile
    }

    #[inline]
    pub fn undo_count(&self) -> u32 {
        self.undo_count
    }

    pub fn can_undo(&self) -> bool {
        self.undo_count < UNDO_LIMIT && !self.history.is_empty()
    }

    #[inline]
    pub fn is_won(&self) -> bool {
        self.won
    }

    #[inline]
    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    #[inline]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    #[inline]
    pub fn mode(&self) -> GameMode {
        self.config.mode()
    }

    #[inline]
    pub fn size(&self) -> BoardSize {
        self.config.size()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn achievements(&self) -> &Achievements {
        &self.achievements
    }

    /// Achievements unlocked by starting the current game.
    pub fn start_unlocks(&self) -> &[&'static str] {
        &self.start_unlocks
    }

    /// Time since this game started.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Actions recorded since this game started.
    pub fn trace(&self) -> &Trace {
        &self.trace
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut Storage {
        &mut self.storage
    }

    pub fn audio(&self) -> &dyn AudioNotifier {
        self.audio.as_ref()
    }
}

impl fmt::Debug for GameSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameSession")
            .field("config", &self.config)
            .field("state", &self.state())
            .field("score", &self.score)
            .field("move_count", &self.move_count)
            .field("max_tile", &self.max_tile)
            .field("undo_count", &self.undo_count)
            .field("board", &self.board)
            .finish_non_exhaustive()
    }
}

fn log_failure(what: &str, result: Result<(), StorageError>) {
    if let Err(e) = result {
        warn!("could not save {what}: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::NullAudio;
    use crate::storage::DisabledBackend;

    fn resume(rows: Vec<Vec<Tile>>, mode: GameMode) -> GameSession {
        let board = Board::from_rows(rows).unwrap();
        GameSession::resume(Storage::in_memory(), Box::new(NullAudio), board, mode, 9)
    }

    #[test]
    fn fresh_game_places_initial_tiles() {
        for size in BoardSize::ALL {
            let g = GameSession::new(Storage::in_memory(), Box::new(NullAudio), size, GameMode::Classic, Some(1));
            let filled = size.cells() - g.board().count_empty();
            assert_eq!(filled, size.initial_tiles());
            assert_eq!(g.max_tile(), g.board().highest_tile());
            assert_eq!(g.state(), GameState::Playing);
            assert_eq!(g.storage().settings().board_size, size);
        }
    }

    #[test]
    fn noop_move_leaves_history_untouched() {
        let mut g = resume(vec![vec![2, 0, 0], vec![0, 0, 0], vec![0, 0, 0]], GameMode::Classic);
        assert!(g.make_move(Move::Left).is_none());
        assert!(g.make_move(Move::Up).is_none());
        assert!(g.history().is_empty());
        assert_eq!(g.move_count(), 0);
        assert!(g.trace().is_empty());
    }

    #[test]
    fn move_updates_score_and_spawns() {
        let mut g = resume(vec![vec![2, 2, 0], vec![0, 0, 0], vec![0, 0, 0]], GameMode::Classic);
        let report = g.make_move(Move::Left).unwrap();
        assert_eq!(report.score_gained, 4);
        assert_eq!(report.merges, 1);
        assert!(report.spawned.is_some());
        assert_eq!(g.score(), 4);
        assert_eq!(g.best_score(), 4);
        assert_eq!(g.storage().best_score(), 4);
        assert_eq!(g.storage().best_score_by_size(BoardSize::Three), 4);
        assert_eq!(g.board().count_empty(), 7);
        assert_eq!(g.history().len(), 1);
    }

    #[test]
    fn winning_move_records_once() {
        let mut g = resume(vec![vec![256, 256, 0], vec![0, 0, 0], vec![0, 0, 0]], GameMode::Classic);
        let report = g.make_move(Move::Left).unwrap();
        assert!(report.won);
        assert_eq!(g.state(), GameState::Won);
        assert!(report.unlocked.contains(&achievements::TILE_512));
        assert!(report.unlocked.contains(&achievements::NO_UNDO_WIN));
        assert_eq!(g.storage().leaderboard().len(), 1);

        assert!(g.continue_endless());
        assert_eq!(g.mode(), GameMode::Endless);
        assert_eq!(g.state(), GameState::Playing);
        assert!(!g.continue_endless());
        for dir in Move::ALL.iter().cycle().take(8) {
            if let Some(r) = g.make_move(*dir) {
                assert!(!r.won);
            }
        }
        let wins = g.storage().leaderboard().iter().filter(|e| e.max_tile >= 512 && e.mode == GameMode::Classic).count();
        assert_eq!(wins, 1);
    }

    #[test]
    fn endless_mode_never_wins() {
        let mut g = resume(vec![vec![256, 256, 0], vec![0, 0, 0], vec![0, 0, 0]], GameMode::Endless);
        let report = g.make_move(Move::Left).unwrap();
        assert!(!report.won);
        assert_eq!(g.state(), GameState::Playing);
        assert!(g.storage().leaderboard().is_empty());
    }

    #[test]
    fn moves_continue_while_won() {
        let mut g = resume(vec![vec![256, 256, 0], vec![0, 0, 0], vec![0, 0, 0]], GameMode::Time);
        g.make_move(Move::Left).unwrap();
        assert_eq!(g.state(), GameState::Won);
        assert!(!g.continue_endless());
        let moved = Move::ALL.iter().any(|&d| g.make_move(d).is_some());
        assert!(moved);
    }

    #[test]
    fn undo_restores_previous_state() {
        let mut g = resume(vec![vec![2, 2, 0], vec![0, 4, 0], vec![0, 0, 0]], GameMode::Classic);
        let before = g.board().clone();
        g.make_move(Move::Left).unwrap();
        assert!(g.undo());
        assert_eq!(g.board(), &before);
        assert_eq!(g.score(), 0);
        assert_eq!(g.move_count(), 0);
        assert_eq!(g.max_tile(), 4);
        assert_eq!(g.undo_count(), 1);
        assert!(!g.undo());
        assert_eq!(g.undo_count(), 1);
    }

    #[test]
    fn undo_budget_is_enforced() {
        let mut g = GameSession::new(Storage::in_memory(), Box::new(NullAudio), BoardSize::Six, GameMode::Classic, Some(5));
        let mut undone = 0;
        for _ in 0..15 {
            let moved = Move::ALL.iter().any(|&d| g.make_move(d).is_some());
            assert!(moved);
            if g.undo() {
                undone += 1;
            }
        }
        assert_eq!(undone, UNDO_LIMIT);
        assert!(!g.can_undo());
    }

    #[test]
    fn terminal_position_blocks_moves() {
        let mut g = resume(vec![vec![2, 4, 8], vec![16, 32, 64], vec![128, 256, 2]], GameMode::Classic);
        assert_eq!(g.state(), GameState::GameOver);
        for dir in Move::ALL {
            assert!(g.make_move(dir).is_none());
        }
        assert!(g.history().is_empty());
    }

    #[test]
    fn disabled_storage_keeps_playing() {
        let mut g = GameSession::new(Storage::new(DisabledBackend), Box::new(NullAudio), BoardSize::Four, GameMode::Classic, Some(3));
        let moved = Move::ALL.iter().filter_map(|&d| g.make_move(d)).count();
        assert!(moved > 0);
        assert_eq!(g.best_score(), g.score());
    }

    #[test]
    fn restart_returns_to_base_mode() {
        let mut g = resume(vec![vec![256, 256, 0], vec![0, 0, 0], vec![0, 0, 0]], GameMode::Classic);
        g.make_move(Move::Left).unwrap();
        assert!(g.continue_endless());
        g.restart();
        assert_eq!(g.mode(), GameMode::Classic);
        assert_eq!(g.score(), 0);
        assert_eq!(g.undo_count(), 0);
        assert!(g.history().is_empty());

        g.change_board_size(BoardSize::Five);
        assert_eq!(g.size(), BoardSize::Five);
        assert_eq!(g.config().target_score(), 4096);
        assert_eq!(g.board().count_empty(), 22);
    }

    #[test]
    fn tenth_play_reports_unlock() {
        let mut g = GameSession::new(Storage::in_memory(), Box::new(NullAudio), BoardSize::Three, GameMode::Classic, Some(9));
        for _ in 1..9 {
            assert!(g.start_unlocks().is_empty());
            g.restart();
        }
        assert!(g.start_unlocks().is_empty());
        g.restart();
        assert_eq!(g.start_unlocks(), &[achievements::PLAY_3X3]);
        assert!(g.achievements().get(achievements::PLAY_3X3).unwrap().unlocked);
        g.restart();
        assert!(g.start_unlocks().is_empty());
    }
}
