//! game-2048: a sliding-tile merge game engine
//!
//! This crate provides:
//! - A square `Board` (3x3 to 6x6) with the pure slide/merge transform and
//!   board queries (`engine` module)
//! - A greedy one-ply move advisor for hints and autoplay (`advisor` module)
//! - The game session state machine with undo, win/lose handling and
//!   achievements (`session` module)
//! - Collaborators for persistence, sound cues and color themes
//!   (`storage`, `audio`, `theme`)
//! - A binary trace format for replaying a game (`trace` module)
//!
//! Quick start:
//! ```
//! use game_2048::engine::{Board, BoardSize, Move};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! // Deterministic board initialization with a seeded RNG
//! let mut rng = StdRng::seed_from_u64(42);
//! let b0 = Board::empty(BoardSize::Four).with_random_tile(&mut rng).with_random_tile(&mut rng);
//! let res = b0.shift(Move::Left);
//! assert_eq!(res.board.tile_sum(), b0.tile_sum());
//! ```
//!
//! Note: `Board::shift` never touches randomness. Spawning is explicit via
//! `Board::insert_random_tile` / `Board::make_move`, which take the RNG.
pub mod advisor;
pub mod audio;
pub mod config;
pub mod engine;
pub mod session;
pub mod storage;
pub mod theme;
pub mod trace;
