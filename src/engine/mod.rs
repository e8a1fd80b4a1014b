//! Engine module: square 2048 boards of side 3..=6, the slide/merge
//! transform and the board queries the rest of the crate builds on.
//!
//! - `Board` is the row-major grid with ergonomic methods.
//! - Free functions mirror the methods when convenient (e.g., `shift`).
//! - Nothing here owns randomness; spawns take a caller-provided RNG.

mod ops;
pub mod state;

pub use state::{Board, BoardError, BoardSize, Cell, Move, MoveResult, Score, Tile};

pub use ops::{empty_cells, is_terminal, max_tile, shift, spawn_value};
