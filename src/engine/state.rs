use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ops;

pub type Tile = u64;
pub type Score = u64;

/// A direction to move/merge tiles.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Move {
    Up,
    Down,
    Left,
    Right,
}

impl Move {
    /// All directions, in the order the advisor evaluates them.
    pub const ALL: [Move; 4] = [Move::Up, Move::Down, Move::Left, Move::Right];

    /// Stable index in `[Up, Down, Left, Right]` order.
    #[inline]
    pub fn index(self) -> u8 {
        match self {
            Move::Up => 0,
            Move::Down => 1,
            Move::Left => 2,
            Move::Right => 3,
        }
    }

    #[inline]
    pub fn from_index(idx: u8) -> Option<Move> {
        Move::ALL.get(idx as usize).copied()
    }

    /// Map a single keypress (`wasd` or `hjkl`) to a direction.
    pub fn from_key(key: char) -> Option<Move> {
        match key.to_ascii_lowercase() {
            'w' | 'k' => Some(Move::Up),
            's' | 'j' => Some(Move::Down),
            'a' | 'h' => Some(Move::Left),
            'd' | 'l' => Some(Move::Right),
            _ => None,
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Move::Up => "up",
            Move::Down => "down",
            Move::Left => "left",
            Move::Right => "right",
        };
        f.write_str(name)
    }
}

impl FromStr for Move {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let mut chars = s.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return Move::from_key(c).ok_or_else(|| BoardError::UnknownMove(s.to_string()));
        }
        match s.to_ascii_lowercase().as_str() {
            "up" | "arrowup" => Ok(Move::Up),
            "down" | "arrowdown" => Ok(Move::Down),
            "left" | "arrowleft" => Ok(Move::Left),
            "right" | "arrowright" => Ok(Move::Right),
            _ => Err(BoardError::UnknownMove(s.to_string())),
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    #[error("unsupported board size {0} (expected 3, 4, 5 or 6)")]
    UnsupportedSize(usize),
    #[error("board is not square: row {row} has {len} cells")]
    NotSquare { row: usize, len: usize },
    #[error("cell ({row}, {col}) holds {value}, which is not a power of two >= 2")]
    InvalidTile { row: usize, col: usize, value: Tile },
    #[error("unknown move {0:?}")]
    UnknownMove(String),
}

/// Supported board side lengths. The domain is closed, so per-size data is
/// keyed by this enum rather than by a raw integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub enum BoardSize {
    Three,
    #[default]
    Four,
    Five,
    Six,
}

impl BoardSize {
    pub const ALL: [BoardSize; 4] = [BoardSize::Three, BoardSize::Four, BoardSize::Five, BoardSize::Six];

    #[inline]
    pub fn side(self) -> usize {
        match self {
            BoardSize::Three => 3,
            BoardSize::Four => 4,
            BoardSize::Five => 5,
            BoardSize::Six => 6,
        }
    }

    /// Number of cells on a board of this size.
    #[inline]
    pub fn cells(self) -> usize {
        self.side() * self.side()
    }

    /// Tile value that counts as a win on this size.
    pub fn target_score(self) -> Tile {
        match self {
            BoardSize::Three => 512,
            BoardSize::Four => 2048,
            BoardSize::Five => 4096,
            BoardSize::Six => 8192,
        }
    }

    /// Tiles placed when a game starts.
    pub fn initial_tiles(self) -> usize {
        if self.side() <= 4 { 2 } else { 3 }
    }
}

impl TryFrom<usize> for BoardSize {
    type Error = BoardError;

    fn try_from(side: usize) -> Result<Self, Self::Error> {
        match side {
            3 => Ok(BoardSize::Three),
            4 => Ok(BoardSize::Four),
            5 => Ok(BoardSize::Five),
            6 => Ok(BoardSize::Six),
            other => Err(BoardError::UnsupportedSize(other)),
        }
    }
}

impl From<BoardSize> for usize {
    fn from(size: BoardSize) -> usize {
        size.side()
    }
}

impl fmt::Display for BoardSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{0}x{0}", self.side())
    }
}

/// Row/column coordinate of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

/// Outcome of sliding a board in one direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveResult {
    pub board: Board,
    /// True if any line changed or merged.
    pub moved: bool,
    /// Sum of the values of all merged tiles.
    pub score_gained: Score,
    /// Number of merge events.
    pub merges: u32,
    /// Highest value produced by a merge (0 if nothing merged).
    pub largest_merge: Tile,
}

/// Square N x N grid of tiles, stored row-major. 0 marks an empty cell.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Board {
    size: BoardSize,
    cells: Vec<Tile>,
}

impl Board {
    /// An empty board of the given size.
    pub fn empty(size: BoardSize) -> Self {
        Board { size, cells: vec![0; size.cells()] }
    }

    /// Build a board from rows, validating shape and tile values.
    ///
    /// ```
    /// use game_2048::engine::{Board, BoardSize};
    /// let b = Board::from_rows(vec![vec![2, 0, 0], vec![0, 4, 0], vec![0, 0, 8]]).unwrap();
    /// assert_eq!(b.size(), BoardSize::Three);
    /// assert_eq!(b.highest_tile(), 8);
    /// ```
    pub fn from_rows(rows: Vec<Vec<Tile>>) -> Result<Self, BoardError> {
        let size = BoardSize::try_from(rows.len())?;
        let mut cells = Vec::with_capacity(size.cells());
        for (row, line) in rows.into_iter().enumerate() {
            if line.len() != size.side() {
                return Err(BoardError::NotSquare { row, len: line.len() });
            }
            for (col, value) in line.into_iter().enumerate() {
                if value != 0 && (value < 2 || !value.is_power_of_two()) {
                    return Err(BoardError::InvalidTile { row, col, value });
                }
                cells.push(value);
            }
        }
        Ok(Board { size, cells })
    }

    pub(crate) fn from_cells(size: BoardSize, cells: Vec<Tile>) -> Self {
        debug_assert_eq!(cells.len(), size.cells());
        Board { size, cells }
    }

    #[inline]
    pub fn size(&self) -> BoardSize {
        self.size
    }

    #[inline]
    pub fn side(&self) -> usize {
        self.size.side()
    }

    /// Tiles in row-major order.
    #[inline]
    pub fn cells(&self) -> &[Tile] {
        &self.cells
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Tile {
        self.cells[row * self.side() + col]
    }

    #[inline]
    pub(crate) fn set(&mut self, cell: Cell, value: Tile) {
        let side = self.side();
        self.cells[cell.row * side + cell.col] = value;
    }

    /// Copy of the grid as nested rows.
    pub fn rows(&self) -> Vec<Vec<Tile>> {
        self.cells.chunks(self.side()).map(<[Tile]>::to_vec).collect()
    }

    /// Slide/merge tiles in `dir`. No randomness.
    ///
    /// ```
    /// use game_2048::engine::{Board, Move};
    /// let b = Board::from_rows(vec![
    ///     vec![2, 2, 0, 0],
    ///     vec![0, 0, 0, 0],
    ///     vec![0, 0, 0, 0],
    ///     vec![0, 0, 0, 0],
    /// ]).unwrap();
    /// let res = b.shift(Move::Left);
    /// assert!(res.moved);
    /// assert_eq!(res.score_gained, 4);
    /// assert_eq!(res.board.get(0, 0), 4);
    /// ```
    #[inline]
    pub fn shift(&self, dir: Move) -> MoveResult {
        ops::shift(self, dir)
    }

    /// Insert a random 2 (90%) or 4 (10%) tile into a uniformly chosen empty
    /// cell using the provided RNG. Returns the cell filled, or `None` if the
    /// board is full.
    pub fn insert_random_tile<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<Cell> {
        let empty = self.empty_cells();
        if empty.is_empty() {
            return None;
        }
        let cell = empty[rng.gen_range(0..empty.len())];
        self.set(cell, ops::spawn_value(rng));
        Some(cell)
    }

    /// Builder-style `insert_random_tile`.
    ///
    /// ```
    /// use game_2048::engine::{Board, BoardSize};
    /// use rand::{SeedableRng, rngs::StdRng};
    /// let mut rng = StdRng::seed_from_u64(123);
    /// let b = Board::empty(BoardSize::Four).with_random_tile(&mut rng).with_random_tile(&mut rng);
    /// assert_eq!(b.count_empty(), 14);
    /// ```
    pub fn with_random_tile<R: Rng + ?Sized>(mut self, rng: &mut R) -> Self {
        self.insert_random_tile(rng);
        self
    }

    /// Like `with_random_tile` but uses the thread-local RNG.
    ///
    /// ```
    /// use game_2048::engine::{Board, BoardSize};
    /// let b = Board::empty(BoardSize::Three).with_random_tile_thread();
    /// assert_eq!(b.count_empty(), 8);
    /// ```
    #[inline]
    pub fn with_random_tile_thread(self) -> Self {
        let mut rng = rand::thread_rng();
        self.with_random_tile(&mut rng)
    }

    /// Perform a move then insert a random tile if the move changed the board.
    pub fn make_move<R: Rng + ?Sized>(&self, dir: Move, rng: &mut R) -> Board {
        let res = self.shift(dir);
        if res.moved {
            res.board.with_random_tile(rng)
        } else {
            self.clone()
        }
    }

    /// `make_move` with the thread-local RNG.
    #[inline]
    pub fn make_move_thread(&self, dir: Move) -> Board {
        let mut rng = rand::thread_rng();
        self.make_move(dir, &mut rng)
    }

    /// Coordinates of empty cells, row-major.
    pub fn empty_cells(&self) -> Vec<Cell> {
        ops::empty_cells(self)
    }

    #[inline]
    pub fn count_empty(&self) -> usize {
        self.cells.iter().filter(|&&t| t == 0).count()
    }

    /// Highest tile value present, 0 for an empty board.
    #[inline]
    pub fn highest_tile(&self) -> Tile {
        ops::max_tile(self)
    }

    /// Sum of all tile values.
    #[inline]
    pub fn tile_sum(&self) -> Tile {
        self.cells.iter().sum()
    }

    /// True if no move in any direction changes the board.
    #[inline]
    pub fn is_game_over(&self) -> bool {
        ops::is_terminal(self)
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Board").field("size", &self.size).field("rows", &self.rows()).finish()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let side = self.side();
        let separator = "-".repeat(side * 8 - 1);
        writeln!(f)?;
        for (row_idx, row) in self.cells.chunks(side).enumerate() {
            if row_idx > 0 {
                writeln!(f, "{separator}")?;
            }
            let line: Vec<String> = row.iter().map(|&v| ops::format_val(v)).collect();
            writeln!(f, "{}", line.join("|"))?;
        }
        Ok(())
    }
}
