use rand::Rng;

use super::state::{Board, Cell, Move, MoveResult, Score, Tile};

/// Result of collapsing a single line toward index 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LineShift {
    pub tiles: Vec<Tile>,
    pub moved: bool,
    pub score: Score,
    pub merges: u32,
    pub largest: Tile,
}

/// Slide/merge tiles in the given direction. No randomness.
pub fn shift(board: &Board, direction: Move) -> MoveResult {
    let side = board.side();
    let src = board.cells();
    let mut cells = vec![0; src.len()];
    let mut moved = false;
    let mut score_gained = 0;
    let mut merges = 0;
    let mut largest_merge = 0;

    for line_idx in 0..side {
        let indices = line_indices(side, direction, line_idx);
        let line: Vec<Tile> = indices.iter().map(|&i| src[i]).collect();
        let res = shift_vec_left(&line);
        for (&dst, &tile) in indices.iter().zip(res.tiles.iter()) {
            cells[dst] = tile;
        }
        moved |= res.moved;
        score_gained += res.score;
        merges += res.merges;
        largest_merge = largest_merge.max(res.largest);
    }

    MoveResult {
        board: Board::from_cells(board.size(), cells),
        moved,
        score_gained,
        merges,
        largest_merge,
    }
}

/// Cell indices of one line, ordered so that index 0 is the edge tiles
/// slide toward. Right/Down walk the line backwards, which is the same as
/// reversing it, collapsing left and reversing back.
fn line_indices(side: usize, direction: Move, line_idx: usize) -> Vec<usize> {
    match direction {
        Move::Left => (0..side).map(|col| line_idx * side + col).collect(),
        Move::Right => (0..side).rev().map(|col| line_idx * side + col).collect(),
        Move::Up => (0..side).map(|row| row * side + line_idx).collect(),
        Move::Down => (0..side).rev().map(|row| row * side + line_idx).collect(),
    }
}

/// Compact a line toward index 0 and merge equal neighbours once.
///
/// The scan runs left to right; a merged tile is never merged again in the
/// same pass, so `[2, 2, 2]` becomes `[4, 2, 0]`.
pub(crate) fn shift_vec_left(line: &[Tile]) -> LineShift {
    let compacted: Vec<Tile> = line.iter().copied().filter(|&t| t != 0).collect();
    let mut tiles = Vec::with_capacity(line.len());
    let mut score = 0;
    let mut merges = 0;
    let mut largest = 0;

    let mut idx = 0;
    while idx < compacted.len() {
        let val = compacted[idx];
        if idx + 1 < compacted.len() && compacted[idx + 1] == val {
            let merged = val * 2;
            tiles.push(merged);
            score += merged;
            merges += 1;
            largest = largest.max(merged);
            idx += 2;
        } else {
            tiles.push(val);
            idx += 1;
        }
    }
    tiles.resize(line.len(), 0);

    let moved = merges > 0 || tiles.as_slice() != line;
    LineShift { tiles, moved, score, merges, largest }
}

/// Coordinates of all zero cells, row-major.
pub fn empty_cells(board: &Board) -> Vec<Cell> {
    let side = board.side();
    board
        .cells()
        .iter()
        .enumerate()
        .filter(|&(_, &t)| t == 0)
        .map(|(idx, _)| Cell { row: idx / side, col: idx % side })
        .collect()
}

/// 2 with probability 0.9, else 4.
pub fn spawn_value<R: Rng + ?Sized>(rng: &mut R) -> Tile {
    if rng.gen_range(0..10) < 9 { 2 } else { 4 }
}

/// Highest tile on the board, 0 if empty.
pub fn max_tile(board: &Board) -> Tile {
    board.cells().iter().copied().max().unwrap_or(0)
}

/// True iff the board is full and no two orthogonal neighbours are equal.
///
/// This is exactly the condition under which `shift` reports `moved == false`
/// for every direction.
pub fn is_terminal(board: &Board) -> bool {
    board.count_empty() == 0 && !has_adjacent_pair(board)
}

fn has_adjacent_pair(board: &Board) -> bool {
    let side = board.side();
    for row in 0..side {
        for col in 0..side {
            let val = board.get(row, col);
            if col + 1 < side && board.get(row, col + 1) == val {
                return true;
            }
            if row + 1 < side && board.get(row + 1, col) == val {
                return true;
            }
        }
    }
    false
}

pub(crate) fn format_val(val: Tile) -> String {
    match val {
        0 => String::from("       "),
        x => {
            let mut x = x.to_string();
            while x.len() < 7 {
                match x.len() {
                    6 => x = format!(" {}", x),
                    _ => x = format!(" {} ", x),
                }
            }
            x
        }
    }
}
