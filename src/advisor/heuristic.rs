use serde::{Deserialize, Serialize};

use crate::engine::Board;

/// Bonus awarded when the largest tile sits in a corner, before weighting.
const CORNER_BONUS: f64 = 100.0;
/// Smoothness credit for two identical neighbours.
const IDENTICAL_NEIGHBOURS: f64 = 2.0;

/// Linear weights for the board evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicWeights {
    pub empty: f64,
    pub corner: f64,
    pub monotonicity: f64,
    pub smoothness: f64,
    pub merge: f64,
}

impl Default for HeuristicWeights {
    fn default() -> Self {
        Self { empty: 100.0, corner: 50.0, monotonicity: 30.0, smoothness: 20.0, merge: 40.0 }
    }
}

/// Weighted sum of all heuristic terms; higher is better.
pub fn evaluate(board: &Board, weights: &HeuristicWeights) -> f64 {
    board.count_empty() as f64 * weights.empty
        + calc_corner(board) * weights.corner
        + calc_monotonicity(board) as f64 * weights.monotonicity
        + calc_smoothness(board) * weights.smoothness
        + calc_merge_potential(board) as f64 * weights.merge
}

/// `CORNER_BONUS` if the first occurrence (row-major) of the largest tile is
/// in a corner, else 0.
pub(crate) fn calc_corner(board: &Board) -> f64 {
    let side = board.side();
    let mut max = 0;
    let mut pos = (0, 0);
    for row in 0..side {
        for col in 0..side {
            let val = board.get(row, col);
            if val > max {
                max = val;
                pos = (row, col);
            }
        }
    }
    let edge = |i: usize| i == 0 || i == side - 1;
    if edge(pos.0) && edge(pos.1) { CORNER_BONUS } else { 0.0 }
}

/// Number of rows plus columns that are entirely non-increasing or
/// non-decreasing. Ranges over `0..=2N`.
pub(crate) fn calc_monotonicity(board: &Board) -> u32 {
    let side = board.side();
    let rows = (0..side).filter(|&r| is_monotone((0..side).map(|c| board.get(r, c)))).count();
    let cols = (0..side).filter(|&c| is_monotone((0..side).map(|r| board.get(r, c)))).count();
    (rows + cols) as u32
}

fn is_monotone(line: impl Iterator<Item = u64>) -> bool {
    let mut increasing = true;
    let mut decreasing = true;
    let mut prev = None;
    for val in line {
        if let Some(p) = prev {
            if p < val {
                decreasing = false;
            }
            if p > val {
                increasing = false;
            }
        }
        prev = Some(val);
    }
    increasing || decreasing
}

/// Sum over all orthogonal neighbour pairs: 2 for identical values,
/// otherwise `1 / (1 + |a - b|)`. Empty cells take part as zeros.
pub(crate) fn calc_smoothness(board: &Board) -> f64 {
    neighbour_pairs(board).map(|(a, b)| pair_smoothness(a, b)).sum()
}

fn pair_smoothness(a: u64, b: u64) -> f64 {
    let diff = a.abs_diff(b);
    if diff == 0 { IDENTICAL_NEIGHBOURS } else { 1.0 / (diff as f64 + 1.0) }
}

/// Sum of values of all equal, non-empty neighbour pairs.
pub(crate) fn calc_merge_potential(board: &Board) -> u64 {
    neighbour_pairs(board).filter(|&(a, b)| a != 0 && a == b).map(|(a, _)| a).sum()
}

/// Every horizontal then every vertical neighbour pair.
fn neighbour_pairs(board: &Board) -> impl Iterator<Item = (u64, u64)> + '_ {
    let side = board.side();
    let horizontal = (0..side)
        .flat_map(move |r| (0..side - 1).map(move |c| (board.get(r, c), board.get(r, c + 1))));
    let vertical = (0..side)
        .flat_map(move |c| (0..side - 1).map(move |r| (board.get(r, c), board.get(r + 1, c))));
    horizontal.chain(vertical)
}
