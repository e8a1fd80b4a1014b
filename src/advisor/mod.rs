//! Greedy one-ply move advisor (hint / autoplay policy).
//!
//! For each direction the advisor simulates the slide, discards no-op
//! directions, scores the successor board with a weighted linear
//! heuristic and picks the best. Spawn randomness is ignored and there is
//! no deeper search.
//!
//! Quick start
//! ```
//! use game_2048::advisor::Advisor;
//! use game_2048::engine::{Board, Move};
//!
//! let board = Board::from_rows(vec![
//!     vec![2, 2, 0, 0],
//!     vec![0, 0, 0, 0],
//!     vec![0, 0, 0, 0],
//!     vec![0, 0, 0, 0],
//! ]).unwrap();
//! let mut advisor = Advisor::new();
//! let dir = advisor.best_move(&board);
//! assert!(dir.is_some());
//! assert_eq!(advisor.last_stats().legal, 3);
//! ```

use crate::engine::{Board, Move};

pub mod heuristic;

pub use heuristic::{evaluate, HeuristicWeights};

/// Heuristic score for one direction at the root.
///
/// - `score` is the evaluation of the board after sliding in `dir`.
/// - `legal` is false when the move is a no-op for the current board.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BranchEval {
    pub dir: Move,
    pub score: f64,
    pub legal: bool,
}

/// Basic stats for a single evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Directions simulated.
    pub evaluated: u32,
    /// Directions that changed the board.
    pub legal: u32,
}

/// Recommended move plus a one-line explanation for the player.
#[derive(Debug, Clone, PartialEq)]
pub struct Suggestion {
    pub dir: Move,
    pub score: f64,
    pub reasoning: String,
}

/// Greedy one-ply advisor.
#[derive(Debug, Clone, Default)]
pub struct Advisor {
    weights: HeuristicWeights,
    stats: SearchStats,
}

impl Advisor {
    pub fn new() -> Self {
        Self::with_weights(HeuristicWeights::default())
    }

    pub fn with_weights(weights: HeuristicWeights) -> Self {
        Self { weights, stats: SearchStats::default() }
    }

    #[inline]
    pub fn weights(&self) -> &HeuristicWeights {
        &self.weights
    }

    /// Highest-scoring legal direction, or `None` if no direction changes the
    /// board. Ties go to the first direction in `Up, Down, Left, Right` order.
    pub fn best_move(&mut self, board: &Board) -> Option<Move> {
        let mut best_score = f64::NEG_INFINITY;
        let mut best_move = None;
        for branch in self.branch_evals(board) {
            if branch.legal && branch.score > best_score {
                best_score = branch.score;
                best_move = Some(branch.dir);
            }
        }
        best_move
    }

    /// Score each direction.
    ///
    /// Returns a fixed array in order: `[Up, Down, Left, Right]` and marks
    /// illegal moves as `legal=false`.
    pub fn branch_evals(&mut self, board: &Board) -> [BranchEval; 4] {
        let mut stats = SearchStats::default();
        let out = Move::ALL.map(|dir| {
            stats.evaluated += 1;
            let res = board.shift(dir);
            if res.moved {
                stats.legal += 1;
                BranchEval { dir, score: evaluate(&res.board, &self.weights), legal: true }
            } else {
                BranchEval { dir, score: 0.0, legal: false }
            }
        });
        self.stats = stats;
        out
    }

    /// `best_move` with a human-readable reason attached.
    pub fn suggest(&mut self, board: &Board) -> Option<Suggestion> {
        let branches = self.branch_evals(board);
        let best = branches
            .iter()
            .filter(|b| b.legal)
            .fold(None::<&BranchEval>, |acc, b| match acc {
                Some(a) if a.score >= b.score => Some(a),
                _ => Some(b),
            })?;
        let reasoning = match self.stats.legal {
            1 => format!("{} is the only move that changes the board", best.dir),
            _ => format!("moving {} keeps the largest tiles better organised", best.dir),
        };
        Some(Suggestion { dir: best.dir, score: best.score, reasoning })
    }

    /// Statistics collected from the last call to [`Self::best_move`],
    /// [`Self::branch_evals`] or [`Self::suggest`].
    #[inline]
    pub fn last_stats(&self) -> SearchStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(rows: &[&[u64]]) -> Board {
        Board::from_rows(rows.iter().map(|r| r.to_vec()).collect()).unwrap()
    }

    #[test]
    fn terminal_board_has_no_suggestion() {
        let b = board(&[&[2, 4, 2], &[4, 2, 4], &[2, 4, 2]]);
        let mut advisor = Advisor::new();
        assert_eq!(advisor.best_move(&b), None);
        assert_eq!(advisor.suggest(&b), None);
        assert_eq!(advisor.last_stats(), SearchStats { evaluated: 4, legal: 0 });
        assert!(advisor.branch_evals(&b).iter().all(|br| !br.legal));
    }

    #[test]
    fn single_legal_direction_is_chosen() {
        // Only a left slide changes anything: the first column is empty.
        let b = board(&[&[0, 2, 4], &[0, 8, 16], &[0, 32, 64]]);
        let mut advisor = Advisor::new();
        assert_eq!(advisor.best_move(&b), Some(Move::Left));
        let s = advisor.suggest(&b).unwrap();
        assert_eq!(s.dir, Move::Left);
        assert!(s.reasoning.contains("only move"));
    }

    #[test]
    fn ties_break_in_evaluation_order() {
        // Symmetric board: Up and Down (and Left/Right) produce mirror images
        // that score the same; Up must win the tie.
        let b = board(&[&[0, 0, 0], &[0, 2, 0], &[0, 0, 0]]);
        let mut advisor = Advisor::with_weights(HeuristicWeights {
            empty: 1.0,
            corner: 0.0,
            monotonicity: 0.0,
            smoothness: 0.0,
            merge: 0.0,
        });
        assert_eq!(advisor.best_move(&b), Some(Move::Up));
        assert_eq!(advisor.suggest(&b).map(|s| s.dir), Some(Move::Up));
    }

    #[test]
    fn prefers_merging_moves() {
        let b = board(&[&[2, 2, 0, 0], &[0, 0, 0, 0], &[0, 0, 0, 0], &[0, 0, 0, 0]]);
        let mut advisor = Advisor::new();
        let branches = advisor.branch_evals(&b);
        assert_eq!(branches.map(|br| br.dir), Move::ALL);
        // Up is a no-op; the others are legal.
        assert!(!branches[0].legal);
        assert!(branches[1].legal && branches[2].legal && branches[3].legal);
        let best = advisor.best_move(&b).unwrap();
        assert!(matches!(best, Move::Left | Move::Right));
    }
}
