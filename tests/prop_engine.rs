//! Property-based tests for the board transform and queries.

#![allow(clippy::unwrap_used)]

use proptest::prelude::*;

use game_2048::advisor::Advisor;
use game_2048::engine::{self, Board, BoardSize, Move, Tile};

/// Random board of a random supported size; each cell empty or 2..=2048.
fn arb_board() -> impl Strategy<Value = Board> {
    (3usize..=6).prop_flat_map(|side| {
        prop::collection::vec(prop_oneof![3 => Just(0u32), 5 => 1u32..=11], side * side).prop_map(
            move |exps| {
                let rows = exps
                    .chunks(side)
                    .map(|r| r.iter().map(|&e| if e == 0 { 0 } else { 1 << e }).collect::<Vec<Tile>>())
                    .collect();
                Board::from_rows(rows).unwrap()
            },
        )
    })
}

fn arb_move() -> impl Strategy<Value = Move> {
    (0u8..4).prop_map(|i| Move::from_index(i).unwrap())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(2000))]

    /// Merges only combine tiles: total value is unchanged by a slide.
    #[test]
    fn prop_mass_conservation(board in arb_board(), dir in arb_move()) {
        let res = board.shift(dir);
        prop_assert_eq!(res.board.tile_sum(), board.tile_sum());
        prop_assert_eq!(res.board.size(), board.size());
        prop_assert!(res.board.count_empty() >= board.count_empty());
        prop_assert_eq!(res.board.count_empty() - board.count_empty(), res.merges as usize);
    }

    /// Score gained is the sum of merged values, so it is even and bounded
    /// by twice the tile mass.
    #[test]
    fn prop_score_bounds(board in arb_board(), dir in arb_move()) {
        let res = board.shift(dir);
        prop_assert_eq!(res.score_gained % 2, 0);
        prop_assert!(res.score_gained <= board.tile_sum() * 2);
        prop_assert_eq!(res.score_gained == 0, res.merges == 0);
        if !res.moved {
            prop_assert_eq!(&res.board, &board);
        }
    }

    /// Terminal iff every direction is a no-op.
    #[test]
    fn prop_terminal_matches_moves(board in arb_board()) {
        let all_noop = Move::ALL.iter().all(|&d| !board.shift(d).moved);
        prop_assert_eq!(engine::is_terminal(&board), all_noop);
        prop_assert_eq!(board.is_game_over(), all_noop);
    }

    /// Sliding until nothing changes always terminates, and the saturated
    /// board is a fixed point.
    #[test]
    fn prop_saturation_idempotent(board in arb_board(), dir in arb_move()) {
        let mut b = board;
        let mut steps = 0;
        loop {
            let res = b.shift(dir);
            if !res.moved {
                break;
            }
            b = res.board;
            steps += 1;
            prop_assert!(steps <= 36);
        }
        let again = b.shift(dir);
        prop_assert!(!again.moved);
        prop_assert_eq!(again.score_gained, 0);
        prop_assert_eq!(again.board, b);
    }

    /// The pure transform is deterministic.
    #[test]
    fn prop_shift_deterministic(board in arb_board(), dir in arb_move()) {
        prop_assert_eq!(board.shift(dir), board.shift(dir));
    }

    /// Advisor suggestions are always legal, and absent only when terminal.
    #[test]
    fn prop_advisor_picks_legal(board in arb_board()) {
        let mut advisor = Advisor::new();
        match advisor.best_move(&board) {
            Some(dir) => prop_assert!(board.shift(dir).moved),
            None => prop_assert!(engine::is_terminal(&board)),
        }
    }

    /// Empty-cell listing agrees with the empty count and max_tile with the cells.
    #[test]
    fn prop_queries_consistent(board in arb_board()) {
        let empties = engine::empty_cells(&board);
        prop_assert_eq!(empties.len(), board.count_empty());
        for c in &empties {
            prop_assert_eq!(board.get(c.row, c.col), 0);
        }
        prop_assert_eq!(engine::max_tile(&board), board.cells().iter().copied().max().unwrap_or(0));
    }
}

#[test]
fn full_board_sizes_cover_all_variants() {
    for size in BoardSize::ALL {
        let b = Board::empty(size);
        assert!(!engine::is_terminal(&b));
        assert_eq!(b.count_empty(), size.cells());
    }
}
