use criterion::{criterion_group, criterion_main, Criterion};
use game_2048::advisor::{evaluate, Advisor, HeuristicWeights};
use game_2048::engine::{Board, BoardSize, Move};
use rand::{rngs::StdRng, SeedableRng};
use std::hint::black_box;

fn corpus() -> Vec<Board> {
    let mut rng = StdRng::seed_from_u64(7);
    let mut boards = Vec::new();
    let mut b = Board::empty(BoardSize::Four).with_random_tile(&mut rng).with_random_tile(&mut rng);
    let seq = [Move::Left, Move::Up, Move::Right, Move::Down];
    for i in 0..32 {
        b = b.make_move(seq[i % seq.len()], &mut rng);
        boards.push(b.clone());
    }
    boards
}

fn bench_heuristic(c: &mut Criterion) {
    let boards = corpus();
    let weights = HeuristicWeights::default();
    c.bench_function("advisor/evaluate", |bch| {
        bch.iter(|| {
            let mut acc = 0f64;
            for bd in &boards {
                acc = acc.mul_add(1.000_000_1, evaluate(bd, &weights));
            }
            black_box(acc)
        })
    });
}

fn bench_best_move(c: &mut Criterion) {
    let boards = corpus();
    let mut advisor = Advisor::new();
    c.bench_function("advisor/best_move", |bch| {
        bch.iter(|| boards.iter().filter_map(|b| advisor.best_move(black_box(b))).count())
    });
}

criterion_group!(advisor, bench_heuristic, bench_best_move);
criterion_main!(advisor);
