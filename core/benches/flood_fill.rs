//! Flood fill and whole-round benchmarks

use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use sweeper_core::{Board, EngineSettings, GameEngine, Level, MineLayout};

fn bench_expand_mineless(c: &mut Criterion) {
    c.bench_function("expand_mineless_12x12", |b| {
        b.iter(|| {
            let mut board = Board::new(12);
            black_box(board.expand(black_box((6, 6))))
        })
    });
}

fn bench_expand_walled(c: &mut Criterion) {
    // a diagonal of mines leaves two large regions to fill
    let diagonal: Vec<_> = (0..12).map(|i| (i, i)).collect();
    let layout = MineLayout::from_mine_coords(12, &diagonal).unwrap();
    let mut template = Board::new(12);
    template.lay_mines(&layout);
    template.recount();

    c.bench_function("expand_walled_12x12", |b| {
        b.iter(|| {
            let mut board = template.clone();
            black_box(board.expand(black_box((11, 0))))
        })
    });
}

fn bench_first_reveal(c: &mut Criterion) {
    let settings = EngineSettings {
        seed: Some(42),
        ..Default::default()
    };

    c.bench_function("expert_first_reveal", |b| {
        b.iter(|| {
            let mut engine = GameEngine::with_settings(Level::Expert.config(), settings.clone())
                .unwrap();
            black_box(engine.reveal_cell(black_box(6), black_box(6)).unwrap())
        })
    });
}

criterion_group!(
    benches,
    bench_expand_mineless,
    bench_expand_walled,
    bench_first_reveal
);
criterion_main!(benches);
