use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use chessuranga::board::movegen::perft;
use chessuranga::board::position::Position;
use chessuranga::board::types::Move;
use chessuranga::game::config::{GameConfig, GameMode};
use chessuranga::game::orchestrator::Game;

#[derive(Clone, Copy)]
struct BenchCase {
    name: &'static str,
    fen: &'static str,
    expected_nodes: &'static [u64],
}

const CASES: &[BenchCase] = &[
    BenchCase {
        name: "startpos",
        fen: "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        expected_nodes: &[20, 400, 8902],
    },
    BenchCase {
        name: "kiwipete",
        fen: "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 0",
        expected_nodes: &[48, 2039],
    },
    BenchCase {
        name: "endgame",
        fen: "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
        expected_nodes: &[14, 191, 2812],
    },
];

/// Italian opening with both sides castling, every move through the overlay
/// pipeline.
const SCRIPT: &[&str] = &[
    "e2e4", "e7e5", "g1f3", "b8c6", "f1c4", "f8c5", "e1g1", "g8f6", "d2d3", "e8g8", "c2c3",
    "d7d6", "b1d2", "a7a6",
];

fn bench_perft(c: &mut Criterion) {
    let mut group = c.benchmark_group("perft");
    group.warm_up_time(Duration::from_secs(1));
    group.measurement_time(Duration::from_secs(4));
    group.sample_size(20);

    for case in CASES {
        let position = Position::from_fen(case.fen).expect("benchmark FEN should parse");

        for (depth_idx, expected_nodes) in case.expected_nodes.iter().enumerate() {
            let depth = (depth_idx + 1) as u8;
            assert_eq!(
                perft(&position, depth),
                *expected_nodes,
                "node mismatch for {} depth {}",
                case.name,
                depth
            );

            group.throughput(Throughput::Elements(*expected_nodes));
            group.bench_with_input(
                BenchmarkId::from_parameter(format!("{}_d{}", case.name, depth)),
                expected_nodes,
                |b, expected| {
                    b.iter(|| {
                        let nodes = perft(black_box(&position), black_box(depth));
                        assert_eq!(nodes, *expected);
                        black_box(nodes)
                    });
                },
            );
        }
    }

    group.finish();
}

fn bench_pipeline(c: &mut Criterion) {
    let moves: Vec<Move> = SCRIPT
        .iter()
        .map(|text| text.parse().expect("scripted move should parse"))
        .collect();

    let mut group = c.benchmark_group("pipeline");
    group.throughput(Throughput::Elements(moves.len() as u64));
    group.bench_function("scripted_opening", |b| {
        b.iter(|| {
            let mut game = Game::new(GameConfig::default());
            game.start(GameMode::Standard);
            for mv in &moves {
                game.attempt_move(black_box(*mv))
                    .expect("scripted move should be accepted");
            }
            black_box(game.drain_events().len())
        });
    });

    group.bench_function("horde_allowed_moves", |b| {
        let mut game = Game::new(GameConfig::default());
        game.start(GameMode::Horde);
        game.attempt_move(moves[0]).expect("opening move");
        b.iter(|| black_box(game.bot_allowed_moves().len()));
    });
    group.finish();
}

criterion_group!(overlay_benches, bench_perft, bench_pipeline);
criterion_main!(overlay_benches);
