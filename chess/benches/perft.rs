use criterion::{black_box, criterion_group, criterion_main, Criterion};
use finchess::{movegen, pgn::GameParser, Color, Coord, Position};

const BOARDS: [(&str, &str); 6] = [
    (
        "initial",
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
    ),
    (
        "sicilian",
        "r1b1k2r/2qnbppp/p2ppn2/1p4B1/3NPPP1/2N2Q2/PPP4P/2KR1B1R w kq - 0 11",
    ),
    (
        "middle",
        "1rq1r1k1/1p3ppp/pB3n2/3ppP2/Pbb1P3/1PN2B2/2P2QPP/R1R4K w - - 1 21",
    ),
    (
        "open_position",
        "4r1k1/3R1ppp/8/5P2/p7/6PP/4pK2/1rN1B3 w - - 4 43",
    ),
    ("pawn_attack", "4k3/8/8/pppppppp/PPPPPPPP/8/8/4K3 w - - 0 1"),
    (
        "pawn_promote",
        "8/PPPPPPPP/8/2k1K3/8/8/pppppppp/8 w - - 0 1",
    ),
];

fn boards() -> impl Iterator<Item = (&'static str, Position)> {
    BOARDS
        .iter()
        .map(|&(name, fen)| (name, Position::from_fen(fen).unwrap()))
}

fn bench_gen_moves(c: &mut Criterion) {
    let mut group = c.benchmark_group("gen_moves");
    for (name, pos) in boards() {
        group.bench_function(name, |b| {
            b.iter(|| black_box(movegen::legal_moves(&pos).len()))
        });
    }
}

fn bench_make_move(c: &mut Criterion) {
    let mut group = c.benchmark_group("make_move");
    for (name, pos) in boards() {
        let moves = movegen::legal_moves(&pos);
        group.bench_function(name, |b| {
            b.iter(|| {
                for &mv in &moves {
                    black_box(pos.make(mv).is_ok());
                }
            })
        });
    }
}

fn bench_is_attacked(c: &mut Criterion) {
    let mut group = c.benchmark_group("is_attacked");
    for (name, pos) in boards() {
        group.bench_function(name, |b| {
            b.iter(|| {
                for color in [Color::White, Color::Black] {
                    for coord in Coord::iter() {
                        black_box(movegen::is_attacked(&pos, coord, color));
                    }
                }
            })
        });
    }
}

fn bench_perft(c: &mut Criterion) {
    let mut group = c.benchmark_group("perft");
    group.sample_size(10);
    for (name, pos) in boards() {
        group.bench_function(name, |b| b.iter(|| black_box(movegen::perft(&pos, 3))));
    }
}

fn bench_parse_game(c: &mut Criterion) {
    const GAME: &str = "1. e4 e5 2. Nf3 Nc6 3. Bb5 a6 4. Ba4 Nf6 5. O-O Be7 \
        6. Re1 b5 7. Bb3 d6 8. c3 O-O 9. h3 Nb8 10. d4 Nbd7 1/2-1/2";

    struct Ignore;

    impl finchess::pgn::MoveListener for Ignore {
        fn on_move(
            &mut self,
            _pos: &Position,
            _san: &str,
            _suffix: &str,
        ) -> std::ops::ControlFlow<()> {
            std::ops::ControlFlow::Continue(())
        }
    }

    c.bench_function("parse_game", |b| {
        b.iter(|| {
            let mut parser = GameParser::new();
            black_box(parser.parse(GAME, &mut Ignore).unwrap())
        })
    });
}

criterion_group!(
    perft,
    bench_gen_moves,
    bench_make_move,
    bench_is_attacked,
    bench_perft,
    bench_parse_game,
);

criterion_main!(perft);
