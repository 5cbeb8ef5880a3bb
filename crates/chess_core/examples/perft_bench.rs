//! Perft benchmark for profiling with cargo-flamegraph.
//!
//! Usage:
//!   cargo flamegraph --example perft_bench -p chess_core -- [depth] [fen]

use chess_core::{Position, perft};
use std::env;
use std::time::Instant;

const TEST_POSITIONS: &[(&str, &str)] = &[
    (
        "Starting position",
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
    ),
    (
        "Kiwipete",
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq -",
    ),
    ("Position 3", "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - -"),
    (
        "Position 4",
        "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq -",
    ),
    (
        "Position 5",
        "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ -",
    ),
];

fn run(name: &str, fen: &str, depth: u8) {
    let mut pos = match Position::from_fen(fen) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("bad FEN for {name}: {e}");
            return;
        }
    };
    let start = Instant::now();
    let nodes = perft(&mut pos, depth);
    let elapsed = start.elapsed();
    println!(
        "{name}: depth {depth} -> {nodes} nodes in {elapsed:.3?} ({:.1} Mn/s)",
        (nodes as f64 / 1_000_000.0) / elapsed.as_secs_f64()
    );
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let depth: u8 = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(5);

    if let Some(fen) = args.get(2) {
        run("Custom position", fen, depth);
        return;
    }

    for (name, fen) in TEST_POSITIONS {
        run(name, fen, depth);
    }
}
