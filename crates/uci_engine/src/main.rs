//! UCI front-end binary.
//!
//! Line-oriented loop over stdin/stdout implementing the engine side of the
//! Universal Chess Interface: position setup, search with depth/time/node
//! limits, perft and bench for diagnostics. Recoverable errors (bad FEN,
//! illegal move) are reported as `info string` lines and leave the engine
//! state untouched.

use std::io::{self, BufRead, Write};
use std::time::{Duration, Instant};

use anyhow::Result;

use chess_core::{
    Color, Engine, Position, SearchLimits, SearchResult, allocate_move_time, legal_moves,
    move_to_uci, perft, pseudo_legal_moves, set_position_from_uci,
};
use classical_engine::ClassicalEngine;

const DEFAULT_GO_DEPTH: u8 = 8;
const MAX_GO_DEPTH: u8 = 64;

fn main() -> Result<()> {
    env_logger::init();

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    let mut pos = Position::startpos();
    let mut engine = ClassicalEngine::new();

    for line in stdin.lock().lines() {
        let line = line?;
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.is_empty() {
            continue;
        }

        match parts[0] {
            "uci" => {
                writeln!(stdout, "id name {}", engine.name())?;
                writeln!(stdout, "id author {}", engine.author())?;
                writeln!(stdout, "option name Hash type spin default 16 min 1 max 4096")?;
                writeln!(stdout, "option name UseNullMove type check default true")?;
                writeln!(stdout, "option name UseLMR type check default true")?;
                writeln!(stdout, "option name UseFutility type check default true")?;
                writeln!(stdout, "option name UseAspiration type check default true")?;
                writeln!(stdout, "option name UseIID type check default true")?;
                writeln!(stdout, "option name UseQuiescence type check default true")?;
                writeln!(stdout, "uciok")?;
                stdout.flush()?;
            }
            "isready" => {
                writeln!(stdout, "readyok")?;
                stdout.flush()?;
            }
            "setoption" => {
                if let Some((name, value)) = parse_setoption(&parts)
                    && !engine.set_option(name, value)
                {
                    writeln!(stdout, "info string unknown option {name}")?;
                }
            }
            "ucinewgame" => {
                pos = Position::startpos();
                engine.new_game();
            }
            "position" => {
                if let Err(e) = set_position_from_uci(&mut pos, &parts[1..]) {
                    writeln!(stdout, "info string {e}")?;
                    stdout.flush()?;
                }
            }
            "go" => {
                let limits = parse_go_limits(&parts, &pos);
                limits.start();
                let result = engine.search(&pos, limits);
                report_search(&mut stdout, &result)?;
            }
            "perft" => {
                let depth: u8 = parts.get(1).and_then(|s| s.parse().ok()).unwrap_or(5);
                let start = Instant::now();
                let nodes = perft(&mut pos.clone(), depth);
                writeln!(
                    stdout,
                    "info string perft depth {depth} nodes {nodes} time {}",
                    start.elapsed().as_millis()
                )?;
                stdout.flush()?;
            }
            "bench" => {
                let mut buf = Vec::new();
                pseudo_legal_moves(&pos, &mut buf);
                let legal = legal_moves(&pos).len();

                let start = Instant::now();
                let result = engine.search(&pos, SearchLimits::depth(6));
                let elapsed = start.elapsed().as_secs_f64().max(1e-6);
                writeln!(
                    stdout,
                    "info string bench movegen_pseudo={} movegen_legal={legal} \
                     search_nodes={} nps={:.0}",
                    buf.len(),
                    result.nodes,
                    result.nodes as f64 / elapsed
                )?;
                stdout.flush()?;
            }
            "stop" => {
                // Searches are run synchronously on this thread; by the time
                // a stop arrives here nothing is in flight.
            }
            "quit" => break,
            _ => {
                log::debug!("ignoring unknown command: {line}");
            }
        }
    }

    Ok(())
}

/// `setoption name <name...> value <value...>`
fn parse_setoption<'a>(parts: &[&'a str]) -> Option<(&'a str, &'a str)> {
    let name_at = parts.iter().position(|&p| p == "name")? + 1;
    let value_at = parts.iter().position(|&p| p == "value")?;
    if name_at >= parts.len() || value_at + 1 >= parts.len() {
        return None;
    }
    Some((parts[name_at], parts[value_at + 1]))
}

/// Translate `go` arguments into search limits. An explicit movetime wins;
/// otherwise the side-to-move's clock is divided into a per-move budget.
fn parse_go_limits(parts: &[&str], pos: &Position) -> SearchLimits {
    let field = |name: &str| -> Option<u64> {
        parts
            .iter()
            .position(|&p| p.eq_ignore_ascii_case(name))
            .and_then(|i| parts.get(i + 1))
            .and_then(|s| s.parse().ok())
    };

    let infinite = parts.iter().any(|&p| p == "infinite");
    let depth = field("depth").map(|d| (d as u8).clamp(1, MAX_GO_DEPTH));

    let move_time = if infinite {
        None
    } else if let Some(ms) = field("movetime") {
        Some(Duration::from_millis(ms))
    } else {
        let (time, inc) = match pos.side_to_move {
            Color::White => (field("wtime"), field("winc")),
            Color::Black => (field("btime"), field("binc")),
        };
        time.map(|ms| {
            allocate_move_time(
                Duration::from_millis(ms),
                Duration::from_millis(inc.unwrap_or(0)),
            )
        })
    };

    // In this synchronous front-end an "infinite" search is bounded by the
    // depth ceiling rather than a stop command arriving mid-search.
    let mut limits = match (depth, move_time) {
        _ if infinite => SearchLimits::depth(MAX_GO_DEPTH),
        (Some(d), Some(t)) => SearchLimits::depth_and_time(d, t),
        (Some(d), None) => SearchLimits::depth(d),
        (None, Some(t)) => SearchLimits::time(t),
        (None, None) => SearchLimits::depth(DEFAULT_GO_DEPTH),
    };
    if let Some(cap) = field("nodes") {
        limits = limits.with_node_cap(cap);
    }
    limits
}

fn report_search(stdout: &mut io::Stdout, result: &SearchResult) -> Result<()> {
    for info in &result.iterations {
        let pv: Vec<String> = info.pv.iter().map(|&m| move_to_uci(m)).collect();
        writeln!(
            stdout,
            "info depth {} score cp {} nodes {} time {} pv {}",
            info.depth,
            info.score,
            info.nodes,
            info.elapsed_ms,
            pv.join(" ")
        )?;
    }
    if !result.eval_breakdown.is_empty() {
        writeln!(stdout, "info string eval_breakdown {}", result.eval_breakdown)?;
    }

    match result.best_move {
        Some(best) => {
            let best = move_to_uci(best);
            match result.ponder {
                Some(p) => writeln!(stdout, "bestmove {best} ponder {}", move_to_uci(p))?,
                None => writeln!(stdout, "bestmove {best}")?,
            }
        }
        None => writeln!(stdout, "bestmove 0000")?,
    }
    stdout.flush()?;
    Ok(())
}
