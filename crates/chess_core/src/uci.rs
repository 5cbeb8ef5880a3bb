//! UCI move notation and the `position` command.

use std::fmt;

use crate::board::{FenError, Position};
use crate::movegen::legal_moves;
use crate::types::*;

pub fn move_to_uci(mv: Move) -> String {
    if mv.is_null() {
        return "0000".to_string();
    }
    let mut s = String::new();
    s.push_str(&sq_to_coord(mv.from));
    s.push_str(&sq_to_coord(mv.to));
    if let Some(p) = mv.promo {
        s.push(match p {
            PieceKind::Queen => 'q',
            PieceKind::Rook => 'r',
            PieceKind::Bishop => 'b',
            PieceKind::Knight => 'n',
            _ => 'q',
        });
    }
    s
}

/// Parse a UCI move and match it against the legal move list, so that only
/// moves playable in `pos` are accepted.
pub fn parse_uci_move(pos: &Position, txt: &str) -> Option<Move> {
    if txt.len() < 4 {
        return None;
    }
    let from = coord_to_sq(&txt[0..2])?;
    let to = coord_to_sq(&txt[2..4])?;
    let promo = match txt.as_bytes().get(4) {
        Some(b'q') | Some(b'Q') => Some(PieceKind::Queen),
        Some(b'r') | Some(b'R') => Some(PieceKind::Rook),
        Some(b'b') | Some(b'B') => Some(PieceKind::Bishop),
        Some(b'n') | Some(b'N') => Some(PieceKind::Knight),
        _ => None,
    };

    legal_moves(pos)
        .into_iter()
        .find(|m| m.from == from && m.to == to && m.promo == promo)
}

/// A failed `position` command. The current position is left untouched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PositionError {
    Fen(FenError),
    IllegalMove(String),
    Syntax(String),
}

impl fmt::Display for PositionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionError::Fen(e) => write!(f, "invalid fen: {e}"),
            PositionError::IllegalMove(m) => write!(f, "illegal move {m}"),
            PositionError::Syntax(s) => write!(f, "bad position command: {s}"),
        }
    }
}

impl std::error::Error for PositionError {}

/// Apply a `position {startpos|fen <fields>} [moves <uci>…]` command.
///
/// The new position is built on the side and only installed on success, so a
/// failed command has no effect.
pub fn set_position_from_uci(pos: &mut Position, args: &[&str]) -> Result<(), PositionError> {
    let next;
    let mut staged = match args.first() {
        Some(&"startpos") | None => {
            next = 1;
            Position::startpos()
        }
        Some(&"fen") => {
            let fen_end = args
                .iter()
                .position(|&a| a == "moves")
                .unwrap_or(args.len());
            next = fen_end;
            Position::from_fen(&args[1..fen_end].join(" ")).map_err(PositionError::Fen)?
        }
        Some(other) => return Err(PositionError::Syntax(other.to_string())),
    };

    if next < args.len() {
        if args[next] != "moves" {
            return Err(PositionError::Syntax(args[next].to_string()));
        }
        for txt in &args[next + 1..] {
            let mv = parse_uci_move(&staged, txt)
                .ok_or_else(|| PositionError::IllegalMove(txt.to_string()))?;
            staged
                .make_move(mv)
                .map_err(|_| PositionError::IllegalMove(txt.to_string()))?;
        }
    }

    *pos = staged;
    Ok(())
}

#[cfg(test)]
#[path = "uci_tests.rs"]
mod uci_tests;
