//! Position representation: mailbox board plus piece bitboards, castling
//! rights, en-passant state, move counters and the incrementally maintained
//! Zobrist key.

use std::fmt;

use crate::attacks::{bishop_attacks, king_attacks, knight_attacks, pawn_attacks, rook_attacks};
use crate::bitboard::Bitboard;
use crate::types::*;
use crate::zobrist::ZOBRIST;

pub const CASTLE_WK: u8 = 1;
pub const CASTLE_WQ: u8 = 2;
pub const CASTLE_BK: u8 = 4;
pub const CASTLE_BQ: u8 = 8;

/// A malformed FEN string. The position under construction is discarded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FenError {
    FieldCount(usize),
    Board(String),
    SideToMove(String),
    Castling(char),
    EnPassant(String),
    Counter(String),
    KingCount,
}

impl fmt::Display for FenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FenError::FieldCount(n) => write!(f, "expected at least 4 FEN fields, got {n}"),
            FenError::Board(s) => write!(f, "invalid board field: {s}"),
            FenError::SideToMove(s) => write!(f, "invalid side to move: {s}"),
            FenError::Castling(c) => write!(f, "invalid castling character: {c}"),
            FenError::EnPassant(s) => write!(f, "invalid en-passant square: {s}"),
            FenError::Counter(s) => write!(f, "invalid move counter: {s}"),
            FenError::KingCount => write!(f, "each side must have exactly one king"),
        }
    }
}

impl std::error::Error for FenError {}

/// A move that is not legal in the current position. State is unchanged.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IllegalMove;

impl fmt::Display for IllegalMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "illegal move")
    }
}

impl std::error::Error for IllegalMove {}

/// Per-piece occupancy sets, kept in lockstep with the mailbox board.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BitboardSet {
    pieces: [[Bitboard; 6]; 2],
    colors: [Bitboard; 2],
}

impl BitboardSet {
    #[inline(always)]
    pub fn pieces(&self, color: Color, kind: PieceKind) -> Bitboard {
        self.pieces[color.idx()][kind.idx()]
    }

    #[inline(always)]
    pub fn color(&self, color: Color) -> Bitboard {
        self.colors[color.idx()]
    }

    #[inline(always)]
    pub fn occupied(&self) -> Bitboard {
        self.colors[0] | self.colors[1]
    }

    #[inline(always)]
    fn set(&mut self, pc: Piece, sq: u8) {
        self.pieces[pc.color.idx()][pc.kind.idx()].set(sq);
        self.colors[pc.color.idx()].set(sq);
    }

    #[inline(always)]
    fn clear(&mut self, pc: Piece, sq: u8) {
        self.pieces[pc.color.idx()][pc.kind.idx()].clear(sq);
        self.colors[pc.color.idx()].clear(sq);
    }
}

/// Everything `make_move` mutates, captured for `unmake_move`.
#[derive(Clone, Debug)]
pub struct Undo {
    captured: Option<Piece>,
    /// True capture square; differs from the move target only for en passant.
    captured_sq: u8,
    castling: u8,
    en_passant: Option<u8>,
    halfmove_clock: u32,
    fullmove_number: u32,
    key: u64,
    moved: Piece,
    rook_move: Option<(u8, u8)>,
    pub was_castle: bool,
    pub was_en_passant: bool,
    pub was_promotion: bool,
}

/// Undo record for a null move.
#[derive(Clone, Copy, Debug)]
pub struct NullUndo {
    en_passant: Option<u8>,
    key: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Position {
    pub board: [Option<Piece>; 64],
    pub bitboards: BitboardSet,
    pub side_to_move: Color,
    pub castling: u8,
    /// Square behind a pawn that just advanced two ranks.
    pub en_passant: Option<u8>,
    pub halfmove_clock: u32,
    pub fullmove_number: u32,
    key: u64,
    /// Zobrist keys of every position since the game root, this one last.
    key_history: Vec<u64>,
}

impl Position {
    pub fn startpos() -> Self {
        let mut p = Position {
            board: [None; 64],
            bitboards: BitboardSet::default(),
            side_to_move: Color::White,
            castling: CASTLE_WK | CASTLE_WQ | CASTLE_BK | CASTLE_BQ,
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
            key: 0,
            key_history: Vec::new(),
        };

        let back = [
            PieceKind::Rook,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Queen,
            PieceKind::King,
            PieceKind::Bishop,
            PieceKind::Knight,
            PieceKind::Rook,
        ];
        for (f, &kind) in back.iter().enumerate() {
            let f = f as u8;
            p.put_piece(f, Piece { color: Color::White, kind });
            p.put_piece(8 + f, Piece { color: Color::White, kind: PieceKind::Pawn });
            p.put_piece(48 + f, Piece { color: Color::Black, kind: PieceKind::Pawn });
            p.put_piece(56 + f, Piece { color: Color::Black, kind });
        }

        p.key = p.position_hash();
        p.key_history.push(p.key);
        p
    }

    /// Parse the standard six-field FEN form. The two counters may be
    /// omitted, defaulting to `0 1`, as in most test corpora.
    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        let parts: Vec<&str> = fen.split_whitespace().collect();
        if parts.len() < 4 {
            return Err(FenError::FieldCount(parts.len()));
        }

        let mut p = Position {
            board: [None; 64],
            bitboards: BitboardSet::default(),
            side_to_move: Color::White,
            castling: 0,
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
            key: 0,
            key_history: Vec::new(),
        };

        let ranks: Vec<&str> = parts[0].split('/').collect();
        if ranks.len() != 8 {
            return Err(FenError::Board(format!("{} ranks", ranks.len())));
        }
        for (rank_idx, rank_str) in ranks.iter().enumerate() {
            let rank = 7 - rank_idx as i8; // FEN lists rank 8 first
            let mut file: i8 = 0;
            for ch in rank_str.chars() {
                if let Some(d) = ch.to_digit(10) {
                    if d == 0 {
                        return Err(FenError::Board(format!("bad digit in rank: {rank_str}")));
                    }
                    file += d as i8;
                } else {
                    let color = if ch.is_uppercase() { Color::White } else { Color::Black };
                    let kind = match ch.to_ascii_lowercase() {
                        'p' => PieceKind::Pawn,
                        'n' => PieceKind::Knight,
                        'b' => PieceKind::Bishop,
                        'r' => PieceKind::Rook,
                        'q' => PieceKind::Queen,
                        'k' => PieceKind::King,
                        _ => return Err(FenError::Board(format!("bad piece char: {ch}"))),
                    };
                    let Some(sq) = sq(file, rank) else {
                        return Err(FenError::Board(format!("overfull rank: {rank_str}")));
                    };
                    p.put_piece(sq, Piece { color, kind });
                    file += 1;
                }
                if file > 8 {
                    return Err(FenError::Board(format!("overfull rank: {rank_str}")));
                }
            }
            if file != 8 {
                return Err(FenError::Board(format!("short rank: {rank_str}")));
            }
        }

        if p.bitboards.pieces(Color::White, PieceKind::King).popcount() != 1
            || p.bitboards.pieces(Color::Black, PieceKind::King).popcount() != 1
        {
            return Err(FenError::KingCount);
        }

        p.side_to_move = match parts[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(FenError::SideToMove(other.to_string())),
        };

        if parts[2] != "-" {
            for c in parts[2].chars() {
                p.castling |= match c {
                    'K' => CASTLE_WK,
                    'Q' => CASTLE_WQ,
                    'k' => CASTLE_BK,
                    'q' => CASTLE_BQ,
                    _ => return Err(FenError::Castling(c)),
                };
            }
        }

        if parts[3] != "-" {
            let Some(ep) = coord_to_sq(parts[3]) else {
                return Err(FenError::EnPassant(parts[3].to_string()));
            };
            if rank_of(ep) != 2 && rank_of(ep) != 5 {
                return Err(FenError::EnPassant(parts[3].to_string()));
            }
            p.en_passant = Some(ep);
        }

        let halfmove = parts.get(4).copied().unwrap_or("0");
        let fullmove = parts.get(5).copied().unwrap_or("1");
        p.halfmove_clock = halfmove
            .parse()
            .map_err(|_| FenError::Counter(halfmove.to_string()))?;
        p.fullmove_number = fullmove
            .parse()
            .map_err(|_| FenError::Counter(fullmove.to_string()))?;

        p.key = p.position_hash();
        p.key_history.push(p.key);
        Ok(p)
    }

    /// Emit the six-field FEN form.
    pub fn to_fen(&self) -> String {
        let mut out = String::new();
        for rank in (0..8).rev() {
            let mut empty = 0;
            for file in 0..8 {
                match self.board[(rank * 8 + file) as usize] {
                    None => empty += 1,
                    Some(pc) => {
                        if empty > 0 {
                            out.push_str(&empty.to_string());
                            empty = 0;
                        }
                        let ch = match pc.kind {
                            PieceKind::Pawn => 'p',
                            PieceKind::Knight => 'n',
                            PieceKind::Bishop => 'b',
                            PieceKind::Rook => 'r',
                            PieceKind::Queen => 'q',
                            PieceKind::King => 'k',
                        };
                        out.push(if pc.color == Color::White {
                            ch.to_ascii_uppercase()
                        } else {
                            ch
                        });
                    }
                }
            }
            if empty > 0 {
                out.push_str(&empty.to_string());
            }
            if rank > 0 {
                out.push('/');
            }
        }

        out.push(' ');
        out.push(if self.side_to_move == Color::White { 'w' } else { 'b' });

        out.push(' ');
        if self.castling == 0 {
            out.push('-');
        } else {
            for (right, ch) in [
                (CASTLE_WK, 'K'),
                (CASTLE_WQ, 'Q'),
                (CASTLE_BK, 'k'),
                (CASTLE_BQ, 'q'),
            ] {
                if self.castling & right != 0 {
                    out.push(ch);
                }
            }
        }

        out.push(' ');
        match self.en_passant {
            Some(ep) => out.push_str(&sq_to_coord(ep)),
            None => out.push('-'),
        }

        out.push_str(&format!(" {} {}", self.halfmove_clock, self.fullmove_number));
        out
    }

    #[inline(always)]
    pub fn piece_at(&self, sq: u8) -> Option<Piece> {
        self.board[sq as usize]
    }

    /// The incrementally maintained Zobrist key.
    #[inline(always)]
    pub fn key(&self) -> u64 {
        self.key
    }

    pub fn king_sq(&self, color: Color) -> Option<u8> {
        self.bitboards.pieces(color, PieceKind::King).lsb()
    }

    /// Recompute the Zobrist key from scratch. Test oracle for `key()`.
    pub fn position_hash(&self) -> u64 {
        let mut h = 0u64;
        for sq in 0..64u8 {
            if let Some(pc) = self.board[sq as usize] {
                h ^= ZOBRIST.piece_key(pc, sq);
            }
        }
        h ^= ZOBRIST.castling_key(self.castling);
        if let Some(ep) = self.en_passant {
            h ^= ZOBRIST.ep_key(ep % 8);
        }
        if self.side_to_move == Color::Black {
            h ^= ZOBRIST.side_to_move;
        }
        h
    }

    pub fn is_square_attacked(&self, target: u8, by: Color) -> bool {
        let bbs = &self.bitboards;
        // A pawn of `by` attacks `target` iff it sits on a square the
        // opposite-colored pawn pattern reaches from `target`.
        if !(pawn_attacks(target, by.other()) & bbs.pieces(by, PieceKind::Pawn)).is_empty() {
            return true;
        }
        if !(knight_attacks(target) & bbs.pieces(by, PieceKind::Knight)).is_empty() {
            return true;
        }
        if !(king_attacks(target) & bbs.pieces(by, PieceKind::King)).is_empty() {
            return true;
        }
        let occupied = bbs.occupied();
        let diag = bbs.pieces(by, PieceKind::Bishop) | bbs.pieces(by, PieceKind::Queen);
        if !(bishop_attacks(target, occupied) & diag).is_empty() {
            return true;
        }
        let ortho = bbs.pieces(by, PieceKind::Rook) | bbs.pieces(by, PieceKind::Queen);
        !(rook_attacks(target, occupied) & ortho).is_empty()
    }

    pub fn in_check(&self, color: Color) -> bool {
        match self.king_sq(color) {
            Some(ksq) => self.is_square_attacked(ksq, color.other()),
            None => false,
        }
    }

    pub fn has_non_pawn_material(&self, color: Color) -> bool {
        let bbs = &self.bitboards;
        !(bbs.pieces(color, PieceKind::Knight)
            | bbs.pieces(color, PieceKind::Bishop)
            | bbs.pieces(color, PieceKind::Rook)
            | bbs.pieces(color, PieceKind::Queen))
        .is_empty()
    }

    /// Apply `mv` for the side to move. Fails with `IllegalMove`, leaving the
    /// position untouched, when `from` does not hold a piece of the mover,
    /// when the move would capture a king, or when the mover ends up in check.
    pub fn make_move(&mut self, mv: Move) -> Result<Undo, IllegalMove> {
        let us = self.side_to_move;
        let moved = match self.board[mv.from as usize] {
            Some(pc) if pc.color == us => pc,
            _ => return Err(IllegalMove),
        };
        if let Some(dst) = self.board[mv.to as usize]
            && (dst.color == us || dst.kind == PieceKind::King)
        {
            return Err(IllegalMove);
        }

        let mut undo = Undo {
            captured: None,
            captured_sq: mv.to,
            castling: self.castling,
            en_passant: self.en_passant,
            halfmove_clock: self.halfmove_clock,
            fullmove_number: self.fullmove_number,
            key: self.key,
            moved,
            rook_move: None,
            was_castle: false,
            was_en_passant: false,
            was_promotion: false,
        };

        if let Some(ep) = self.en_passant.take() {
            self.key ^= ZOBRIST.ep_key(ep % 8);
        }

        let mut reset_clock = moved.kind == PieceKind::Pawn;

        // En passant: a pawn capturing onto the old target square, which is
        // empty; the captured pawn stands behind it.
        if moved.kind == PieceKind::Pawn
            && Some(mv.to) == undo.en_passant
            && file_of(mv.from) != file_of(mv.to)
            && self.board[mv.to as usize].is_none()
        {
            let cap_sq = match us {
                Color::White => mv.to - 8,
                Color::Black => mv.to + 8,
            };
            undo.captured = self.remove_piece(cap_sq);
            undo.captured_sq = cap_sq;
            undo.was_en_passant = true;
            reset_clock = true;
        } else if self.board[mv.to as usize].is_some() {
            undo.captured = self.remove_piece(mv.to);
            reset_clock = true;
        }

        self.remove_piece(mv.from);

        let last_rank = match us {
            Color::White => 7,
            Color::Black => 0,
        };
        if moved.kind == PieceKind::Pawn && rank_of(mv.to) == last_rank {
            let kind = mv.promo.unwrap_or(PieceKind::Queen);
            self.put_piece(mv.to, Piece { color: us, kind });
            undo.was_promotion = true;
        } else {
            self.put_piece(mv.to, moved);
        }

        // Castling: the two-square king move co-moves the rook.
        if moved.kind == PieceKind::King {
            let rook_squares = match (mv.from, mv.to) {
                (4, 6) => Some((7u8, 5u8)),
                (4, 2) => Some((0, 3)),
                (60, 62) => Some((63, 61)),
                (60, 58) => Some((56, 59)),
                _ => None,
            };
            if let Some((rf, rt)) = rook_squares
                && let Some(rook) = self.remove_piece(rf)
            {
                self.put_piece(rt, rook);
                undo.rook_move = Some((rf, rt));
                undo.was_castle = true;
            }
        }

        // A double push opens en passant on the traversed square.
        if moved.kind == PieceKind::Pawn && mv.from.abs_diff(mv.to) == 16 {
            let ep = (mv.from + mv.to) / 2;
            self.en_passant = Some(ep);
            self.key ^= ZOBRIST.ep_key(ep % 8);
        }

        // Rights are lost when the king moves, a rook leaves its corner, or
        // any piece arrives on a corner.
        self.key ^= ZOBRIST.castling_key(self.castling);
        if moved.kind == PieceKind::King {
            self.castling &= match us {
                Color::White => !(CASTLE_WK | CASTLE_WQ),
                Color::Black => !(CASTLE_BK | CASTLE_BQ),
            };
        }
        for (corner, right) in [
            (0, CASTLE_WQ),
            (7, CASTLE_WK),
            (56, CASTLE_BQ),
            (63, CASTLE_BK),
        ] {
            if mv.from == corner || mv.to == corner {
                self.castling &= !right;
            }
        }
        self.key ^= ZOBRIST.castling_key(self.castling);

        self.halfmove_clock = if reset_clock { 0 } else { self.halfmove_clock + 1 };
        if us == Color::Black {
            self.fullmove_number += 1;
        }
        self.side_to_move = us.other();
        self.key ^= ZOBRIST.side_to_move;

        if self.in_check(us) {
            self.restore(mv, &undo);
            return Err(IllegalMove);
        }

        self.key_history.push(self.key);
        Ok(undo)
    }

    pub fn unmake_move(&mut self, mv: Move, undo: Undo) {
        self.key_history.pop();
        self.restore(mv, &undo);
    }

    fn restore(&mut self, mv: Move, undo: &Undo) {
        self.side_to_move = self.side_to_move.other();
        self.castling = undo.castling;
        self.en_passant = undo.en_passant;
        self.halfmove_clock = undo.halfmove_clock;
        self.fullmove_number = undo.fullmove_number;

        if let Some((rf, rt)) = undo.rook_move
            && let Some(rook) = self.remove_piece(rt)
        {
            self.put_piece(rf, rook);
        }

        // Putting the original piece back also reverts a promotion.
        self.remove_piece(mv.to);
        self.put_piece(mv.from, undo.moved);

        if let Some(captured) = undo.captured {
            self.put_piece(undo.captured_sq, captured);
        }

        // Last: the piece shuffles above XOR-ed into the key.
        self.key = undo.key;
    }

    /// Pass the turn. Only the searcher uses this; the key stays consistent
    /// and applying a second null move restores it exactly.
    pub fn make_null_move(&mut self) -> NullUndo {
        let undo = NullUndo {
            en_passant: self.en_passant,
            key: self.key,
        };
        if let Some(ep) = self.en_passant.take() {
            self.key ^= ZOBRIST.ep_key(ep % 8);
        }
        self.side_to_move = self.side_to_move.other();
        self.key ^= ZOBRIST.side_to_move;
        undo
    }

    pub fn unmake_null_move(&mut self, undo: NullUndo) {
        self.side_to_move = self.side_to_move.other();
        self.en_passant = undo.en_passant;
        self.key = undo.key;
    }

    pub fn is_fifty_move_draw(&self) -> bool {
        self.halfmove_clock >= 100
    }

    /// Threefold repetition over the keys recorded since the last
    /// irreversible move (the halfmove clock bounds the window).
    pub fn is_repetition_draw(&self) -> bool {
        let window = (self.halfmove_clock as usize + 1).min(self.key_history.len());
        let start = self.key_history.len() - window;
        self.key_history[start..]
            .iter()
            .filter(|&&k| k == self.key)
            .count()
            >= 3
    }

    pub fn is_insufficient_material(&self) -> bool {
        let bbs = &self.bitboards;
        let heavy = bbs.pieces(Color::White, PieceKind::Pawn)
            | bbs.pieces(Color::Black, PieceKind::Pawn)
            | bbs.pieces(Color::White, PieceKind::Rook)
            | bbs.pieces(Color::Black, PieceKind::Rook)
            | bbs.pieces(Color::White, PieceKind::Queen)
            | bbs.pieces(Color::Black, PieceKind::Queen);
        if !heavy.is_empty() {
            return false;
        }

        let knights =
            bbs.pieces(Color::White, PieceKind::Knight) | bbs.pieces(Color::Black, PieceKind::Knight);
        let white_bishops = bbs.pieces(Color::White, PieceKind::Bishop);
        let black_bishops = bbs.pieces(Color::Black, PieceKind::Bishop);
        let minors = knights.popcount() + white_bishops.popcount() + black_bishops.popcount();

        match minors {
            0 | 1 => true,
            // One bishop each on same-colored squares cannot force mate.
            2 if knights.is_empty() && white_bishops.popcount() == 1 => {
                let same_shade = |bb: Bitboard| {
                    bb.lsb()
                        .map(|s| (file_of(s) + rank_of(s)) % 2)
                        .unwrap_or(0)
                };
                same_shade(white_bishops) == same_shade(black_bishops)
            }
            _ => false,
        }
    }

    #[inline(always)]
    fn put_piece(&mut self, sq: u8, pc: Piece) {
        self.board[sq as usize] = Some(pc);
        self.bitboards.set(pc, sq);
        self.key ^= ZOBRIST.piece_key(pc, sq);
    }

    #[inline(always)]
    fn remove_piece(&mut self, sq: u8) -> Option<Piece> {
        let pc = self.board[sq as usize].take()?;
        self.bitboards.clear(pc, sq);
        self.key ^= ZOBRIST.piece_key(pc, sq);
        Some(pc)
    }
}

#[cfg(test)]
#[path = "board_tests.rs"]
mod board_tests;
