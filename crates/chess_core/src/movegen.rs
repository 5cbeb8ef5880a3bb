//! Move generation.
//!
//! Pseudo-legal moves come from bitboard operations; legality is decided by
//! playing each move and rejecting those that leave the mover's king in
//! check. Ordering of the generated list is unspecified.

use crate::attacks::{bishop_attacks, king_attacks, knight_attacks, queen_attacks, rook_attacks};
use crate::bitboard::Bitboard;
use crate::board::{CASTLE_BK, CASTLE_BQ, CASTLE_WK, CASTLE_WQ, Position};
use crate::types::*;

/// Generate all legal moves, returning a freshly allocated vector.
pub fn legal_moves(pos: &Position) -> Vec<Move> {
    let mut tmp = pos.clone();
    let mut out = Vec::with_capacity(64);
    legal_moves_into(&mut tmp, &mut out);
    out
}

/// Generate all legal moves into the provided buffer, reusing it across
/// calls. The position is mutated transiently and restored.
pub fn legal_moves_into(pos: &mut Position, out: &mut Vec<Move>) {
    out.clear();
    pseudo_legal_moves(pos, out);

    out.retain(|&mv| match pos.make_move(mv) {
        Ok(undo) => {
            pos.unmake_move(mv, undo);
            true
        }
        Err(_) => false,
    });
}

/// Generate every move that is legal except possibly for king safety.
pub fn pseudo_legal_moves(pos: &Position, out: &mut Vec<Move>) {
    let us = pos.side_to_move;
    let our_pieces = pos.bitboards.color(us);
    let their_pieces = pos.bitboards.color(us.other());
    let occupied = pos.bitboards.occupied();

    gen_pawn_moves(pos, us, their_pieces, !occupied, out);
    gen_leaper_moves(pos, us, our_pieces, PieceKind::Knight, knight_attacks, out);
    gen_slider_moves(pos, us, our_pieces, occupied, PieceKind::Bishop, bishop_attacks, out);
    gen_slider_moves(pos, us, our_pieces, occupied, PieceKind::Rook, rook_attacks, out);
    gen_slider_moves(pos, us, our_pieces, occupied, PieceKind::Queen, queen_attacks, out);
    gen_leaper_moves(pos, us, our_pieces, PieceKind::King, king_attacks, out);
    gen_castling_moves(pos, us, occupied, out);
}

type ShiftFn = fn(Bitboard) -> Bitboard;

fn gen_pawn_moves(
    pos: &Position,
    us: Color,
    their_pieces: Bitboard,
    empty: Bitboard,
    out: &mut Vec<Move>,
) {
    let pawns = pos.bitboards.pieces(us, PieceKind::Pawn);

    let (push, start_rank, promo_rank, double_rank): (ShiftFn, Bitboard, Bitboard, Bitboard) =
        match us {
            Color::White => (
                Bitboard::north,
                Bitboard::RANK_2,
                Bitboard::RANK_8,
                Bitboard::RANK_4,
            ),
            Color::Black => (
                Bitboard::south,
                Bitboard::RANK_7,
                Bitboard::RANK_1,
                Bitboard::RANK_5,
            ),
        };
    let back: i8 = match us {
        Color::White => -8,
        Color::Black => 8,
    };

    let single_push = push(pawns) & empty;
    for to in single_push & !promo_rank {
        out.push(Move::new((to as i8 + back) as u8, to));
    }
    for to in single_push & promo_rank {
        add_promotions((to as i8 + back) as u8, to, out);
    }

    let double_push = push(push(pawns & start_rank) & empty) & empty & double_rank;
    for to in double_push {
        out.push(Move::new((to as i8 + 2 * back) as u8, to));
    }

    let (attack_west, attack_east): (ShiftFn, ShiftFn) = match us {
        Color::White => (Bitboard::north_west, Bitboard::north_east),
        Color::Black => (Bitboard::south_west, Bitboard::south_east),
    };
    let (back_west, back_east): (i8, i8) = match us {
        Color::White => (-7, -9),
        Color::Black => (9, 7),
    };

    for (attack, back) in [(attack_west, back_west), (attack_east, back_east)] {
        let captures = attack(pawns) & their_pieces;
        for to in captures & !promo_rank {
            out.push(Move::new((to as i8 + back) as u8, to));
        }
        for to in captures & promo_rank {
            add_promotions((to as i8 + back) as u8, to, out);
        }

        if let Some(ep) = pos.en_passant
            && attack(pawns).contains(ep)
        {
            out.push(Move::new((ep as i8 + back) as u8, ep));
        }
    }
}

#[inline]
fn add_promotions(from: u8, to: u8, out: &mut Vec<Move>) {
    for kind in [
        PieceKind::Queen,
        PieceKind::Rook,
        PieceKind::Bishop,
        PieceKind::Knight,
    ] {
        out.push(Move::promotion(from, to, kind));
    }
}

#[inline]
fn gen_leaper_moves(
    pos: &Position,
    us: Color,
    our_pieces: Bitboard,
    kind: PieceKind,
    attacks: fn(u8) -> Bitboard,
    out: &mut Vec<Move>,
) {
    for from in pos.bitboards.pieces(us, kind) {
        for to in attacks(from) & !our_pieces {
            out.push(Move::new(from, to));
        }
    }
}

#[inline]
fn gen_slider_moves(
    pos: &Position,
    us: Color,
    our_pieces: Bitboard,
    occupied: Bitboard,
    kind: PieceKind,
    attacks: fn(u8, Bitboard) -> Bitboard,
    out: &mut Vec<Move>,
) {
    for from in pos.bitboards.pieces(us, kind) {
        for to in attacks(from, occupied) & !our_pieces {
            out.push(Move::new(from, to));
        }
    }
}

/// Castling needs the right, an empty path, and the king's current, crossed
/// and destination squares all safe.
fn gen_castling_moves(pos: &Position, us: Color, occupied: Bitboard, out: &mut Vec<Move>) {
    let enemy = us.other();
    if pos.in_check(us) {
        return;
    }

    struct CastleLane {
        right: u8,
        path: Bitboard,
        safe: [u8; 2],
        king_move: (u8, u8),
    }

    let lanes: [CastleLane; 2] = match us {
        Color::White => [
            CastleLane {
                right: CASTLE_WK,
                path: Bitboard(0x60), // f1, g1
                safe: [5, 6],
                king_move: (4, 6),
            },
            CastleLane {
                right: CASTLE_WQ,
                path: Bitboard(0x0E), // b1, c1, d1
                safe: [3, 2],
                king_move: (4, 2),
            },
        ],
        Color::Black => [
            CastleLane {
                right: CASTLE_BK,
                path: Bitboard(0x6000_0000_0000_0000), // f8, g8
                safe: [61, 62],
                king_move: (60, 62),
            },
            CastleLane {
                right: CASTLE_BQ,
                path: Bitboard(0x0E00_0000_0000_0000), // b8, c8, d8
                safe: [59, 58],
                king_move: (60, 58),
            },
        ],
    };

    for lane in lanes {
        if pos.castling & lane.right != 0
            && (occupied & lane.path).is_empty()
            && !pos.is_square_attacked(lane.safe[0], enemy)
            && !pos.is_square_attacked(lane.safe[1], enemy)
        {
            out.push(Move::new(lane.king_move.0, lane.king_move.1));
        }
    }
}

#[cfg(test)]
#[path = "movegen_tests.rs"]
mod movegen_tests;
