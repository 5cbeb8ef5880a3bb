//! Material and structure evaluation.
//!
//! The default `Evaluate` backend: material with a knight piece-square table,
//! piece-pair bonuses, pawn-structure penalties, a phase-dependent king term
//! and tempo. Scores are centipawns from the side-to-move's perspective.

use chess_core::{Color, Evaluate, PieceKind, Position, file_of, rank_of};

/// Material value in centipawns, also used by move ordering and the
/// quiescence exchange estimate.
#[inline]
pub fn piece_value(kind: PieceKind) -> i32 {
    match kind {
        PieceKind::Pawn => 100,
        PieceKind::Knight => 320,
        PieceKind::Bishop => 330,
        PieceKind::Rook => 500,
        PieceKind::Queen => 900,
        PieceKind::King => 0,
    }
}

/// Tunable evaluation terms.
#[derive(Debug, Clone)]
pub struct EvalParams {
    pub bishop_pair_bonus: i32,
    pub rook_pair_bonus: i32,
    pub minor_vs_major_imbalance: i32,
    pub doubled_pawn_penalty: i32,
    pub isolated_pawn_penalty: i32,
    pub backward_pawn_penalty: i32,
    pub king_safety_bonus: i32,
    pub endgame_king_activity_bonus: i32,
    pub opening_mobility_bonus: i32,
    pub tempo_bonus: i32,
}

impl Default for EvalParams {
    fn default() -> Self {
        Self {
            bishop_pair_bonus: 30,
            rook_pair_bonus: 12,
            minor_vs_major_imbalance: 6,
            doubled_pawn_penalty: 12,
            isolated_pawn_penalty: 10,
            backward_pawn_penalty: 6,
            king_safety_bonus: 4,
            endgame_king_activity_bonus: 6,
            opening_mobility_bonus: 3,
            tempo_bonus: 10,
        }
    }
}

#[rustfmt::skip]
const KNIGHT_PST: [i32; 64] = [
    -50, -40, -30, -30, -30, -30, -40, -50,
    -40, -20,   0,   5,   5,   0, -20, -40,
    -30,   5,  10,  15,  15,  10,   5, -30,
    -30,   0,  15,  20,  20,  15,   0, -30,
    -30,   5,  15,  20,  20,  15,   5, -30,
    -30,   0,  10,  15,  15,  10,   0, -30,
    -40, -20,   0,   0,   0,   0, -20, -40,
    -50, -40, -30, -30, -30, -30, -40, -50,
];

#[inline]
fn pst(kind: PieceKind, sq: usize) -> i32 {
    match kind {
        PieceKind::Knight => KNIGHT_PST[sq],
        _ => 0,
    }
}

/// The default material evaluator.
#[derive(Debug, Clone, Default)]
pub struct MaterialEval {
    pub params: EvalParams,
}

impl MaterialEval {
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Default)]
struct SideTally {
    bishops: i32,
    rooks: i32,
    minors: i32,
    majors: i32,
    king_sq: Option<u8>,
    pawns_by_file: [i32; 8],
}

impl Evaluate for MaterialEval {
    fn evaluate(&self, pos: &Position) -> i32 {
        let p = &self.params;
        let mut score = 0i32;
        let mut tally = [SideTally::default(), SideTally::default()];

        for sq in 0..64u8 {
            let Some(pc) = pos.piece_at(sq) else { continue };
            let white = pc.color == Color::White;
            // PSTs are written from white's point of view; mirror for black.
            let pst_sq = if white { sq as usize } else { (sq ^ 56) as usize };
            let term = piece_value(pc.kind) + pst(pc.kind, pst_sq);
            score += if white { term } else { -term };

            let t = &mut tally[pc.color.idx()];
            match pc.kind {
                PieceKind::Pawn => t.pawns_by_file[(sq % 8) as usize] += 1,
                PieceKind::Knight => t.minors += 1,
                PieceKind::Bishop => {
                    t.bishops += 1;
                    t.minors += 1;
                }
                PieceKind::Rook => {
                    t.rooks += 1;
                    t.majors += 1;
                }
                PieceKind::Queen => t.majors += 1,
                PieceKind::King => t.king_sq = Some(sq),
            }
        }

        let endgame = tally[0].majors + tally[1].majors <= 2;

        for color in [Color::White, Color::Black] {
            let t = &tally[color.idx()];
            let sign = if color == Color::White { 1 } else { -1 };

            let mut side = 0i32;
            if t.bishops >= 2 {
                side += p.bishop_pair_bonus;
            }
            if t.rooks >= 2 {
                side += p.rook_pair_bonus;
            }
            side += (t.minors - t.majors) * p.minor_vs_major_imbalance;
            side -= pawn_structure_penalty(t, p);
            side += king_term(pos, t, color, endgame, p);
            if !endgame {
                side += (t.minors + t.majors) * p.opening_mobility_bonus;
            }
            score += sign * side;
        }

        score += match pos.side_to_move {
            Color::White => p.tempo_bonus,
            Color::Black => -p.tempo_bonus,
        };

        if pos.side_to_move == Color::White { score } else { -score }
    }

    fn breakdown(&self, pos: &Position) -> String {
        let p = &self.params;
        format!(
            "eval={} stm={} bp={} tempo={}",
            self.evaluate(pos),
            if pos.side_to_move == Color::White { 'w' } else { 'b' },
            p.bishop_pair_bonus,
            p.tempo_bonus,
        )
    }
}

fn pawn_structure_penalty(t: &SideTally, p: &EvalParams) -> i32 {
    let mut penalty = 0;
    for file in 0..8usize {
        let count = t.pawns_by_file[file];
        if count <= 0 {
            continue;
        }

        if count > 1 {
            penalty += (count - 1) * p.doubled_pawn_penalty;
        }

        let has_left = file > 0 && t.pawns_by_file[file - 1] > 0;
        let has_right = file < 7 && t.pawns_by_file[file + 1] > 0;
        if !has_left && !has_right {
            penalty += count * p.isolated_pawn_penalty;
            // Center-file isolani are also structurally backward.
            if (2..=5).contains(&file) {
                penalty += count * p.backward_pawn_penalty;
            }
        }
    }
    penalty
}

fn king_term(pos: &Position, t: &SideTally, color: Color, endgame: bool, p: &EvalParams) -> i32 {
    let Some(ksq) = t.king_sq else { return 0 };
    let file = file_of(ksq);
    let rank = rank_of(ksq);

    if endgame {
        // Centralize the king once the heavy pieces are gone.
        let centralization = 6 - ((file - 3).abs() + (rank - 3).abs());
        return centralization as i32 * p.endgame_king_activity_bonus;
    }

    // Pawn shield in front of the king, weighed against drifting off the
    // back rank.
    let back_rank = match color {
        Color::White => 0,
        Color::Black => 7,
    };
    let shield_rank = match color {
        Color::White => rank + 1,
        Color::Black => rank - 1,
    };
    let mut shield = 0;
    for df in -1..=1 {
        if let Some(sq) = chess_core::sq(file + df, shield_rank)
            && let Some(pc) = pos.piece_at(sq)
            && pc.color == color
            && pc.kind == PieceKind::Pawn
        {
            shield += 1;
        }
    }
    (shield as i32 * 4 - (rank - back_rank).abs() as i32 * 2) * p.king_safety_bonus
}

#[cfg(test)]
#[path = "eval_tests.rs"]
mod eval_tests;
