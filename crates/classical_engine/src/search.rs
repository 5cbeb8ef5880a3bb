//! Iterative-deepening negamax search with alpha-beta pruning.
//!
//! The searcher is fail-soft and single-threaded. It owns its ordering
//! tables for the duration of one `think` call, shares the transposition
//! table across calls, and polls the abort conditions at every node so a
//! stop request or an exhausted budget returns promptly without touching
//! the table again.

use std::time::Instant;

use chess_core::{
    Color, Evaluate, IterationInfo, Move, PieceKind, Position, SearchLimits, SearchResult,
    legal_moves, legal_moves_into, move_to_uci, pseudo_legal_moves, rank_of,
};

use crate::ordering::{
    COUNTER_MOVE_SCORE, CounterMoveTable, HistoryTable, KILLER_PRIMARY_SCORE,
    KILLER_SECONDARY_SCORE, KillerTable, LOSING_CAPTURE_SCORE, PROMO_SCORE, PvTable,
    TT_MOVE_SCORE, WINNING_CAPTURE_SCORE, capture_exchange, capture_order_score, is_capture,
};
use crate::tt::{Bound, TranspositionTable, score_from_tt, score_to_tt};
use crate::eval::piece_value;

pub const INF: i32 = 1_000_000;
pub const MATE: i32 = 900_000;
pub const MAX_PLY: usize = 120;

const ASPIRATION_BASE: i32 = 18;
const ASPIRATION_SLOPE: i32 = 8;
const NULL_MOVE_MIN_DEPTH: i32 = 3;
const IID_MIN_DEPTH: i32 = 6;
const REVERSE_FUTILITY_MARGIN: i32 = 120;
const FUTILITY_MARGIN: i32 = 80;
const QS_EXCHANGE_FLOOR: i32 = -200;
const QS_DELTA_MARGIN: i32 = 200;

/// Feature switches for the search refinements. All on by default; tests
/// turn them off to compare against plain minimax.
#[derive(Clone, Copy, Debug)]
pub struct SearchOptions {
    pub aspiration: bool,
    pub null_move: bool,
    pub lmr: bool,
    pub futility: bool,
    pub iid: bool,
    pub quiescence: bool,
    pub extensions: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            aspiration: true,
            null_move: true,
            lmr: true,
            futility: true,
            iid: true,
            quiescence: true,
            extensions: true,
        }
    }
}

impl SearchOptions {
    /// Every refinement off: bare fixed-depth alpha-beta over the evaluator.
    pub fn minimal() -> Self {
        Self {
            aspiration: false,
            null_move: false,
            lmr: false,
            futility: false,
            iid: false,
            quiescence: false,
            extensions: false,
        }
    }
}

pub struct Searcher<'a> {
    eval: &'a dyn Evaluate,
    tt: &'a mut TranspositionTable,
    options: SearchOptions,
    limits: SearchLimits,
    killers: KillerTable,
    history: HistoryTable,
    counters: CounterMoveTable,
    pv: Box<PvTable>,
    nodes: u64,
    aborted: bool,
    root_best: Option<Move>,
    root_score: i32,
}

impl<'a> Searcher<'a> {
    pub fn new(
        eval: &'a dyn Evaluate,
        tt: &'a mut TranspositionTable,
        options: SearchOptions,
    ) -> Self {
        Self {
            eval,
            tt,
            options,
            limits: SearchLimits::depth(1),
            killers: KillerTable::new(),
            history: HistoryTable::new(),
            counters: CounterMoveTable::new(),
            pv: PvTable::new(),
            nodes: 0,
            aborted: false,
            root_best: None,
            root_score: -INF,
        }
    }

    /// Iterative deepening up to the limit. Each completed iteration updates
    /// the result; an aborted partial iteration may only take over when its
    /// root score beats the previous iteration's.
    pub fn think(&mut self, pos: &Position, limits: &SearchLimits) -> SearchResult {
        let mut pos = pos.clone();
        self.limits = limits.clone();
        self.nodes = 0;
        self.aborted = false;
        self.tt.new_search();
        let started = Instant::now();

        let mut result = SearchResult {
            eval_breakdown: self.eval.breakdown(&pos),
            ..SearchResult::default()
        };

        let root_moves = legal_moves(&pos);
        if root_moves.is_empty() {
            result.score = if pos.in_check(pos.side_to_move) { -MATE } else { 0 };
            return result;
        }
        result.best_move = Some(root_moves[0]);

        if pos.is_fifty_move_draw() || pos.is_repetition_draw() {
            result.score = 0;
            return result;
        }

        let mut prev_score = 0i32;
        for depth in 1..=self.limits.depth.max(1) {
            if depth > 1 && self.out_of_budget_for_next_iteration() {
                result.stopped = true;
                break;
            }

            let score = self.search_root_with_aspiration(&mut pos, depth, prev_score);

            if self.aborted {
                if let Some(mv) = self.root_best
                    && self.root_score > prev_score
                {
                    result.best_move = Some(mv);
                    result.score = self.root_score;
                }
                result.stopped = true;
                break;
            }

            prev_score = score;
            result.best_move = self.root_best.or(result.best_move);
            result.score = score;
            result.depth = depth;
            result.pv = self.pv.line(0).to_vec();
            result.iterations.push(IterationInfo {
                depth,
                score,
                nodes: self.nodes,
                elapsed_ms: started.elapsed().as_millis() as u64,
                pv: result.pv.clone(),
            });
            log::debug!(
                "depth {depth} score {score} nodes {} pv {}",
                self.nodes,
                result
                    .pv
                    .iter()
                    .map(|&m| move_to_uci(m))
                    .collect::<Vec<_>>()
                    .join(" ")
            );
        }

        result.nodes = self.nodes;
        result.ponder = pick_ponder(&mut pos, &result);
        result
    }

    /// One depth iteration inside an aspiration window centered on the
    /// previous score. The window widens on a fail and doubles its delta; a
    /// second consecutive fail opens it fully.
    fn search_root_with_aspiration(&mut self, pos: &mut Position, depth: u8, prev: i32) -> i32 {
        let mut delta = ASPIRATION_BASE + ASPIRATION_SLOPE * depth as i32;
        let (mut alpha, mut beta) = if self.options.aspiration && depth > 1 {
            ((prev - delta).max(-INF), (prev + delta).min(INF))
        } else {
            (-INF, INF)
        };

        let mut fails = 0;
        loop {
            self.root_best = None;
            self.root_score = -INF;
            let score = self.alpha_beta(pos, depth as i32, alpha, beta, 0, true, Move::NULL);
            if self.aborted {
                return score;
            }

            if score <= alpha {
                fails += 1;
            } else if score >= beta {
                fails += 1;
            } else {
                return score;
            }

            if fails >= 2 {
                alpha = -INF;
                beta = INF;
            } else if score <= alpha {
                alpha = (alpha - delta).max(-INF);
                delta *= 2;
            } else {
                beta = (beta + delta).min(INF);
                delta *= 2;
            }
        }
    }

    fn alpha_beta(
        &mut self,
        pos: &mut Position,
        depth: i32,
        mut alpha: i32,
        mut beta: i32,
        ply: usize,
        allow_null: bool,
        prev: Move,
    ) -> i32 {
        self.pv.reset(ply);

        if self.check_abort() {
            return 0;
        }

        if ply >= MAX_PLY {
            return self.eval.evaluate(pos);
        }

        if ply > 0
            && (pos.is_fifty_move_draw()
                || pos.is_repetition_draw()
                || pos.is_insufficient_material())
        {
            return 0;
        }

        let in_check = pos.in_check(pos.side_to_move);

        if depth <= 0 {
            if self.options.quiescence {
                return self.quiescence(pos, alpha, beta, ply);
            }
            self.nodes += 1;
            return self.eval.evaluate(pos);
        }

        self.nodes += 1;

        let key = pos.key();
        let mut tt_move = Move::NULL;
        if let Some(entry) = self.tt.probe(key) {
            tt_move = entry.best;
            if ply > 0 && entry.depth >= depth {
                let score = score_from_tt(entry.score, ply);
                match entry.bound {
                    Bound::Exact => return score,
                    Bound::Lower if score >= beta => return score,
                    Bound::Upper if score <= alpha => return score,
                    _ => {}
                }
            }
        }

        // Mate-distance pruning: no line from here can beat an already
        // proven shorter mate.
        alpha = alpha.max(-MATE + ply as i32);
        beta = beta.min(MATE - ply as i32);
        if alpha >= beta {
            return alpha;
        }
        let orig_alpha = alpha;
        let orig_beta = beta;

        let static_eval = if !in_check && depth <= 3 {
            Some(self.eval.evaluate(pos))
        } else {
            None
        };

        // Reverse futility: a shallow node whose static eval clears beta by
        // a full margin.
        if self.options.futility
            && ply > 0
            && let Some(se) = static_eval
            && se - REVERSE_FUTILITY_MARGIN * depth >= beta
        {
            return se;
        }

        // Null move: hand the turn over; surviving a free move proves the
        // position. Skipped in check, in a null already, and in pawn-only
        // endgames where zugzwang breaks the logic.
        if self.options.null_move
            && allow_null
            && ply > 0
            && !in_check
            && depth >= NULL_MOVE_MIN_DEPTH
            && pos.has_non_pawn_material(pos.side_to_move)
        {
            let r = 2 + depth / 6;
            let undo = pos.make_null_move();
            let score =
                -self.alpha_beta(pos, depth - 1 - r, -beta, -beta + 1, ply + 1, false, Move::NULL);
            pos.unmake_null_move(undo);
            if self.aborted {
                return 0;
            }
            if score >= beta {
                return beta;
            }
        }

        let mut moves = Vec::with_capacity(64);
        legal_moves_into(pos, &mut moves);
        if moves.is_empty() {
            return if in_check { -MATE + ply as i32 } else { 0 };
        }

        // Internal iterative deepening: populate a best move for ordering
        // when the table has none. The root always has one from the previous
        // iteration, and its best-move tracking must not see reduced scores.
        if self.options.iid && ply > 0 && tt_move.is_null() && depth >= IID_MIN_DEPTH {
            self.alpha_beta(pos, depth - 2, alpha, beta, ply, false, prev);
            if self.aborted {
                return 0;
            }
            if let Some(entry) = self.tt.probe(key) {
                tt_move = entry.best;
            }
        }

        self.order_moves(pos, &mut moves, tt_move, ply, prev);

        let us = pos.side_to_move;
        let seventh_rank = match us {
            Color::White => 6,
            Color::Black => 1,
        };

        let mut best_score = -INF;
        let mut best_move = Move::NULL;
        let mut quiets_tried: Vec<Move> = Vec::new();

        for (i, &mv) in moves.iter().enumerate() {
            let quiet = mv.promo.is_none() && !is_capture(pos, mv);
            let moved_kind = pos.piece_at(mv.from).map(|p| p.kind);

            // Late-move pruning: quiet stragglers at shallow depth.
            if self.options.futility
                && quiet
                && !in_check
                && depth <= 4
                && i as i32 >= 6 + 2 * depth
                && best_score > -INF
            {
                continue;
            }

            // Futility: a quiet move cannot lift a hopeless static eval.
            if self.options.futility
                && quiet
                && !in_check
                && depth <= 3
                && best_score > -INF
                && let Some(se) = static_eval
                && se + FUTILITY_MARGIN * depth <= alpha
            {
                continue;
            }

            let Ok(undo) = pos.make_move(mv) else { continue };
            let gives_check = pos.in_check(pos.side_to_move);

            let pawn_to_seventh =
                moved_kind == Some(PieceKind::Pawn) && rank_of(mv.to) == seventh_rank;
            let ext = i32::from(self.options.extensions && (gives_check || pawn_to_seventh));

            let mut reduction = 0;
            if self.options.lmr
                && ext == 0
                && quiet
                && !in_check
                && !gives_check
                && depth >= 3
                && i >= 3
            {
                reduction = 1 + i32::from(depth >= 6 && i >= 8);
            }

            let new_depth = (depth - 1 + ext - reduction).max(0);

            // Principal variation search: full window only for the first
            // move; a null-window fail-high re-searches at full depth.
            let score = if i == 0 {
                -self.alpha_beta(pos, new_depth, -beta, -alpha, ply + 1, true, mv)
            } else {
                let probe =
                    -self.alpha_beta(pos, new_depth, -alpha - 1, -alpha, ply + 1, true, mv);
                if probe > alpha && probe < beta && !self.aborted {
                    -self.alpha_beta(pos, depth - 1 + ext, -beta, -alpha, ply + 1, true, mv)
                } else {
                    probe
                }
            };

            pos.unmake_move(mv, undo);
            if self.aborted {
                return 0;
            }

            if quiet {
                quiets_tried.push(mv);
            }

            if score > best_score {
                best_score = score;
                best_move = mv;
                if ply == 0 && score > self.root_score {
                    self.root_score = score;
                    self.root_best = Some(mv);
                }
            }
            if score > alpha {
                alpha = score;
                self.pv.adopt(ply, mv);
            }
            if alpha >= beta {
                if quiet {
                    self.killers.update(ply, mv);
                    self.history.reward(mv, depth);
                    for &q in &quiets_tried {
                        if q != mv {
                            self.history.punish(q, depth);
                        }
                    }
                    self.counters.update(prev, mv);
                }
                break;
            }
        }

        let bound = if best_score <= orig_alpha {
            Bound::Upper
        } else if best_score >= orig_beta {
            Bound::Lower
        } else {
            Bound::Exact
        };
        self.tt
            .store(key, depth, score_to_tt(best_score, ply), bound, best_move);

        best_score
    }

    /// Horizon search over captures and promotions until the position is
    /// quiet. Clearly losing exchanges are skipped; depth is bounded by the
    /// ply ceiling.
    fn quiescence(&mut self, pos: &mut Position, mut alpha: i32, beta: i32, ply: usize) -> i32 {
        if self.check_abort() {
            return 0;
        }
        self.nodes += 1;

        let stand = self.eval.evaluate(pos);
        if ply >= MAX_PLY {
            return stand;
        }
        if stand >= beta {
            return beta;
        }
        // Delta pruning: even the biggest possible swing falls short.
        if stand + piece_value(PieceKind::Queen) + QS_DELTA_MARGIN <= alpha {
            return alpha;
        }
        if stand > alpha {
            alpha = stand;
        }

        let mut moves = Vec::with_capacity(32);
        pseudo_legal_moves(pos, &mut moves);
        moves.retain(|&m| m.promo.is_some() || is_capture(pos, m));
        moves.sort_by_key(|&m| std::cmp::Reverse(capture_order_score(pos, m)));

        for mv in moves {
            if is_capture(pos, mv) && capture_exchange(pos, mv) < QS_EXCHANGE_FLOOR {
                continue;
            }
            let Ok(undo) = pos.make_move(mv) else { continue };
            let score = -self.quiescence(pos, -beta, -alpha, ply + 1);
            pos.unmake_move(mv, undo);
            if self.aborted {
                return 0;
            }
            if score >= beta {
                return beta;
            }
            if score > alpha {
                alpha = score;
            }
        }

        alpha
    }

    /// Highest first: TT move, promotions, winning captures, killers, the
    /// counter-move, history. Losing captures sink below the quiet tiers.
    /// The sort is stable, so ties keep generation order.
    fn order_moves(&self, pos: &Position, moves: &mut [Move], tt_move: Move, ply: usize, prev: Move) {
        let killers = self.killers.get(ply);
        let counter = self.counters.get(prev);

        let mut scored: Vec<(i32, Move)> = moves
            .iter()
            .map(|&m| {
                let score = if !tt_move.is_null() && m == tt_move {
                    TT_MOVE_SCORE
                } else if let Some(kind) = m.promo {
                    PROMO_SCORE + piece_value(kind)
                } else if is_capture(pos, m) {
                    let est = capture_order_score(pos, m);
                    if est >= 0 {
                        WINNING_CAPTURE_SCORE + est
                    } else {
                        LOSING_CAPTURE_SCORE + est
                    }
                } else if m == killers[0] {
                    KILLER_PRIMARY_SCORE
                } else if m == killers[1] {
                    KILLER_SECONDARY_SCORE
                } else if !counter.is_null() && m == counter {
                    COUNTER_MOVE_SCORE
                } else {
                    self.history.get(m)
                };
                (score, m)
            })
            .collect();

        scored.sort_by_key(|&(score, _)| std::cmp::Reverse(score));
        for (slot, (_, m)) in moves.iter_mut().zip(scored) {
            *slot = m;
        }
    }

    /// Between iterations: honor the stop flag and the node cap, and do not
    /// start an iteration once half the time budget is gone.
    fn out_of_budget_for_next_iteration(&self) -> bool {
        if self.limits.should_stop() || self.limits.node_cap_reached(self.nodes) {
            return true;
        }
        if self.limits.infinite {
            return false;
        }
        match self.limits.time_control.budget() {
            Some(budget) => self.limits.time_control.elapsed() >= budget / 2,
            None => false,
        }
    }

    fn check_abort(&mut self) -> bool {
        if self.aborted {
            return true;
        }
        let tc = &self.limits.time_control;
        if self.limits.should_stop()
            || self.limits.node_cap_reached(self.nodes)
            || (tc.should_check_time(self.nodes) && tc.check_time())
        {
            self.aborted = true;
        }
        self.aborted
    }
}

/// The expected reply: second move of the PV, or any legal answer to the
/// best move when the PV is short.
fn pick_ponder(pos: &mut Position, result: &SearchResult) -> Option<Move> {
    if let [_, ponder, ..] = result.pv[..] {
        return Some(ponder);
    }
    let best = result.best_move?;
    let undo = pos.make_move(best).ok()?;
    let reply = legal_moves(pos).first().copied();
    pos.unmake_move(best, undo);
    reply
}

#[cfg(test)]
#[path = "search_tests.rs"]
mod search_tests;
