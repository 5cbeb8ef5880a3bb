use super::*;
use chess_core::Position;

fn m(from: u8, to: u8) -> Move {
    Move::new(from, to)
}

#[test]
fn test_killer_shift() {
    let mut killers = KillerTable::new();
    killers.update(3, m(1, 2));
    killers.update(3, m(3, 4));
    assert_eq!(killers.get(3), [m(3, 4), m(1, 2)]);

    // Re-installing the primary killer must not duplicate it.
    killers.update(3, m(3, 4));
    assert_eq!(killers.get(3), [m(3, 4), m(1, 2)]);

    // Other plies are untouched.
    assert_eq!(killers.get(4), [Move::NULL, Move::NULL]);
}

#[test]
fn test_history_reward_and_punish() {
    let mut history = HistoryTable::new();
    history.reward(m(12, 28), 5);
    assert_eq!(history.get(m(12, 28)), 25);
    history.punish(m(12, 28), 5);
    assert_eq!(history.get(m(12, 28)), 20);
    assert_eq!(history.get(m(12, 29)), 0);
}

#[test]
fn test_counter_move_ignores_null_prev() {
    let mut counters = CounterMoveTable::new();
    counters.update(Move::NULL, m(1, 2));
    assert!(counters.get(Move::NULL).is_null());

    counters.update(m(12, 28), m(52, 36));
    assert_eq!(counters.get(m(12, 28)), m(52, 36));
}

#[test]
fn test_pv_table_adopts_child_line() {
    let mut pv = PvTable::new();
    pv.reset(2);
    pv.adopt(1, m(5, 6));
    assert_eq!(pv.line(1), &[m(5, 6)]);

    pv.adopt(0, m(1, 2));
    assert_eq!(pv.line(0), &[m(1, 2), m(5, 6)]);

    // A fresh line at ply 1 replaces the tail on the next adopt.
    pv.reset(1);
    pv.adopt(0, m(3, 4));
    assert_eq!(pv.line(0), &[m(3, 4)]);
}

#[test]
fn test_capture_detection_includes_en_passant() {
    let pos =
        Position::from_fen("rnbqkbnr/ppppp1pp/8/4Pp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3").unwrap();
    let ep = Move::new(
        chess_core::coord_to_sq("e5").unwrap(),
        chess_core::coord_to_sq("f6").unwrap(),
    );
    assert!(is_capture(&pos, ep));
    // The quiet push from the same square is not a capture.
    let push = Move::new(
        chess_core::coord_to_sq("e5").unwrap(),
        chess_core::coord_to_sq("e6").unwrap(),
    );
    assert!(!is_capture(&pos, push));
}

#[test]
fn test_capture_scores_discount_the_attacker() {
    // White queen and pawn can both take the d5 pawn.
    let pos = Position::from_fen("4k3/8/8/3p4/4P3/8/8/3Q2K1 w - - 0 1").unwrap();
    let pawn_takes = Move::new(
        chess_core::coord_to_sq("e4").unwrap(),
        chess_core::coord_to_sq("d5").unwrap(),
    );
    let queen_takes = Move::new(
        chess_core::coord_to_sq("d1").unwrap(),
        chess_core::coord_to_sq("d5").unwrap(),
    );

    assert!(capture_order_score(&pos, pawn_takes) > capture_order_score(&pos, queen_takes));
    // The full exchange view is far more pessimistic for the queen.
    assert_eq!(capture_exchange(&pos, pawn_takes), 0);
    assert_eq!(capture_exchange(&pos, queen_takes), -800);
}
