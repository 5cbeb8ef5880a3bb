use super::*;
use crate::movegen::legal_moves;

const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

fn mv(txt: &str) -> Move {
    let from = coord_to_sq(&txt[0..2]).unwrap();
    let to = coord_to_sq(&txt[2..4]).unwrap();
    Move::new(from, to)
}

#[test]
fn test_startpos_roundtrip() {
    let pos = Position::startpos();
    assert_eq!(pos.to_fen(), START_FEN);
    assert_eq!(Position::from_fen(START_FEN).unwrap(), pos);
}

#[test]
fn test_fen_rejects_malformed_input() {
    // Seven ranks
    assert!(matches!(
        Position::from_fen("8/8/8/8/8/8/8 w - - 0 1"),
        Err(FenError::Board(_))
    ));
    // Overfull rank
    assert!(matches!(
        Position::from_fen("9/8/8/8/8/8/8/8 w - - 0 1"),
        Err(FenError::Board(_))
    ));
    // Unknown piece letter
    assert!(matches!(
        Position::from_fen("xnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"),
        Err(FenError::Board(_))
    ));
    // Bad side to move
    assert!(matches!(
        Position::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR x KQkq - 0 1"),
        Err(FenError::SideToMove(_))
    ));
    // Bad castling character
    assert!(matches!(
        Position::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQxq - 0 1"),
        Err(FenError::Castling('x'))
    ));
    // En passant on the wrong rank
    assert!(matches!(
        Position::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq e4 0 1"),
        Err(FenError::EnPassant(_))
    ));
    // Non-numeric counter
    assert!(matches!(
        Position::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - x 1"),
        Err(FenError::Counter(_))
    ));
    // Missing king
    assert!(matches!(
        Position::from_fen("rnbq1bnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w - - 0 1"),
        Err(FenError::KingCount)
    ));
    // Too few fields
    assert!(matches!(
        Position::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w"),
        Err(FenError::FieldCount(2))
    ));
}

#[test]
fn test_counters_default_when_omitted() {
    let pos = Position::from_fen("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq -")
        .unwrap();
    assert_eq!(pos.halfmove_clock, 0);
    assert_eq!(pos.fullmove_number, 1);
}

#[test]
fn test_make_unmake_restores_position_bitwise() {
    let mut pos = Position::startpos();
    let before = pos.clone();
    for txt in ["e2e4", "g1f3", "a2a3", "h2h4"] {
        let undo = pos.make_move(mv(txt)).expect("legal opening move");
        assert_ne!(pos, before);
        pos.unmake_move(mv(txt), undo);
        assert_eq!(pos, before, "make+unmake of {txt} must restore the position");
    }
}

#[test]
fn test_incremental_key_tracks_scratch_hash() {
    let mut pos = Position::startpos();
    assert_eq!(pos.key(), pos.position_hash());

    for txt in ["e2e4", "e7e5", "g1f3", "b8c6", "f1b5"] {
        pos.make_move(mv(txt)).expect("legal opening move");
        assert_eq!(pos.key(), pos.position_hash(), "after {txt}");
    }
}

#[test]
fn test_en_passant_target_lives_one_ply() {
    let mut pos = Position::startpos();
    pos.make_move(mv("e2e4")).unwrap();
    assert_eq!(pos.en_passant, coord_to_sq("e3"));
    pos.make_move(mv("g8f6")).unwrap();
    assert_eq!(pos.en_passant, None);
}

#[test]
fn test_en_passant_capture_removes_the_right_pawn() {
    let mut pos =
        Position::from_fen("rnbqkbnr/ppppp1pp/8/4Pp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3").unwrap();
    let ep = mv("e5f6");
    let undo = pos.make_move(ep).unwrap();
    assert!(undo.was_en_passant);
    assert_eq!(pos.piece_at(coord_to_sq("f5").unwrap()), None);
    assert_eq!(
        pos.piece_at(coord_to_sq("f6").unwrap()).map(|p| p.kind),
        Some(PieceKind::Pawn)
    );

    let restored = pos.clone();
    pos.unmake_move(ep, undo);
    assert_ne!(pos, restored);
    assert_eq!(
        pos.piece_at(coord_to_sq("f5").unwrap()).map(|p| p.kind),
        Some(PieceKind::Pawn)
    );
}

#[test]
fn test_promotion_defaults_to_queen() {
    let mut pos = Position::from_fen("8/P6k/8/8/8/8/8/7K w - - 0 1").unwrap();
    pos.make_move(mv("a7a8")).unwrap();
    assert_eq!(
        pos.piece_at(coord_to_sq("a8").unwrap()).map(|p| p.kind),
        Some(PieceKind::Queen)
    );
}

#[test]
fn test_castling_rights_are_monotonic() {
    let mut pos =
        Position::from_fen("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1").unwrap();

    // Rook leaves its corner: queenside right gone, and it stays gone after
    // the rook returns.
    pos.make_move(mv("a1b1")).unwrap();
    assert_eq!(pos.castling, CASTLE_WK | CASTLE_BK | CASTLE_BQ);
    pos.make_move(mv("a7a6")).unwrap();
    pos.make_move(mv("b1a1")).unwrap();
    assert_eq!(pos.castling, CASTLE_WK | CASTLE_BK | CASTLE_BQ);

    // King move clears both rights of the mover.
    pos.make_move(mv("e8d8")).unwrap();
    assert_eq!(pos.castling, CASTLE_WK);
}

#[test]
fn test_capture_on_corner_clears_right() {
    let mut pos =
        Position::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
    pos.make_move(mv("a1a8")).unwrap();
    assert_eq!(pos.castling, CASTLE_WK | CASTLE_BK);
}

#[test]
fn test_castling_comoves_rook_and_unmakes() {
    let mut pos =
        Position::from_fen("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1").unwrap();
    let before = pos.clone();

    let castle = mv("e1g1");
    let undo = pos.make_move(castle).unwrap();
    assert!(undo.was_castle);
    assert_eq!(
        pos.piece_at(coord_to_sq("f1").unwrap()).map(|p| p.kind),
        Some(PieceKind::Rook)
    );
    assert_eq!(pos.piece_at(coord_to_sq("h1").unwrap()), None);

    pos.unmake_move(castle, undo);
    assert_eq!(pos, before);
}

#[test]
fn test_castling_does_not_reset_halfmove_clock() {
    let mut pos =
        Position::from_fen("r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 7 10").unwrap();
    pos.make_move(mv("e1g1")).unwrap();
    assert_eq!(pos.halfmove_clock, 8);
}

#[test]
fn test_null_move_twice_is_identity_on_key() {
    // Without an en-passant target, two stacked null moves cancel exactly.
    let mut pos = Position::startpos();
    let key = pos.key();
    let u1 = pos.make_null_move();
    assert_ne!(pos.key(), key);
    assert_eq!(pos.key(), pos.position_hash());
    let u2 = pos.make_null_move();
    assert_eq!(pos.key(), key);
    pos.unmake_null_move(u2);
    pos.unmake_null_move(u1);
    assert_eq!(pos, Position::startpos());
}

#[test]
fn test_null_move_clears_and_restores_en_passant() {
    let mut pos =
        Position::from_fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1").unwrap();
    let key = pos.key();

    let undo = pos.make_null_move();
    assert_eq!(pos.en_passant, None);
    assert_eq!(pos.key(), pos.position_hash());

    pos.unmake_null_move(undo);
    assert_eq!(pos.key(), key);
    assert_eq!(pos.en_passant, coord_to_sq("e3"));
}

#[test]
fn test_illegal_moves_leave_state_unchanged() {
    let mut pos = Position::startpos();
    let before = pos.clone();

    // No piece on the from-square
    assert_eq!(pos.make_move(mv("e4e5")).unwrap_err(), IllegalMove);
    // Opponent's piece
    assert_eq!(pos.make_move(mv("e7e5")).unwrap_err(), IllegalMove);
    assert_eq!(pos, before);

    // Moving a pinned piece off the pin ray rolls back cleanly.
    let mut pinned =
        Position::from_fen("4r1k1/8/8/8/8/8/4R3/4K3 w - - 0 1").unwrap();
    let saved = pinned.clone();
    assert!(pinned.make_move(mv("e2d2")).is_err());
    assert_eq!(pinned, saved);
}

#[test]
fn test_square_attack_ray_stops_at_blockers() {
    let pos = Position::from_fen("4k3/8/8/8/4r3/8/4P3/4K3 w - - 0 1").unwrap();
    // The e2 pawn shields the king from the e4 rook.
    assert!(!pos.in_check(Color::White));
    assert!(pos.is_square_attacked(coord_to_sq("e3").unwrap(), Color::Black));
    assert!(!pos.is_square_attacked(coord_to_sq("e1").unwrap(), Color::Black));
    // Along the open rank the rook reaches the edge.
    assert!(pos.is_square_attacked(coord_to_sq("a4").unwrap(), Color::Black));
}

#[test]
fn test_checkmate_has_no_legal_moves() {
    let pos = Position::from_fen("r1bqkb1r/pppp1Qpp/2n2n2/4p3/2B1P3/8/PPPP1PPP/RNB1K1NR b KQkq - 0 4")
        .unwrap();
    assert!(pos.in_check(Color::Black));
    assert!(legal_moves(&pos).is_empty());
}
