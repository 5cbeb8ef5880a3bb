use super::*;

#[test]
fn test_move_to_uci() {
    assert_eq!(move_to_uci(Move::new(12, 28)), "e2e4");
    assert_eq!(
        move_to_uci(Move::promotion(48, 56, PieceKind::Queen)),
        "a7a8q"
    );
    assert_eq!(
        move_to_uci(Move::promotion(48, 56, PieceKind::Knight)),
        "a7a8n"
    );
    assert_eq!(move_to_uci(Move::NULL), "0000");
}

#[test]
fn test_parse_uci_move_matches_legal_list() {
    let pos = Position::startpos();
    let mv = parse_uci_move(&pos, "e2e4").expect("e2e4 is legal");
    assert_eq!((mv.from, mv.to), (12, 28));

    assert!(parse_uci_move(&pos, "e2e5").is_none());
    assert!(parse_uci_move(&pos, "e7e5").is_none()); // not white's move
    assert!(parse_uci_move(&pos, "zz").is_none());
}

#[test]
fn test_parse_promotion_requires_the_letter() {
    let pos = Position::from_fen("8/P6k/8/8/8/8/8/7K w - - 0 1").unwrap();
    let mv = parse_uci_move(&pos, "a7a8q").expect("promotion is legal");
    assert_eq!(mv.promo, Some(PieceKind::Queen));
    assert_eq!(
        parse_uci_move(&pos, "a7a8n").unwrap().promo,
        Some(PieceKind::Knight)
    );
    // A bare pawn-to-last-rank move matches no legal move.
    assert!(parse_uci_move(&pos, "a7a8").is_none());
}

#[test]
fn test_position_startpos_with_moves() {
    let mut pos = Position::startpos();
    set_position_from_uci(&mut pos, &["startpos", "moves", "e2e4", "e7e5"]).unwrap();
    assert_eq!(pos.side_to_move, Color::White);
    assert_eq!(pos.fullmove_number, 2);
}

#[test]
fn test_position_fen_with_moves() {
    let mut pos = Position::startpos();
    set_position_from_uci(
        &mut pos,
        &[
            "fen", "8/P6k/8/8/8/8/8/7K", "w", "-", "-", "0", "1", "moves", "a7a8q",
        ],
    )
    .unwrap();
    assert_eq!(
        pos.piece_at(coord_to_sq("a8").unwrap()).map(|p| p.kind),
        Some(PieceKind::Queen)
    );
}

#[test]
fn test_position_command_is_atomic() {
    let mut pos = Position::startpos();
    set_position_from_uci(&mut pos, &["startpos", "moves", "e2e4"]).unwrap();
    let saved = pos.clone();

    let err = set_position_from_uci(&mut pos, &["startpos", "moves", "e2e4", "e2e4"]).unwrap_err();
    assert_eq!(err, PositionError::IllegalMove("e2e4".to_string()));
    assert_eq!(pos, saved, "a failed position command must not change state");

    let err = set_position_from_uci(&mut pos, &["fen", "not", "a", "fen", "at-all"]).unwrap_err();
    assert!(matches!(err, PositionError::Fen(_)));
    assert_eq!(pos, saved);
}
