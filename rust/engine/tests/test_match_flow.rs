use netchess_engine::board::{BoardLayout, STANDARD_LAYOUT};
use netchess_engine::coord::Coordinate;
use netchess_engine::errors::RuleViolation;
use netchess_engine::game::{EndCause, MatchController, MatchEvent, MatchResult, MatchStatus};
use netchess_engine::pieces::{PieceKind, Side};
use netchess_engine::rules::MoveRequest;

fn sq(s: &str) -> Coordinate {
    s.parse().unwrap()
}

fn mv(from: &str, to: &str) -> MoveRequest {
    MoveRequest::new(sq(from), sq(to))
}

fn standard_match() -> MatchController {
    let mut game = MatchController::new();
    game.start_match(STANDARD_LAYOUT, Side::White).unwrap();
    game
}

fn position(pieces: &[(&str, char)]) -> BoardLayout {
    let mut cells = ['.'; 64];
    for (at, glyph) in pieces {
        cells[sq(at).index()] = *glyph;
    }
    BoardLayout::parse(&cells.iter().collect::<String>()).unwrap()
}

#[test]
fn opening_double_step_reply_and_capture() {
    let mut game = standard_match();
    assert_eq!(game.turn(), 1);

    let r = game.validate(&mv("e2", "e4")).unwrap();
    assert!(!r.is_capture());
    game.apply_move(&r).unwrap();

    game.play(&mv("d7", "d5")).unwrap();

    let r = game.validate(&mv("e4", "d5")).unwrap();
    assert!(r.is_capture());
    assert!(!r.en_passant);
    let record = game.apply_move(&r).unwrap();
    assert_eq!(record.captured, Some(PieceKind::Pawn));

    assert_eq!(game.turn(), 4);
    assert_eq!(game.board().glyph_at(sq("d5")), 'P');
    assert_eq!(game.board().pieces().len(), 31);
    assert!(game.board().is_consistent());
}

#[test]
fn en_passant_takes_the_pawn_beside_not_the_destination() {
    let mut game = standard_match();
    game.play(&mv("e2", "e4")).unwrap();
    game.play(&mv("a7", "a6")).unwrap();
    game.play(&mv("e4", "e5")).unwrap();
    game.play(&mv("d7", "d5")).unwrap();
    game.drain_events();

    let r = game.validate(&mv("e5", "d6")).unwrap();
    assert!(r.en_passant);
    game.apply_move(&r).unwrap();

    assert!(game.board().is_empty_at(sq("d5")));
    assert_eq!(game.board().glyph_at(sq("d6")), 'P');
    assert!(game.board().is_consistent());
    let narration = game.drain_events()[0].to_string();
    assert_eq!(narration, "Pawn at E5 captures Pawn at D5: En Passant");
}

#[test]
fn en_passant_window_closes_after_one_turn() {
    let mut game = standard_match();
    game.play(&mv("e2", "e4")).unwrap();
    game.play(&mv("a7", "a6")).unwrap();
    game.play(&mv("e4", "e5")).unwrap();
    game.play(&mv("d7", "d5")).unwrap();
    game.play(&mv("h2", "h3")).unwrap();
    game.play(&mv("a6", "a5")).unwrap();
    assert_eq!(
        game.validate(&mv("e5", "d6")),
        Err(RuleViolation::PawnDiagonalToEmpty(sq("d6")))
    );
}

#[test]
fn promotion_requires_target_unless_auto_promoting() {
    let board = position(&[("a7", 'P'), ("e1", 'K'), ("h8", 'k')]);
    let mut game = MatchController::from_position(board, Side::White, 10);
    let err = game.validate(&mv("a7", "a8")).unwrap_err();
    assert_eq!(err, RuleViolation::MissingPromotion);
    assert!(err.to_string().contains("promotion"));

    let r = game.validate(&mv("a7", "a8").with_auto_promote()).unwrap();
    game.apply_move(&r).unwrap();
    assert_eq!(game.board().glyph_at(sq("a8")), 'Q');
    assert_eq!(game.occupant(sq("a8")).unwrap().kind, PieceKind::Queen);
}

#[test]
fn promotion_on_every_far_rank_square() {
    for file in 0..8u8 {
        let from = Coordinate::new(file, 6).unwrap();
        let to = Coordinate::new(file, 7).unwrap();
        let mut cells = ['.'; 64];
        cells[from.index()] = 'P';
        cells[sq("e1").index()] = 'K';
        cells[sq("a3").index()] = 'k';
        let board = BoardLayout::parse(&cells.iter().collect::<String>()).unwrap();
        let game = MatchController::from_position(board, Side::White, 5);
        assert_eq!(
            game.validate(&MoveRequest::new(from, to)),
            Err(RuleViolation::MissingPromotion)
        );
        let r = game
            .validate(&MoveRequest::new(from, to).promoting_to(PieceKind::Rook))
            .unwrap();
        assert_eq!(r.promotion.map(|p| p.glyph), Some('R'));
    }
}

#[test]
fn castling_legal_with_unmoved_king_and_rook() {
    let board = position(&[("e1", 'K'), ("h1", 'R'), ("e8", 'k')]);
    let mut game = MatchController::from_position(board, Side::White, 1);
    let r = game.validate(&mv("e1", "g1")).unwrap();
    assert!(r.is_castling());
    game.apply_move(&r).unwrap();
    assert_eq!(game.board().glyph_at(sq("g1")), 'K');
    assert_eq!(game.board().glyph_at(sq("f1")), 'R');
    assert!(game.board().is_empty_at(sq("h1")));
    assert_eq!(game.occupant(sq("f1")).unwrap().last_moved_turn, 1);
    assert_eq!(
        game.drain_events()[0].to_string(),
        "King at E1 moves to G1: Castling"
    );
}

#[test]
fn castling_refused_after_rook_moved() {
    let mut board = position(&[("e1", 'K'), ("h1", 'R'), ("e8", 'k')]);
    board.set_history(sq("h1"), sq("h2"), 4);
    let game = MatchController::from_position(board, Side::White, 9);
    let err = game.validate(&mv("e1", "g1")).unwrap_err();
    assert_eq!(err, RuleViolation::CastlingRookHasMoved);
    assert!(err.to_string().contains("rook has moved"));
}

#[test]
fn castling_refused_with_piece_between_destination_and_rook() {
    let board = position(&[("e1", 'K'), ("a1", 'R'), ("b1", 'N'), ("e8", 'k')]);
    let game = MatchController::from_position(board, Side::White, 1);
    let err = game.validate(&mv("e1", "c1")).unwrap_err();
    assert_eq!(err, RuleViolation::CastlingPieceBetween);
    assert!(err.to_string().contains("piece is between"));
}

#[test]
fn king_never_lands_next_to_enemy_king() {
    let board = position(&[("d4", 'K'), ("f5", 'k')]);
    let game = MatchController::from_position(board, Side::White, 20);
    let mut rejected = 0;
    for target in ["c3", "d3", "e3", "c4", "e4", "c5", "d5", "e5"] {
        let result = game.validate(&mv("d4", target));
        let touches_enemy = sq(target).neighbours().any(|n| n == sq("f5"));
        if touches_enemy {
            assert_eq!(result, Err(RuleViolation::KingsAdjacent), "{target}");
            rejected += 1;
        } else {
            assert!(result.is_ok(), "{target}: {result:?}");
        }
    }
    assert_eq!(rejected, 2);
}

#[test]
fn capturing_the_king_ends_the_match_without_advancing() {
    let board = position(&[("e1", 'K'), ("e2", 'Q'), ("e7", 'k')]);
    let mut game = MatchController::from_position(board, Side::White, 12);
    game.play(&mv("e2", "e7")).unwrap();
    assert_eq!(game.turn(), 12);
    assert_eq!(game.result(), Some(MatchResult::WhiteWins));
    assert_eq!(game.status(), MatchStatus::GameOver);
    let events = game.drain_events();
    assert!(events.contains(&MatchEvent::MatchEnded {
        result: MatchResult::WhiteWins,
        cause: EndCause::KingCaptured,
    }));
    assert!(!events
        .iter()
        .any(|e| matches!(e, MatchEvent::TurnChanged { .. })));
    assert_eq!(game.play(&mv("e1", "d1")), Err(RuleViolation::MatchEnded));
}

#[test]
fn teleport_captures_without_rule_checks() {
    let mut game = standard_match();
    let r = game.validate(&mv("d1", "d7").with_teleport()).unwrap();
    game.apply_move(&r).unwrap();
    assert_eq!(game.board().glyph_at(sq("d7")), 'Q');
    assert_eq!(game.side_to_move(), Side::Black);
}
