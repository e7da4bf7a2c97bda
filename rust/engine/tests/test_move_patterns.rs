use netchess_engine::board::BoardLayout;
use netchess_engine::coord::Coordinate;
use netchess_engine::errors::RuleViolation;
use netchess_engine::pieces::{PieceKind, Side};
use netchess_engine::rules::{pattern_allows, validate_move, MoveRequest};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const KINDS: [PieceKind; 6] = [
    PieceKind::Pawn,
    PieceKind::Rook,
    PieceKind::Knight,
    PieceKind::Bishop,
    PieceKind::Queen,
    PieceKind::King,
];

/// Geometry table restated independently of the engine.
fn expected(kind: PieceKind, side: Side, never_moved: bool, dx: i8, dy: i8) -> bool {
    let (ax, ay) = (dx.abs(), dy.abs());
    if ax == 0 && ay == 0 {
        return false;
    }
    let fwd = if side == Side::Black { -1 } else { 1 };
    match kind {
        PieceKind::Pawn => {
            (dx == 0 && dy == fwd)
                || (dx == 0 && dy == 2 * fwd && never_moved)
                || (ax == 1 && dy == fwd)
        }
        PieceKind::Rook => (dx == 0) != (dy == 0),
        PieceKind::Bishop => ax == ay,
        PieceKind::Queen => (dx == 0) != (dy == 0) || ax == ay,
        PieceKind::Knight => (ax, ay) == (1, 2) || (ax, ay) == (2, 1),
        PieceKind::King => ax + ay == 1 || (ax == 1 && ay == 1) || (never_moved && ax == 2 && dy == 0),
    }
}

fn random_square(rng: &mut ChaCha8Rng) -> Coordinate {
    Coordinate::from_index(rng.random_range(0..64)).unwrap()
}

#[test]
fn patterns_match_geometry_table_for_random_pairs() {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    for _ in 0..20_000 {
        let kind = KINDS[rng.random_range(0..KINDS.len())];
        let side = if rng.random_bool(0.5) { Side::White } else { Side::Black };
        let never_moved = rng.random_bool(0.5);
        let from = random_square(&mut rng);
        let to = random_square(&mut rng);
        let (dx, dy) = from.delta(to);
        assert_eq!(
            pattern_allows(kind, side, never_moved, from, to),
            expected(kind, side, never_moved, dx, dy),
            "{kind:?} {side:?} never_moved={never_moved} {from}->{to}"
        );
    }
}

fn layout_with(pieces: &[(Coordinate, char)]) -> BoardLayout {
    let mut cells = ['.'; 64];
    for (at, glyph) in pieces {
        cells[at.index()] = *glyph;
    }
    BoardLayout::parse(&cells.iter().collect::<String>()).unwrap()
}

/// A random slide of at least two squares for a rook, bishop or queen.
fn random_slide(rng: &mut ChaCha8Rng) -> (PieceKind, Coordinate, Coordinate, (i8, i8)) {
    loop {
        let kind = [PieceKind::Rook, PieceKind::Bishop, PieceKind::Queen][rng.random_range(0..3)];
        let dirs: &[(i8, i8)] = match kind {
            PieceKind::Rook => &[(1, 0), (-1, 0), (0, 1), (0, -1)],
            PieceKind::Bishop => &[(1, 1), (1, -1), (-1, 1), (-1, -1)],
            _ => &[
                (1, 0),
                (-1, 0),
                (0, 1),
                (0, -1),
                (1, 1),
                (1, -1),
                (-1, 1),
                (-1, -1),
            ],
        };
        let dir = dirs[rng.random_range(0..dirs.len())];
        let from = random_square(rng);
        let distance = rng.random_range(2..8);
        if let Some(to) = from.offset(dir.0 * distance, dir.1 * distance) {
            return (kind, from, to, dir);
        }
    }
}

#[test]
fn intervening_piece_blocks_and_its_removal_unblocks() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    for _ in 0..2_000 {
        let (kind, from, to, dir) = random_slide(&mut rng);
        let (dx, _) = from.delta(to);
        let span = dx.abs().max(from.delta(to).1.abs());
        let step = rng.random_range(1..span);
        let between = from.offset(dir.0 * step, dir.1 * step).unwrap();
        let mover = kind.glyph(Side::White);
        let request = MoveRequest::new(from, to);

        let blocked = layout_with(&[(from, mover), (between, 'n')]);
        match validate_move(&blocked, 3, &request) {
            Err(RuleViolation::Blocked { at, blocker, .. }) => {
                assert_eq!(at, between);
                assert_eq!(blocker, PieceKind::Knight);
            }
            other => panic!("{kind:?} {from}->{to} over {between}: {other:?}"),
        }

        let clear = layout_with(&[(from, mover)]);
        assert!(
            validate_move(&clear, 3, &request).is_ok(),
            "{kind:?} {from}->{to} should pass on an open board"
        );
    }
}

#[test]
fn knights_are_never_blocked() {
    let board = BoardLayout::standard();
    let sq = |s: &str| s.parse::<Coordinate>().unwrap();
    for (from, to) in [("b1", "a3"), ("b1", "c3"), ("g1", "h3")] {
        assert!(validate_move(&board, 1, &MoveRequest::new(sq(from), sq(to))).is_ok());
    }
}
