use serde::{Deserialize, Serialize};

use crate::board::{BoardLayout, PieceId};
use crate::coord::{line_step, Coordinate};
use crate::errors::RuleViolation;
use crate::pieces::{Piece, PieceKind, Side};

/// A request to move the piece on `from` to `to`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRequest {
    pub from: Coordinate,
    pub to: Coordinate,
    #[serde(default)]
    pub promote_to: Option<PieceKind>,
    /// Skip every rule except the own-piece-capture restriction.
    #[serde(default)]
    pub teleport: bool,
    /// Promote to a queen when no explicit target is given.
    #[serde(default)]
    pub auto_promote: bool,
}

impl MoveRequest {
    pub fn new(from: Coordinate, to: Coordinate) -> Self {
        Self {
            from,
            to,
            promote_to: None,
            teleport: false,
            auto_promote: false,
        }
    }

    pub fn promoting_to(mut self, kind: PieceKind) -> Self {
        self.promote_to = Some(kind);
        self
    }

    pub fn with_teleport(mut self) -> Self {
        self.teleport = true;
        self
    }

    pub fn with_auto_promote(mut self) -> Self {
        self.auto_promote = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CastlingRook {
    pub rook: PieceId,
    pub from: Coordinate,
    pub to: Coordinate,
    pub glyph: char,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Promotion {
    pub kind: PieceKind,
    pub glyph: char,
}

/// An accepted move, ready to be handed to
/// [`MatchController::apply_move`](crate::game::MatchController::apply_move).
///
/// Piece ids refer to the layout the resolution was computed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveResolution {
    pub from: Coordinate,
    pub to: Coordinate,
    pub mover: PieceId,
    pub captured: Option<PieceId>,
    pub castling: Option<CastlingRook>,
    pub promotion: Option<Promotion>,
    pub en_passant: bool,
    pub teleport: bool,
}

impl MoveResolution {
    pub fn is_capture(&self) -> bool {
        self.captured.is_some()
    }

    pub fn is_castling(&self) -> bool {
        self.castling.is_some()
    }

    pub fn is_promotion(&self) -> bool {
        self.promotion.is_some()
    }
}

/// Whether `kind` may travel from `from` to `to` by its movement pattern alone,
/// ignoring every other piece.
///
/// `never_moved` unlocks the pawn's double step and the king's two-square
/// castling step.
///
/// ```
/// use netchess_engine::coord::Coordinate;
/// use netchess_engine::pieces::{PieceKind, Side};
/// use netchess_engine::rules::pattern_allows;
///
/// let e2: Coordinate = "e2".parse().unwrap();
/// let e4: Coordinate = "e4".parse().unwrap();
/// assert!(pattern_allows(PieceKind::Pawn, Side::White, true, e2, e4));
/// assert!(!pattern_allows(PieceKind::Pawn, Side::White, false, e2, e4));
/// assert!(!pattern_allows(PieceKind::Pawn, Side::Black, true, e2, e4));
/// ```
pub fn pattern_allows(
    kind: PieceKind,
    side: Side,
    never_moved: bool,
    from: Coordinate,
    to: Coordinate,
) -> bool {
    let (dx, dy) = from.delta(to);
    if (dx, dy) == (0, 0) {
        return false;
    }
    let straight = dx == 0 || dy == 0;
    let diagonal = dx.abs() == dy.abs();
    match kind {
        PieceKind::Pawn => {
            let ahead = dy * side.forward();
            (dx == 0 && (ahead == 1 || (ahead == 2 && never_moved)))
                || (dx.abs() == 1 && ahead == 1)
        }
        PieceKind::Rook => straight,
        PieceKind::Bishop => diagonal,
        PieceKind::Queen => straight || diagonal,
        PieceKind::Knight => matches!((dx.abs(), dy.abs()), (1, 2) | (2, 1)),
        PieceKind::King => {
            (dx.abs() <= 1 && dy.abs() <= 1) || (never_moved && dx.abs() == 2 && dy == 0)
        }
    }
}

/// First piece standing strictly between `from` and `to` on their shared line.
pub fn first_blocker(
    board: &BoardLayout,
    from: Coordinate,
    to: Coordinate,
) -> Option<(Coordinate, &Piece)> {
    let (sx, sy) = line_step(from, to)?;
    let mut at = from.offset(sx, sy)?;
    while at != to {
        if let Some((_, piece)) = board.occupant(at) {
            return Some((at, piece));
        }
        at = at.offset(sx, sy)?;
    }
    None
}

/// Validates a move request against a board on the given turn.
///
/// Checks run in a fixed order and the first failure is returned:
///
/// 1. the destination must not hold one of the mover's own pieces
///    (the only check a teleport is subject to)
/// 2. only pawns may carry a promotion target
/// 3. the movement pattern of the piece kind
/// 4. path blocking for every kind except the knight
/// 5. pawn rules (vertical captures, diagonal moves, en passant, promotion)
///    and king rules (kings never adjacent, castling)
///
/// Whose turn it is, and whether a match is running at all, is left to
/// [`MatchController::validate`](crate::game::MatchController::validate).
///
/// # Errors
///
/// Returns the [`RuleViolation`] describing the first broken rule.
///
/// # Examples
///
/// ```
/// use netchess_engine::board::BoardLayout;
/// use netchess_engine::errors::RuleViolation;
/// use netchess_engine::rules::{validate_move, MoveRequest};
///
/// let board = BoardLayout::standard();
/// let sq = |s: &str| s.parse().unwrap();
///
/// let ok = validate_move(&board, 1, &MoveRequest::new(sq("e2"), sq("e4"))).unwrap();
/// assert!(!ok.is_capture());
///
/// let err = validate_move(&board, 1, &MoveRequest::new(sq("a1"), sq("a3"))).unwrap_err();
/// assert!(matches!(err, RuleViolation::Blocked { .. }));
/// ```
pub fn validate_move(
    board: &BoardLayout,
    turn: u32,
    request: &MoveRequest,
) -> Result<MoveResolution, RuleViolation> {
    let (from, to) = (request.from, request.to);
    if from == to {
        return Err(RuleViolation::SameSquare);
    }
    let (mover_id, mover) = board
        .occupant(from)
        .ok_or(RuleViolation::EmptyOrigin(from))?;
    let target = board.occupant(to);
    if let Some((_, piece)) = target {
        if piece.side == mover.side {
            return Err(RuleViolation::OwnPieceAtDestination(to));
        }
    }

    let mut resolution = MoveResolution {
        from,
        to,
        mover: mover_id,
        captured: target.map(|(id, _)| id),
        castling: None,
        promotion: None,
        en_passant: false,
        teleport: request.teleport,
    };
    if request.teleport {
        return Ok(resolution);
    }

    if let Some(kind) = request.promote_to {
        if mover.kind != PieceKind::Pawn {
            return Err(RuleViolation::PromoteNonPawn(mover.kind));
        }
        if !kind.is_promotion_target() {
            return Err(RuleViolation::InvalidPromotionKind(kind));
        }
    }

    if !pattern_allows(mover.kind, mover.side, !mover.has_moved(), from, to) {
        return Err(RuleViolation::IllegalPattern {
            kind: mover.kind,
            to,
        });
    }

    if mover.kind != PieceKind::Knight {
        if let Some((at, blocker)) = first_blocker(board, from, to) {
            return Err(RuleViolation::Blocked {
                kind: mover.kind,
                blocker: blocker.kind,
                at,
            });
        }
    }

    match mover.kind {
        PieceKind::Pawn => check_pawn(board, turn, request, mover, &mut resolution)?,
        PieceKind::King => check_king(board, mover, &mut resolution)?,
        _ => {}
    }
    Ok(resolution)
}

fn check_pawn(
    board: &BoardLayout,
    turn: u32,
    request: &MoveRequest,
    pawn: &Piece,
    resolution: &mut MoveResolution,
) -> Result<(), RuleViolation> {
    let (from, to) = (request.from, request.to);
    let (dx, _) = from.delta(to);
    let occupied = resolution.captured.is_some();

    if dx == 0 && occupied {
        return Err(RuleViolation::PawnVerticalCapture(to));
    }
    if dx != 0 && !occupied {
        let beside = Coordinate::new(to.file(), from.rank())
            .ok_or(RuleViolation::PawnDiagonalToEmpty(to))?;
        match board.occupant(beside) {
            Some((id, victim)) if just_double_stepped(victim, pawn.side, turn) => {
                resolution.en_passant = true;
                resolution.captured = Some(id);
            }
            _ => return Err(RuleViolation::PawnDiagonalToEmpty(to)),
        }
    }

    if to.rank() == pawn.side.far_rank() {
        let kind = match (request.promote_to, request.auto_promote) {
            (Some(kind), _) => kind,
            (None, true) => PieceKind::Queen,
            (None, false) => return Err(RuleViolation::MissingPromotion),
        };
        resolution.promotion = Some(Promotion {
            kind,
            glyph: kind.glyph(pawn.side),
        });
    }
    Ok(())
}

/// An enemy pawn that made a two-square advance on the previous turn.
fn just_double_stepped(piece: &Piece, mover: Side, turn: u32) -> bool {
    piece.kind == PieceKind::Pawn
        && piece.side != mover
        && piece.has_moved()
        && piece.last_moved_turn + 1 == turn
        && piece.current.rank().abs_diff(piece.previous.rank()) == 2
}

fn check_king(
    board: &BoardLayout,
    king: &Piece,
    resolution: &mut MoveResolution,
) -> Result<(), RuleViolation> {
    let to = resolution.to;
    let enemy = king.side.opponent();
    let enemy_king_near = to.neighbours().any(|n| {
        board
            .occupant(n)
            .is_some_and(|(_, p)| p.kind == PieceKind::King && p.side == enemy)
    });
    if enemy_king_near {
        return Err(RuleViolation::KingsAdjacent);
    }

    let (dx, dy) = resolution.from.delta(to);
    if dx.abs() != 2 || dy != 0 {
        return Ok(());
    }

    if resolution.captured.is_some() {
        return Err(RuleViolation::CastlingPieceBetween);
    }
    let step = dx.signum();
    let mut cursor = to.offset(step, 0);
    while let Some(at) = cursor {
        match board.occupant(at) {
            None => cursor = at.offset(step, 0),
            Some((id, piece)) if piece.kind == PieceKind::Rook && piece.side == king.side => {
                if piece.has_moved() {
                    return Err(RuleViolation::CastlingRookHasMoved);
                }
                let rook_to = to
                    .offset(-step, 0)
                    .ok_or(RuleViolation::CastlingRookHasMoved)?;
                resolution.castling = Some(CastlingRook {
                    rook: id,
                    from: at,
                    to: rook_to,
                    glyph: piece.glyph(),
                });
                return Ok(());
            }
            Some(_) => return Err(RuleViolation::CastlingPieceBetween),
        }
    }
    Err(RuleViolation::CastlingRookHasMoved)
}
