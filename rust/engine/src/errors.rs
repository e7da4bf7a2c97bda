use thiserror::Error;

use crate::coord::Coordinate;
use crate::pieces::PieceKind;

/// Failure to read square text, square indices or piece names.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NotationError {
    #[error("Invalid square '{0}': expected a file A-H followed by a rank 1-8")]
    InvalidSquare(String),
    #[error("Square index {0} is outside 0..64")]
    IndexOutOfRange(usize),
    #[error("Unknown piece kind '{0}'")]
    UnknownPieceKind(String),
}

/// Failure to read a 64-character board layout.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LayoutError {
    #[error("Board layout must be exactly 64 characters, got {0}")]
    WrongLength(usize),
    #[error("Invalid glyph '{glyph}' at index {index}")]
    InvalidGlyph { index: usize, glyph: char },
}

/// Reasons a move request is rejected.
///
/// The `Display` text of each variant is the message reported to the player.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RuleViolation {
    #[error("Invalid command: no match in progress")]
    NoMatch,
    #[error("Invalid command: Match Ended")]
    MatchEnded,
    #[error("Invalid args: FROM square is equal to TO square")]
    SameSquare,
    #[error("Invalid args: FROM square {0} has no piece")]
    EmptyOrigin(Coordinate),
    #[error("Invalid args: FROM piece at {0} is your opponent's piece")]
    OpponentPiece(Coordinate),
    #[error("Invalid args: TO piece at {0} is your piece")]
    OwnPieceAtDestination(Coordinate),
    #[error("Invalid move: cannot promote non-pawn piece {0}")]
    PromoteNonPawn(PieceKind),
    #[error("Invalid args: cannot promote to {0}")]
    InvalidPromotionKind(PieceKind),
    #[error("Invalid move: {kind} cannot move to {to} by rule")]
    IllegalPattern { kind: PieceKind, to: Coordinate },
    #[error("Invalid move: {kind} is blocked by {blocker} at {at}")]
    Blocked {
        kind: PieceKind,
        blocker: PieceKind,
        at: Coordinate,
    },
    #[error("Invalid move: pawn cannot move vertically to capture the piece at {0}")]
    PawnVerticalCapture(Coordinate),
    #[error("Invalid move: pawn cannot move diagonally to empty square {0}")]
    PawnDiagonalToEmpty(Coordinate),
    #[error("Invalid args: moving pawn to far rank without a promotion target")]
    MissingPromotion,
    #[error("Invalid move: kings cannot be adjacent to each other")]
    KingsAdjacent,
    #[error("Invalid move: cannot perform castling, a piece is between the king and rook")]
    CastlingPieceBetween,
    #[error("Invalid move: cannot perform castling, the rook has moved")]
    CastlingRookHasMoved,
}
