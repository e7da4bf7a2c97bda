use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::coord::Coordinate;
use crate::errors::NotationError;

/// One of the two sides. White (side 0) is written in uppercase glyphs and
/// moves up the board; Black (side 1) is lowercase and moves down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    White,
    Black,
}

impl Side {
    pub fn index(self) -> usize {
        match self {
            Side::White => 0,
            Side::Black => 1,
        }
    }

    pub fn from_index(index: usize) -> Option<Side> {
        match index {
            0 => Some(Side::White),
            1 => Some(Side::Black),
            _ => None,
        }
    }

    pub fn opponent(self) -> Side {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }

    /// Rank direction of a forward pawn step.
    pub fn forward(self) -> i8 {
        match self {
            Side::White => 1,
            Side::Black => -1,
        }
    }

    /// Rank a pawn of this side promotes on.
    pub fn far_rank(self) -> u8 {
        match self {
            Side::White => 7,
            Side::Black => 0,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::White => write!(f, "White"),
            Side::Black => write!(f, "Black"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PieceKind {
    Pawn,
    Rook,
    Knight,
    Bishop,
    Queen,
    King,
}

impl PieceKind {
    /// Decode a layout glyph. `'.'` and unknown characters yield `None`.
    pub fn from_glyph(glyph: char) -> Option<(PieceKind, Side)> {
        let side = if glyph.is_ascii_uppercase() {
            Side::White
        } else {
            Side::Black
        };
        let kind = match glyph.to_ascii_lowercase() {
            'p' => PieceKind::Pawn,
            'r' => PieceKind::Rook,
            'n' => PieceKind::Knight,
            'b' => PieceKind::Bishop,
            'q' => PieceKind::Queen,
            'k' => PieceKind::King,
            _ => return None,
        };
        Some((kind, side))
    }

    pub fn glyph(self, side: Side) -> char {
        let lower = match self {
            PieceKind::Pawn => 'p',
            PieceKind::Rook => 'r',
            PieceKind::Knight => 'n',
            PieceKind::Bishop => 'b',
            PieceKind::Queen => 'q',
            PieceKind::King => 'k',
        };
        match side {
            Side::White => lower.to_ascii_uppercase(),
            Side::Black => lower,
        }
    }

    /// Lowercase wire name, as used by `promoteTo=`.
    pub fn name(self) -> &'static str {
        match self {
            PieceKind::Pawn => "pawn",
            PieceKind::Rook => "rook",
            PieceKind::Knight => "knight",
            PieceKind::Bishop => "bishop",
            PieceKind::Queen => "queen",
            PieceKind::King => "king",
        }
    }

    pub fn is_promotion_target(self) -> bool {
        matches!(
            self,
            PieceKind::Knight | PieceKind::Bishop | PieceKind::Rook | PieceKind::Queen
        )
    }
}

impl fmt::Display for PieceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.name();
        let mut chars = name.chars();
        if let Some(first) = chars.next() {
            write!(f, "{}{}", first.to_ascii_uppercase(), chars.as_str())?;
        }
        Ok(())
    }
}

impl FromStr for PieceKind {
    type Err = NotationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pawn" => Ok(PieceKind::Pawn),
            "rook" => Ok(PieceKind::Rook),
            "knight" => Ok(PieceKind::Knight),
            "bishop" => Ok(PieceKind::Bishop),
            "queen" => Ok(PieceKind::Queen),
            "king" => Ok(PieceKind::King),
            _ => Err(NotationError::UnknownPieceKind(s.to_string())),
        }
    }
}

/// A live piece in the roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Piece {
    pub kind: PieceKind,
    pub side: Side,
    pub current: Coordinate,
    /// Square the piece stood on before its last move.
    pub previous: Coordinate,
    /// Turn number of the last move, 0 if the piece has never moved.
    pub last_moved_turn: u32,
}

impl Piece {
    pub fn new(kind: PieceKind, side: Side, at: Coordinate) -> Self {
        Self {
            kind,
            side,
            current: at,
            previous: at,
            last_moved_turn: 0,
        }
    }

    pub fn glyph(&self) -> char {
        self.kind.glyph(self.side)
    }

    pub fn has_moved(&self) -> bool {
        self.last_moved_turn != 0
    }
}
