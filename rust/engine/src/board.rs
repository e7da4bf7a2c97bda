use std::fmt;
use std::str::FromStr;

use crate::coord::Coordinate;
use crate::errors::LayoutError;
use crate::pieces::{Piece, PieceKind, Side};

/// Standard opening position, A1 first, rank-major.
pub const STANDARD_LAYOUT: &str =
    "RNBQKBNRPPPPPPPP................................pppppppprnbqkbnr";

pub const EMPTY_GLYPH: char = '.';

/// Position of a piece in the roster. Ids are stable until the next capture.
pub type PieceId = usize;

/// 64 glyph cells plus the roster of live pieces standing on them.
///
/// Every non-empty cell corresponds to exactly one roster entry and vice versa.
/// Only [`crate::game::MatchController`] mutates a layout once a match runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardLayout {
    cells: [char; 64],
    pieces: Vec<Piece>,
}

impl BoardLayout {
    pub fn empty() -> Self {
        Self {
            cells: [EMPTY_GLYPH; 64],
            pieces: Vec::new(),
        }
    }

    pub fn standard() -> Self {
        // the constant is known-good; fall back to an empty board rather than panic
        Self::parse(STANDARD_LAYOUT).unwrap_or_else(|_| Self::empty())
    }

    /// Parse a 64-character layout string.
    ///
    /// ```
    /// use netchess_engine::board::{BoardLayout, STANDARD_LAYOUT};
    ///
    /// let board = BoardLayout::parse(STANDARD_LAYOUT).unwrap();
    /// assert_eq!(board.pieces().len(), 32);
    /// assert_eq!(board.to_string(), STANDARD_LAYOUT);
    /// ```
    pub fn parse(layout: &str) -> Result<Self, LayoutError> {
        let glyphs: Vec<char> = layout.chars().collect();
        if glyphs.len() != 64 {
            return Err(LayoutError::WrongLength(glyphs.len()));
        }
        let mut board = Self::empty();
        for (index, glyph) in glyphs.into_iter().enumerate() {
            if glyph == EMPTY_GLYPH {
                continue;
            }
            let (kind, side) =
                PieceKind::from_glyph(glyph).ok_or(LayoutError::InvalidGlyph { index, glyph })?;
            let at = Coordinate::from_index(index)
                .map_err(|_| LayoutError::InvalidGlyph { index, glyph })?;
            board.cells[index] = glyph;
            board.pieces.push(Piece::new(kind, side, at));
        }
        Ok(board)
    }

    pub fn glyph_at(&self, at: Coordinate) -> char {
        self.cells[at.index()]
    }

    pub fn is_empty_at(&self, at: Coordinate) -> bool {
        self.cells[at.index()] == EMPTY_GLYPH
    }

    pub fn occupant(&self, at: Coordinate) -> Option<(PieceId, &Piece)> {
        if self.is_empty_at(at) {
            return None;
        }
        self.pieces.iter().enumerate().find(|(_, p)| p.current == at)
    }

    pub fn piece(&self, id: PieceId) -> Option<&Piece> {
        self.pieces.get(id)
    }

    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    pub fn king_of(&self, side: Side) -> Option<&Piece> {
        self.pieces
            .iter()
            .find(|p| p.side == side && p.kind == PieceKind::King)
    }

    /// Record that the piece on `at` last moved on `turn`, coming from `from`.
    ///
    /// Used to build mid-game positions from a layout string, where move
    /// history is otherwise lost. Returns false if `at` is empty.
    pub fn set_history(&mut self, at: Coordinate, from: Coordinate, turn: u32) -> bool {
        match self.pieces.iter_mut().find(|p| p.current == at) {
            Some(piece) => {
                piece.previous = from;
                piece.last_moved_turn = turn;
                true
            }
            None => false,
        }
    }

    pub(crate) fn relocate(&mut self, id: PieceId, to: Coordinate, turn: u32) {
        if let Some(piece) = self.pieces.get_mut(id) {
            let from = piece.current;
            self.cells[from.index()] = EMPTY_GLYPH;
            self.cells[to.index()] = piece.glyph();
            piece.previous = from;
            piece.current = to;
            piece.last_moved_turn = turn;
        }
    }

    pub(crate) fn promote(&mut self, id: PieceId, kind: PieceKind) {
        if let Some(piece) = self.pieces.get_mut(id) {
            piece.kind = kind;
            self.cells[piece.current.index()] = piece.glyph();
        }
    }

    /// Drop a piece from the roster. Its cell is cleared unless another piece
    /// has already moved onto it.
    pub(crate) fn take(&mut self, id: PieceId) -> Option<Piece> {
        if id >= self.pieces.len() {
            return None;
        }
        let piece = self.pieces.remove(id);
        let at = piece.current;
        if !self.pieces.iter().any(|p| p.current == at) {
            self.cells[at.index()] = EMPTY_GLYPH;
        }
        Some(piece)
    }

    /// Cells and roster describe the same position.
    pub fn is_consistent(&self) -> bool {
        let occupied = self.cells.iter().filter(|&&c| c != EMPTY_GLYPH).count();
        occupied == self.pieces.len()
            && self
                .pieces
                .iter()
                .all(|p| self.cells[p.current.index()] == p.glyph())
    }

    /// ASCII diagram with rank 8 at the top.
    pub fn render(&self) -> String {
        let mut out = String::from("  ABCDEFGH\n +--------+\n");
        for rank in (0..8).rev() {
            let row: String = self.cells[rank * 8..rank * 8 + 8].iter().collect();
            out.push_str(&format!("{}|{}|{}\n", rank + 1, row, rank + 1));
        }
        out.push_str(" +--------+\n  ABCDEFGH\n");
        out
    }
}

impl Default for BoardLayout {
    fn default() -> Self {
        Self::standard()
    }
}

impl FromStr for BoardLayout {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// The 64-character layout string.
impl fmt::Display for BoardLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in self.cells.iter() {
            write!(f, "{c}")?;
        }
        Ok(())
    }
}
