use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::NotationError;

/// The eight neighbouring offsets of a square, used for king steps and the
/// kings-adjacent restriction.
pub const KING_STEPS: [(i8, i8); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// A square on the board: file 0..8 (A..H) and rank 0..8 (1..8).
///
/// Two text encodings exist: the two-character square text (`"E2"`, case
/// insensitive on input, uppercase on output) and the rank-major index
/// `rank * 8 + file` used by board layout strings.
///
/// ```
/// use netchess_engine::coord::Coordinate;
///
/// let e2: Coordinate = "e2".parse().unwrap();
/// assert_eq!(e2.file(), 4);
/// assert_eq!(e2.rank(), 1);
/// assert_eq!(e2.index(), 12);
/// assert_eq!(e2.to_string(), "E2");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Coordinate {
    file: u8,
    rank: u8,
}

impl Coordinate {
    pub const fn new(file: u8, rank: u8) -> Option<Self> {
        if file < 8 && rank < 8 {
            Some(Self { file, rank })
        } else {
            None
        }
    }

    pub fn from_index(index: usize) -> Result<Self, NotationError> {
        if index >= 64 {
            return Err(NotationError::IndexOutOfRange(index));
        }
        Ok(Self {
            file: (index % 8) as u8,
            rank: (index / 8) as u8,
        })
    }

    pub fn file(self) -> u8 {
        self.file
    }

    pub fn rank(self) -> u8 {
        self.rank
    }

    pub fn index(self) -> usize {
        self.rank as usize * 8 + self.file as usize
    }

    /// The square `(df, dr)` away, if it is still on the board.
    pub fn offset(self, df: i8, dr: i8) -> Option<Self> {
        let file = self.file as i8 + df;
        let rank = self.rank as i8 + dr;
        if (0..8).contains(&file) && (0..8).contains(&rank) {
            Some(Self {
                file: file as u8,
                rank: rank as u8,
            })
        } else {
            None
        }
    }

    /// Destination minus origin as `(dx, dy)`.
    pub fn delta(self, to: Coordinate) -> (i8, i8) {
        (
            to.file as i8 - self.file as i8,
            to.rank as i8 - self.rank as i8,
        )
    }

    pub fn taxicab(self, other: Coordinate) -> u8 {
        let (dx, dy) = self.delta(other);
        dx.unsigned_abs() + dy.unsigned_abs()
    }

    /// On-board squares surrounding this one.
    pub fn neighbours(self) -> impl Iterator<Item = Coordinate> {
        KING_STEPS
            .iter()
            .filter_map(move |&(df, dr)| self.offset(df, dr))
    }

    /// Every square in index order.
    pub fn all() -> impl Iterator<Item = Coordinate> {
        (0u8..64).map(|i| Self {
            file: i % 8,
            rank: i / 8,
        })
    }
}

/// Unit step from `from` towards `to` when the two squares share a rank, file
/// or diagonal.
pub fn line_step(from: Coordinate, to: Coordinate) -> Option<(i8, i8)> {
    let (dx, dy) = from.delta(to);
    if (dx, dy) == (0, 0) {
        return None;
    }
    if dx == 0 || dy == 0 || dx.abs() == dy.abs() {
        Some((dx.signum(), dy.signum()))
    } else {
        None
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", (b'A' + self.file) as char, self.rank + 1)
    }
}

impl FromStr for Coordinate {
    type Err = NotationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.trim().as_bytes();
        let invalid = || NotationError::InvalidSquare(s.to_string());
        if bytes.len() != 2 {
            return Err(invalid());
        }
        let file = match bytes[0] {
            b @ b'A'..=b'H' => b - b'A',
            b @ b'a'..=b'h' => b - b'a',
            _ => return Err(invalid()),
        };
        let rank = match bytes[1] {
            b @ b'1'..=b'8' => b - b'1',
            _ => return Err(invalid()),
        };
        Ok(Self { file, rank })
    }
}

impl TryFrom<String> for Coordinate {
    type Error = NotationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Coordinate> for String {
    fn from(value: Coordinate) -> Self {
        value.to_string()
    }
}
