use std::fmt;
use std::str::FromStr;

use crate::error::BoardError;

/// A cell of the physical board, `a1 = 0` through `h8 = 63`.
///
/// The index is `rank * 8 + file`, the same layout the `chess` crate uses,
/// so conversions to the rules engine are a plain index copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Square(u8);

impl Square {
    pub const COUNT: usize = 64;

    pub fn new(index: u8) -> Option<Square> {
        if (index as usize) < Self::COUNT {
            Some(Square(index))
        } else {
            None
        }
    }

    /// Builds a square from zero-based file (`a` = 0) and rank (`1` = 0).
    pub fn from_coords(file: u8, rank: u8) -> Option<Square> {
        if file < 8 && rank < 8 {
            Some(Square(rank * 8 + file))
        } else {
            None
        }
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn file(self) -> u8 {
        self.0 % 8
    }

    pub fn rank(self) -> u8 {
        self.0 / 8
    }

    pub fn all() -> impl Iterator<Item = Square> {
        (0..Self::COUNT as u8).map(Square)
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", (b'a' + self.file()) as char, (b'1' + self.rank()) as char)
    }
}

impl FromStr for Square {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let bytes = lower.as_bytes();
        if bytes.len() != 2 {
            return Err(BoardError::InvalidSquare(s.to_string()));
        }
        let file = bytes[0].wrapping_sub(b'a');
        let rank = bytes[1].wrapping_sub(b'1');
        Square::from_coords(file, rank).ok_or_else(|| BoardError::InvalidSquare(s.to_string()))
    }
}

impl From<chess::Square> for Square {
    fn from(square: chess::Square) -> Square {
        Square(square.to_index() as u8)
    }
}

impl From<Square> for chess::Square {
    fn from(square: Square) -> chess::Square {
        chess::Square::make_square(
            chess::Rank::from_index(square.rank() as usize),
            chess::File::from_index(square.file() as usize),
        )
    }
}

/// Piece chosen when a pawn reaches the last rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Promotion {
    Queen,
    Rook,
    Bishop,
    Knight,
}

impl Promotion {
    fn from_char(c: char) -> Option<Promotion> {
        match c.to_ascii_lowercase() {
            'q' => Some(Promotion::Queen),
            'r' => Some(Promotion::Rook),
            'b' => Some(Promotion::Bishop),
            'n' => Some(Promotion::Knight),
            _ => None,
        }
    }

    fn as_char(self) -> char {
        match self {
            Promotion::Queen => 'q',
            Promotion::Rook => 'r',
            Promotion::Bishop => 'b',
            Promotion::Knight => 'n',
        }
    }
}

/// A move in UCI long-algebraic form, e.g. `e2e4` or `e7e8q`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoardMove {
    pub start: Square,
    pub end: Square,
    pub promotion: Option<Promotion>,
}

impl BoardMove {
    pub fn new(start: Square, end: Square) -> BoardMove {
        BoardMove {
            start,
            end,
            promotion: None,
        }
    }

    pub fn with_promotion(mut self, promotion: Promotion) -> BoardMove {
        self.promotion = Some(promotion);
        self
    }
}

impl fmt::Display for BoardMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.start, self.end)?;
        if let Some(promotion) = self.promotion {
            write!(f, "{}", promotion.as_char())?;
        }
        Ok(())
    }
}

impl FromStr for BoardMove {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let invalid = || BoardError::InvalidNotation(s.to_string());
        if !text.is_ascii() || !(text.len() == 4 || text.len() == 5) {
            return Err(invalid());
        }
        let start: Square = text[0..2].parse().map_err(|_| invalid())?;
        let end: Square = text[2..4].parse().map_err(|_| invalid())?;
        let promotion = match text[4..].chars().next() {
            Some(c) => Some(Promotion::from_char(c).ok_or_else(invalid)?),
            None => None,
        };
        Ok(BoardMove {
            start,
            end,
            promotion,
        })
    }
}
