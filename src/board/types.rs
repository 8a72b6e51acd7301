//! Core chess value types shared by the position adapter and the rules overlay.
//!
//! Squares are indexed `0 == a1`, `7 == h1`, `63 == h8`. Every zone and range
//! computation in the overlay works on the `(file, rank)` pair exposed here.

use std::fmt;
use std::str::FromStr;

/// Errors raised by the position adapter and its parsers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PositionError {
    #[error("invalid FEN: {0}")]
    InvalidFen(String),

    #[error("invalid square: {0}")]
    InvalidSquare(String),

    #[error("invalid move notation: {0}")]
    InvalidMove(String),

    #[error("no piece on {0}")]
    EmptySquare(Square),

    #[error("illegal move {0}")]
    IllegalMove(Move),
}

/// Side to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Color {
    Light,
    Dark,
}

impl Color {
    pub const ALL: [Color; 2] = [Color::Light, Color::Dark];

    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Color::Light => 0,
            Color::Dark => 1,
        }
    }

    #[inline]
    pub const fn opposite(self) -> Self {
        match self {
            Color::Light => Color::Dark,
            Color::Dark => Color::Light,
        }
    }

    /// Rank index (0-based) a pawn of this color promotes on.
    #[inline]
    pub const fn promotion_rank(self) -> u8 {
        match self {
            Color::Light => 7,
            Color::Dark => 0,
        }
    }

    /// Rank index (0-based) pawns of this color start on.
    #[inline]
    pub const fn pawn_start_rank(self) -> u8 {
        match self {
            Color::Light => 1,
            Color::Dark => 6,
        }
    }

    /// Direction pawns of this color advance in, as a rank delta.
    #[inline]
    pub const fn forward(self) -> i8 {
        match self {
            Color::Light => 1,
            Color::Dark => -1,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Light => write!(f, "white"),
            Color::Dark => write!(f, "black"),
        }
    }
}

/// Piece kind (color is represented separately for cache-friendly layouts).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    pub const ALL: [PieceKind; 6] = [
        PieceKind::Pawn,
        PieceKind::Knight,
        PieceKind::Bishop,
        PieceKind::Rook,
        PieceKind::Queen,
        PieceKind::King,
    ];

    pub const PROMOTIONS: [PieceKind; 4] = [
        PieceKind::Knight,
        PieceKind::Bishop,
        PieceKind::Rook,
        PieceKind::Queen,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        match self {
            PieceKind::Pawn => 0,
            PieceKind::Knight => 1,
            PieceKind::Bishop => 2,
            PieceKind::Rook => 3,
            PieceKind::Queen => 4,
            PieceKind::King => 5,
        }
    }

    /// Lowercase FEN letter.
    pub const fn to_char(self) -> char {
        match self {
            PieceKind::Pawn => 'p',
            PieceKind::Knight => 'n',
            PieceKind::Bishop => 'b',
            PieceKind::Rook => 'r',
            PieceKind::Queen => 'q',
            PieceKind::King => 'k',
        }
    }

    pub fn from_char(ch: char) -> Option<Self> {
        match ch.to_ascii_lowercase() {
            'p' => Some(PieceKind::Pawn),
            'n' => Some(PieceKind::Knight),
            'b' => Some(PieceKind::Bishop),
            'r' => Some(PieceKind::Rook),
            'q' => Some(PieceKind::Queen),
            'k' => Some(PieceKind::King),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    pub color: Color,
    pub kind: PieceKind,
}

impl Piece {
    #[inline]
    pub const fn new(color: Color, kind: PieceKind) -> Self {
        Self { color, kind }
    }

    /// FEN letter, uppercase for Light.
    pub fn to_fen_char(self) -> char {
        let ch = self.kind.to_char();
        match self.color {
            Color::Light => ch.to_ascii_uppercase(),
            Color::Dark => ch,
        }
    }

    pub fn from_fen_char(ch: char) -> Option<Self> {
        let color = if ch.is_ascii_uppercase() {
            Color::Light
        } else if ch.is_ascii_lowercase() {
            Color::Dark
        } else {
            return None;
        };
        PieceKind::from_char(ch).map(|kind| Piece::new(color, kind))
    }
}

/// Board square (`0..=63`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Square(u8);

impl Square {
    #[inline]
    pub const fn from_index(index: u8) -> Option<Self> {
        if index < 64 {
            Some(Square(index))
        } else {
            None
        }
    }

    /// Build from zero-based file/rank, rejecting anything off the board.
    #[inline]
    pub const fn from_coords(file: i8, rank: i8) -> Option<Self> {
        if file < 0 || file > 7 || rank < 0 || rank > 7 {
            return None;
        }
        Some(Square((rank as u8) * 8 + file as u8))
    }

    #[inline]
    pub const fn index(self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn file(self) -> u8 {
        self.0 % 8
    }

    #[inline]
    pub const fn rank(self) -> u8 {
        self.0 / 8
    }

    #[inline]
    pub const fn bit(self) -> u64 {
        1u64 << self.0
    }

    /// Same-colored squares share parity; a1 is a dark square.
    #[inline]
    pub const fn is_light(self) -> bool {
        (self.file() + self.rank()) % 2 == 1
    }

    #[inline]
    pub fn offset(self, d_file: i8, d_rank: i8) -> Option<Self> {
        Square::from_coords(self.file() as i8 + d_file, self.rank() as i8 + d_rank)
    }

    /// King-move distance between two squares.
    #[inline]
    pub fn chebyshev(self, other: Square) -> u8 {
        let df = self.file().abs_diff(other.file());
        let dr = self.rank().abs_diff(other.rank());
        df.max(dr)
    }

    pub fn all() -> impl Iterator<Item = Square> {
        (0u8..64).map(Square)
    }

    /// Iterate the set bits of a bitboard as squares, lowest first.
    pub fn iter_bits(mut bitboard: u64) -> impl Iterator<Item = Square> {
        std::iter::from_fn(move || {
            if bitboard == 0 {
                return None;
            }
            let sq = bitboard.trailing_zeros() as u8;
            bitboard &= bitboard - 1;
            Some(Square(sq))
        })
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let file_char = char::from(b'a' + self.file());
        let rank_char = char::from(b'1' + self.rank());
        write!(f, "{file_char}{rank_char}")
    }
}

impl FromStr for Square {
    type Err = PositionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return Err(PositionError::InvalidSquare(s.to_owned()));
        }
        let (file, rank) = (bytes[0].to_ascii_lowercase(), bytes[1]);
        if !(b'a'..=b'h').contains(&file) || !(b'1'..=b'8').contains(&rank) {
            return Err(PositionError::InvalidSquare(s.to_owned()));
        }
        Ok(Square((rank - b'1') * 8 + (file - b'a')))
    }
}

/// A move request: origin, destination and optional promotion piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<PieceKind>,
}

impl Move {
    #[inline]
    pub const fn new(from: Square, to: Square) -> Self {
        Self {
            from,
            to,
            promotion: None,
        }
    }

    #[inline]
    pub const fn with_promotion(from: Square, to: Square, promotion: Option<PieceKind>) -> Self {
        Self {
            from,
            to,
            promotion,
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(promo) = self.promotion {
            write!(f, "{}", promo.to_char())?;
        }
        Ok(())
    }
}

impl FromStr for Move {
    type Err = PositionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if !s.is_ascii() || (s.len() != 4 && s.len() != 5) {
            return Err(PositionError::InvalidMove(s.to_owned()));
        }
        let from = s[0..2].parse::<Square>()?;
        let to = s[2..4].parse::<Square>()?;
        let promotion = match s[4..].chars().next() {
            None => None,
            Some(ch) => match PieceKind::from_char(ch) {
                Some(kind) if PieceKind::PROMOTIONS.contains(&kind) => Some(kind),
                _ => return Err(PositionError::InvalidMove(s.to_owned())),
            },
        };
        Ok(Move::with_promotion(from, to, promotion))
    }
}

#[cfg(test)]
mod tests {
    use super::{Color, Move, PieceKind, Square};

    #[test]
    fn square_parse_and_display_agree() {
        let a1 = "a1".parse::<Square>().expect("a1 should parse");
        let h8 = "h8".parse::<Square>().expect("h8 should parse");
        assert_eq!(a1.index(), 0);
        assert_eq!(h8.index(), 63);
        assert_eq!(h8.to_string(), "h8");
        assert!("i1".parse::<Square>().is_err());
        assert!("a9".parse::<Square>().is_err());
    }

    #[test]
    fn square_parity_matches_board_colors() {
        let a1 = "a1".parse::<Square>().expect("a1 should parse");
        let h1 = "h1".parse::<Square>().expect("h1 should parse");
        assert!(!a1.is_light());
        assert!(h1.is_light());
    }

    #[test]
    fn chebyshev_distance_is_king_distance() {
        let d4 = "d4".parse::<Square>().expect("d4 should parse");
        let f6 = "f6".parse::<Square>().expect("f6 should parse");
        let e4 = "e4".parse::<Square>().expect("e4 should parse");
        assert_eq!(d4.chebyshev(f6), 2);
        assert_eq!(d4.chebyshev(e4), 1);
    }

    #[test]
    fn long_algebraic_moves_parse_with_promotion() {
        let mv = "e7e8q".parse::<Move>().expect("promotion move should parse");
        assert_eq!(mv.promotion, Some(PieceKind::Queen));
        assert_eq!(mv.to_string(), "e7e8q");
        assert!("e7e8k".parse::<Move>().is_err());
        assert!("e7".parse::<Move>().is_err());
    }

    #[test]
    fn iter_bits_walks_lowest_first() {
        let squares: Vec<u8> = Square::iter_bits(0b1010_0001).map(Square::index).collect();
        assert_eq!(squares, vec![0, 5, 7]);
        assert_eq!(Color::Light.opposite(), Color::Dark);
    }
}
