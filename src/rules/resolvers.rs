//! Interactive resolvers for the powers that need a follow-up choice.
//!
//! CHANDRA places decoy copies of a piece on its rank, GURU brings a captured
//! piece back where it fell, SHANI freezes an enemy piece. Each resolver only
//! validates and records the player's choice; the game applies the outcome.

use crate::board::position::Position;
use crate::board::types::{Color, Piece, PieceKind, Square};
use crate::rules::capture::{CaptureLog, CaptureRecord};
use crate::rules::ledger::Ledger;
use crate::rules::zones::squares_in_radius;

pub const CHANDRA_BASE_COST: u32 = 10;
pub const CHANDRA_SECOND_MIRAGE_COST: u32 = 5;
pub const MAX_MIRAGES: usize = 2;
/// Four full turns.
pub const CHANDRA_PLY_BUDGET: u8 = 8;

/// CHANDRA step one: choosing mirage squares on the piece's rank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChandraPlacement {
    real: Square,
    piece: Piece,
    mirages: Vec<Square>,
}

impl ChandraPlacement {
    pub fn new(real: Square, piece: Piece) -> Self {
        Self {
            real,
            piece,
            mirages: Vec::with_capacity(MAX_MIRAGES),
        }
    }

    #[inline]
    pub fn real(&self) -> Square {
        self.real
    }

    #[inline]
    pub fn piece(&self) -> Piece {
        self.piece
    }

    #[inline]
    pub fn rank(&self) -> u8 {
        self.real.rank()
    }

    #[inline]
    pub fn mirages(&self) -> &[Square] {
        &self.mirages
    }

    /// Bishops keep to the square color of the real piece.
    fn parity_ok(&self, square: Square) -> bool {
        self.piece.kind != PieceKind::Bishop || square.is_light() == self.real.is_light()
    }

    /// Whether `square` can hold a mirage or the relocated real piece.
    pub fn is_slot(&self, square: Square, position: &Position) -> bool {
        square.rank() == self.rank()
            && square != self.real
            && !position.is_occupied(square)
            && self.parity_ok(square)
    }

    /// Add or remove a mirage slot. Returns false when the click is ignored.
    pub fn toggle_mirage(&mut self, square: Square, position: &Position) -> bool {
        if let Some(idx) = self.mirages.iter().position(|sq| *sq == square) {
            self.mirages.remove(idx);
            return true;
        }
        if self.mirages.len() >= MAX_MIRAGES || !self.is_slot(square, position) {
            return false;
        }
        self.mirages.push(square);
        true
    }

    /// Whether the real piece may be repositioned onto `square`.
    pub fn can_relocate_to(&self, square: Square, position: &Position) -> bool {
        self.is_slot(square, position) && !self.mirages.contains(&square)
    }

    /// Record that the real piece now stands on `square`.
    pub fn set_real(&mut self, square: Square) {
        self.real = square;
    }

    /// Clock cost of confirming the current selection.
    pub fn cost(&self) -> u32 {
        if self.mirages.len() >= MAX_MIRAGES {
            CHANDRA_BASE_COST + CHANDRA_SECOND_MIRAGE_COST
        } else {
            CHANDRA_BASE_COST
        }
    }

    pub fn into_clone(self) -> ChandraClone {
        ChandraClone {
            real: self.real,
            piece: self.piece,
            mirages: self.mirages,
            plies_left: CHANDRA_PLY_BUDGET,
        }
    }
}

/// CHANDRA step two: a live clone set on the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChandraClone {
    real: Square,
    piece: Piece,
    mirages: Vec<Square>,
    plies_left: u8,
}

impl ChandraClone {
    #[inline]
    pub fn real(&self) -> Square {
        self.real
    }

    #[inline]
    pub fn piece(&self) -> Piece {
        self.piece
    }

    #[inline]
    pub fn mirages(&self) -> &[Square] {
        &self.mirages
    }

    #[inline]
    pub fn owner(&self) -> Color {
        self.piece.color
    }

    #[inline]
    pub fn is_mirage(&self, square: Square) -> bool {
        self.mirages.contains(&square)
    }

    #[inline]
    pub fn is_real(&self, square: Square) -> bool {
        self.real == square
    }

    #[inline]
    pub fn turns_remaining(&self) -> f32 {
        f32::from(self.plies_left) / 2.0
    }

    /// Lift every mirage copy still standing off the board.
    pub fn clear_mirages(&self, position: &mut Position) {
        for square in &self.mirages {
            if position.piece_at(*square) == Some(self.piece) {
                position.remove(*square);
            }
        }
    }

    /// One ply elapsed. Returns true once the clone set has run out.
    pub fn tick(&mut self) -> bool {
        self.plies_left = self.plies_left.saturating_sub(1);
        self.plies_left == 0
    }
}

/// GURU: choose a fallen piece of the owner's color to bring back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuruResolver {
    pub anchor: Square,
    pub radius: u8,
    pub owner: Color,
    candidates: Vec<CaptureRecord>,
}

impl GuruResolver {
    /// `None` when nothing in range can be resurrected.
    pub fn open(
        anchor: Square,
        radius: u8,
        owner: Color,
        log: &CaptureLog,
        position: &Position,
    ) -> Option<Self> {
        let candidates = log.resurrection_candidates(owner, anchor, radius, position);
        if candidates.is_empty() {
            return None;
        }
        Some(Self {
            anchor,
            radius,
            owner,
            candidates,
        })
    }

    #[inline]
    pub fn candidates(&self) -> &[CaptureRecord] {
        &self.candidates
    }

    pub fn candidate_at(&self, square: Square) -> Option<CaptureRecord> {
        self.candidates
            .iter()
            .find(|record| record.square == square)
            .copied()
    }
}

/// SHANI: choose an enemy piece to freeze.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaniResolver {
    pub anchor: Square,
    pub radius: u8,
    pub owner: Color,
    targets: Vec<Square>,
}

impl ShaniResolver {
    /// `None` when no unfrozen enemy piece is in range.
    pub fn open(
        anchor: Square,
        radius: u8,
        owner: Color,
        position: &Position,
        ledger: &Ledger,
    ) -> Option<Self> {
        let enemy = owner.opposite();
        let targets: Vec<Square> = squares_in_radius(anchor, radius)
            .into_iter()
            .filter(|sq| {
                position.piece_at(*sq).is_some_and(|piece| piece.color == enemy)
                    && !ledger.is_frozen(*sq)
            })
            .collect();
        if targets.is_empty() {
            return None;
        }
        Some(Self {
            anchor,
            radius,
            owner,
            targets,
        })
    }

    #[inline]
    pub fn targets(&self) -> &[Square] {
        &self.targets
    }

    #[inline]
    pub fn is_target(&self, square: Square) -> bool {
        self.targets.contains(&square)
    }
}
