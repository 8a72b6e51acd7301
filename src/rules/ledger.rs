//! Square-keyed effect ledger.
//!
//! Tracks buffs granted by activated tiles, frozen pieces and freshly
//! resurrected pieces. Every entry is keyed by the square its piece currently
//! stands on, so the move pipeline must forward moves, castling shifts and
//! captures here to keep the ledger aligned with the board.

use std::collections::BTreeMap;

use crate::board::types::{Color, Square};
use crate::rules::capture::CaptureRecord;
use crate::rules::catalog::{behavior, PowerId};

/// Four full turns.
pub const FROZEN_PLY_BUDGET: u8 = 8;
/// Two full turns.
pub const RESURRECTED_PLY_BUDGET: u8 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoweredPiece {
    pub power: PowerId,
    pub uses_left: u8,
    pub owner: Color,
}

impl PoweredPiece {
    #[inline]
    pub fn is_active(&self) -> bool {
        self.uses_left > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResurrectedPiece {
    plies_left: u8,
    pub source: CaptureRecord,
}

impl ResurrectedPiece {
    #[inline]
    pub fn turns_remaining(&self) -> f32 {
        f32::from(self.plies_left) / 2.0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    powered: BTreeMap<Square, PoweredPiece>,
    frozen: BTreeMap<Square, u8>,
    resurrected: BTreeMap<Square, ResurrectedPiece>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Give the piece on `square` the buff for `power`, replacing any entry.
    pub fn grant(&mut self, square: Square, power: PowerId, owner: Color) -> PoweredPiece {
        let entry = PoweredPiece {
            power,
            uses_left: behavior(power).uses_granted,
            owner,
        };
        self.powered.insert(square, entry);
        entry
    }

    #[inline]
    pub fn powered_at(&self, square: Square) -> Option<&PoweredPiece> {
        self.powered.get(&square)
    }

    /// The power on `square` if it still has uses left.
    pub fn active_power(&self, square: Square) -> Option<PoweredPiece> {
        self.powered
            .get(&square)
            .copied()
            .filter(PoweredPiece::is_active)
    }

    pub fn has_active(&self, square: Square, power: PowerId) -> bool {
        self.active_power(square)
            .is_some_and(|entry| entry.power == power)
    }

    pub fn powered(&self) -> impl Iterator<Item = (Square, &PoweredPiece)> {
        self.powered.iter().map(|(sq, entry)| (*sq, entry))
    }

    /// The holder on `from` made a move to `to`: spend one use and follow the
    /// piece, dropping the entry once it is exhausted.
    pub fn spend_and_follow(&mut self, from: Square, to: Square) -> Option<PoweredPiece> {
        let mut entry = self.powered.remove(&from)?;
        entry.uses_left = entry.uses_left.saturating_sub(1);
        if entry.is_active() {
            self.powered.insert(to, entry);
            Some(entry)
        } else {
            None
        }
    }

    /// Move every entry keyed on `from` to `to` without spending anything.
    pub fn shift(&mut self, from: Square, to: Square) {
        if let Some(entry) = self.powered.remove(&from) {
            self.powered.insert(to, entry);
        }
        if let Some(plies) = self.frozen.remove(&from) {
            self.frozen.insert(to, plies);
        }
        if let Some(entry) = self.resurrected.remove(&from) {
            self.resurrected.insert(to, entry);
        }
    }

    pub fn remove_power(&mut self, square: Square) -> Option<PoweredPiece> {
        self.powered.remove(&square)
    }

    /// The piece on `square` left the board: drop everything keyed on it.
    pub fn strip(&mut self, square: Square) -> Option<PoweredPiece> {
        self.frozen.remove(&square);
        self.resurrected.remove(&square);
        self.powered.remove(&square)
    }

    pub fn freeze(&mut self, square: Square) {
        self.frozen.insert(square, FROZEN_PLY_BUDGET);
    }

    #[inline]
    pub fn is_frozen(&self, square: Square) -> bool {
        self.frozen.contains_key(&square)
    }

    pub fn frozen_turns(&self, square: Square) -> Option<f32> {
        self.frozen.get(&square).map(|plies| f32::from(*plies) / 2.0)
    }

    pub fn frozen(&self) -> impl Iterator<Item = Square> + '_ {
        self.frozen.keys().copied()
    }

    pub fn mark_resurrected(&mut self, square: Square, source: CaptureRecord) {
        self.resurrected.insert(
            square,
            ResurrectedPiece {
                plies_left: RESURRECTED_PLY_BUDGET,
                source,
            },
        );
    }

    #[inline]
    pub fn is_resurrected(&self, square: Square) -> bool {
        self.resurrected.contains_key(&square)
    }

    pub fn resurrected_at(&self, square: Square) -> Option<&ResurrectedPiece> {
        self.resurrected.get(&square)
    }

    pub fn resurrected(&self) -> impl Iterator<Item = Square> + '_ {
        self.resurrected.keys().copied()
    }

    /// One ply elapsed for frozen and resurrected pieces.
    pub fn tick(&mut self) {
        self.frozen.retain(|_, plies| {
            *plies = plies.saturating_sub(1);
            *plies > 0
        });
        self.resurrected.retain(|_, entry| {
            entry.plies_left = entry.plies_left.saturating_sub(1);
            entry.plies_left > 0
        });
    }
}
