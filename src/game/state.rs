//! The per-game aggregate. Built fresh for every game and owned by
//! [`Game`](crate::game::orchestrator::Game); nothing here is global.

use crate::board::position::Position;
use crate::board::types::{Color, Move, Square};
use crate::game::events::GameOverReason;
use crate::rules::capture::CaptureLog;
use crate::rules::catalog::{PowerId, TierUnlocks};
use crate::rules::clock::Clock;
use crate::rules::horde::{HordeTracker, RespawnQueue};
use crate::rules::ledger::Ledger;
use crate::rules::resolvers::ChandraClone;
use crate::rules::zones::ZoneRegistry;

pub const CHECKMATE_BONUS: u32 = 10;
pub const TIMEOUT_BONUS: u32 = 5;

/// One entry of the game record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryEntry {
    Move {
        /// Full-move number the move was played in.
        number: u16,
        color: Color,
        mv: Move,
        check: bool,
    },
    /// Power usage between moves, written as a comment.
    Note(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    pub position: Position,
    pub clock: Clock,
    pub zones: ZoneRegistry,
    pub ledger: Ledger,
    pub chandra: Option<ChandraClone>,
    pub captures: CaptureLog,
    pub tiers: TierUnlocks,
    pub used_cards: Vec<PowerId>,
    pub horde: Option<HordeTracker>,
    pub respawns: RespawnQueue,
    /// Committed moves, both colors.
    pub plies: u32,
    pub history: Vec<HistoryEntry>,
    /// Milliseconds of running game time.
    pub elapsed_ms: u64,
    /// Sub-second remainder not yet charged to a clock.
    pub tick_carry_ms: u64,
}

impl GameState {
    pub fn new(start_seconds: u32) -> Self {
        Self {
            position: Position::new_game(),
            clock: Clock::new(start_seconds),
            zones: ZoneRegistry::new(),
            ledger: Ledger::new(),
            chandra: None,
            captures: CaptureLog::new(),
            tiers: TierUnlocks::default(),
            used_cards: Vec::new(),
            horde: None,
            respawns: RespawnQueue::new(),
            plies: 0,
            history: Vec::new(),
            elapsed_ms: 0,
            tick_carry_ms: 0,
        }
    }

    #[inline]
    pub fn is_card_used(&self, power: PowerId) -> bool {
        self.used_cards.contains(&power)
    }

    #[inline]
    pub fn is_mirage(&self, square: Square) -> bool {
        self.chandra
            .as_ref()
            .is_some_and(|clone| clone.is_mirage(square))
    }

    /// Material won by `color`.
    #[inline]
    pub fn material(&self, color: Color) -> u32 {
        self.captures.material(color)
    }

    /// Material plus the win bonus for `winner`.
    pub fn final_scores(&self, winner: Color, reason: GameOverReason) -> [u32; 2] {
        let bonus = match reason {
            GameOverReason::Checkmate => CHECKMATE_BONUS,
            GameOverReason::Timeout => TIMEOUT_BONUS,
        };
        let mut scores = [self.material(Color::Light), self.material(Color::Dark)];
        scores[winner.index()] += bonus;
        scores
    }

    pub(crate) fn note(&mut self, text: String) {
        self.history.push(HistoryEntry::Note(text));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::types::PieceKind;
    use crate::rules::capture::CaptureRecord;

    #[test]
    fn fresh_state_is_empty() {
        let state = GameState::new(100);
        assert_eq!(state.plies, 0);
        assert_eq!(state.clock.remaining(Color::Light), 100);
        assert!(state.zones.is_empty());
        assert!(state.history.is_empty());
        assert!(state.chandra.is_none());
    }

    #[test]
    fn scores_add_bonus_to_winner() {
        let mut state = GameState::new(100);
        let square: Square = "e5".parse().expect("square");
        state.captures.push(
            Color::Light,
            CaptureRecord {
                kind: PieceKind::Rook,
                color: Color::Dark,
                square,
            },
        );
        assert_eq!(
            state.final_scores(Color::Light, GameOverReason::Checkmate),
            [15, 0]
        );
        assert_eq!(
            state.final_scores(Color::Dark, GameOverReason::Timeout),
            [5, 5]
        );
    }
}
