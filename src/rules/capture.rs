//! Capture pipeline: time awards, capture hooks, history and tier unlocks.

use crate::board::position::Position;
use crate::board::types::{Color, Piece, PieceKind, Square};
use crate::rules::catalog::{behavior, AttackerHook, TierUnlocks, VictimHook};
use crate::rules::clock::{Clock, ClockUpdate};
use crate::rules::ledger::{Ledger, PoweredPiece};

/// A piece removed from the board by a real capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CaptureRecord {
    pub kind: PieceKind,
    pub color: Color,
    pub square: Square,
}

/// Seconds credited for capturing a piece of `kind`.
pub const fn time_award(kind: PieceKind) -> u32 {
    match kind {
        PieceKind::Pawn => 2,
        PieceKind::Knight | PieceKind::Bishop => 4,
        PieceKind::Rook => 6,
        PieceKind::Queen => 8,
        PieceKind::King => 0,
    }
}

/// Conventional material value used for final scoring.
pub const fn material_value(kind: PieceKind) -> u32 {
    match kind {
        PieceKind::Pawn => 1,
        PieceKind::Knight | PieceKind::Bishop => 3,
        PieceKind::Rook => 5,
        PieceKind::Queen => 9,
        PieceKind::King => 0,
    }
}

/// Card tier opened by capturing a piece of `kind`.
pub const fn tier_unlocked_by(kind: PieceKind) -> u8 {
    match kind {
        PieceKind::Pawn => 1,
        PieceKind::Knight | PieceKind::Bishop => 2,
        PieceKind::Rook | PieceKind::Queen => 3,
        PieceKind::King => 0,
    }
}

/// How the clocks moved because of a capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeAdjustment {
    Award { capturer: Color, seconds: u32 },
    Swing { capturer: Color, owner: Color, seconds: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureContext {
    pub capturer: Color,
    pub victim: Piece,
    pub square: Square,
    /// Buff carried by the capturing piece before the move.
    pub attacker_power: Option<PoweredPiece>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureReport {
    pub record: CaptureRecord,
    pub adjustment: TimeAdjustment,
    /// Buff the victim was carrying.
    pub victim_power: Option<PoweredPiece>,
    pub tiers_changed: bool,
    /// Clock side effects on the capturer (a swing can push it into the
    /// final stretch).
    pub capturer_clock: ClockUpdate,
}

/// Ordered capture history plus per-side captured lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureLog {
    records: Vec<CaptureRecord>,
    captured_by: [Vec<PieceKind>; 2],
}

impl CaptureLog {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn records(&self) -> &[CaptureRecord] {
        &self.records
    }

    /// Kinds `color` has captured, in order.
    #[inline]
    pub fn captured_by(&self, color: Color) -> &[PieceKind] {
        &self.captured_by[color.index()]
    }

    pub fn push(&mut self, capturer: Color, record: CaptureRecord) {
        self.records.push(record);
        self.captured_by[capturer.index()].push(record.kind);
    }

    /// Material `color` has won by capturing.
    pub fn material(&self, color: Color) -> u32 {
        self.captured_by(color)
            .iter()
            .map(|kind| material_value(*kind))
            .sum()
    }

    /// Records of `color` captured inside the zone whose square is empty now.
    pub fn resurrection_candidates(
        &self,
        color: Color,
        anchor: Square,
        radius: u8,
        position: &Position,
    ) -> Vec<CaptureRecord> {
        self.records
            .iter()
            .filter(|record| {
                record.color == color
                    && anchor.chebyshev(record.square) <= radius
                    && !position.is_occupied(record.square)
            })
            .copied()
            .collect()
    }

    /// Remove the first record matching `record` exactly.
    pub fn take(&mut self, record: &CaptureRecord) -> Option<CaptureRecord> {
        let idx = self.records.iter().position(|r| r == record)?;
        Some(self.records.remove(idx))
    }
}

/// Run the capture transaction for one removed enemy piece. Steps run in a
/// fixed order: award, attacker multiplier, victim swing override, clock
/// credit, ledger strip, history, captured list, tier unlock.
pub fn resolve_capture(
    ctx: &CaptureContext,
    clock: &mut Clock,
    ledger: &mut Ledger,
    log: &mut CaptureLog,
    tiers: &mut TierUnlocks,
) -> CaptureReport {
    let mut award = time_award(ctx.victim.kind);
    if let Some(attacker) = ctx.attacker_power.filter(PoweredPiece::is_active) {
        if let Some(AttackerHook::MultiplyAward(factor)) = behavior(attacker.power).on_attack {
            award *= factor;
        }
    }

    let victim_power = ledger.active_power(ctx.square);
    let swing = victim_power.and_then(|entry| match behavior(entry.power).on_captured {
        Some(VictimHook::TimeSwing(seconds)) => Some(seconds),
        None => None,
    });

    let owner = ctx.victim.color;
    let (adjustment, capturer_clock) = match swing {
        Some(seconds) => {
            let update = clock.subtract(ctx.capturer, seconds);
            clock.add(owner, seconds);
            (
                TimeAdjustment::Swing {
                    capturer: ctx.capturer,
                    owner,
                    seconds,
                },
                update,
            )
        }
        None => {
            clock.add(ctx.capturer, award);
            (
                TimeAdjustment::Award {
                    capturer: ctx.capturer,
                    seconds: award,
                },
                ClockUpdate::default(),
            )
        }
    };

    ledger.strip(ctx.square);

    let record = CaptureRecord {
        kind: ctx.victim.kind,
        color: owner,
        square: ctx.square,
    };
    log.push(ctx.capturer, record);

    let tiers_changed = tiers.unlock_through(tier_unlocked_by(ctx.victim.kind));

    CaptureReport {
        record,
        adjustment,
        victim_power,
        tiers_changed,
        capturer_clock,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::catalog::PowerId;

    fn sq(name: &str) -> Square {
        name.parse().expect("test square should parse")
    }

    fn context(victim: PieceKind, attacker_power: Option<PoweredPiece>) -> CaptureContext {
        CaptureContext {
            capturer: Color::Light,
            victim: Piece::new(Color::Dark, victim),
            square: sq("e5"),
            attacker_power,
        }
    }

    #[test]
    fn plain_pawn_capture_awards_two_and_unlocks_tier_one() {
        let mut clock = Clock::new(50);
        let mut ledger = Ledger::new();
        let mut log = CaptureLog::new();
        let mut tiers = TierUnlocks::default();

        let report = resolve_capture(
            &context(PieceKind::Pawn, None),
            &mut clock,
            &mut ledger,
            &mut log,
            &mut tiers,
        );

        assert_eq!(clock.remaining(Color::Light), 52);
        assert_eq!(
            report.adjustment,
            TimeAdjustment::Award {
                capturer: Color::Light,
                seconds: 2
            }
        );
        assert!(tiers.is_unlocked(1) && !tiers.is_unlocked(2));
        assert_eq!(log.captured_by(Color::Light), &[PieceKind::Pawn]);
        assert_eq!(log.records().len(), 1);
    }

    #[test]
    fn shukra_triples_the_award() {
        let mut clock = Clock::new(50);
        let shukra = PoweredPiece {
            power: PowerId::Shukra,
            uses_left: 2,
            owner: Color::Light,
        };
        resolve_capture(
            &context(PieceKind::Rook, Some(shukra)),
            &mut clock,
            &mut Ledger::new(),
            &mut CaptureLog::new(),
            &mut TierUnlocks::default(),
        );
        assert_eq!(clock.remaining(Color::Light), 68);
    }

    #[test]
    fn ketu_victim_swaps_twelve_seconds_instead_of_award() {
        let mut clock = Clock::new(50);
        let mut ledger = Ledger::new();
        ledger.grant(sq("e5"), PowerId::Ketu, Color::Dark);
        let shukra = PoweredPiece {
            power: PowerId::Shukra,
            uses_left: 1,
            owner: Color::Light,
        };

        let report = resolve_capture(
            &context(PieceKind::Queen, Some(shukra)),
            &mut clock,
            &mut ledger,
            &mut CaptureLog::new(),
            &mut TierUnlocks::default(),
        );

        assert_eq!(clock.remaining(Color::Light), 38);
        assert_eq!(clock.remaining(Color::Dark), 62);
        assert!(matches!(report.adjustment, TimeAdjustment::Swing { seconds: 12, .. }));
        assert!(ledger.powered_at(sq("e5")).is_none());
    }

    #[test]
    fn resurrection_candidates_need_empty_square_in_range() {
        let mut log = CaptureLog::new();
        let position = Position::new_game();
        log.push(
            Color::Dark,
            CaptureRecord {
                kind: PieceKind::Knight,
                color: Color::Light,
                square: sq("d4"),
            },
        );
        log.push(
            Color::Dark,
            CaptureRecord {
                kind: PieceKind::Pawn,
                color: Color::Light,
                square: sq("d2"),
            },
        );
        let candidates = log.resurrection_candidates(Color::Light, sq("d3"), 2, &position);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].square, sq("d4"));
        assert_eq!(log.material(Color::Dark), 4);
    }
}
