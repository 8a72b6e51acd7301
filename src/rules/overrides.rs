//! Movement overrides granted by buffs.
//!
//! Pass-through moves follow a piece's geometric shape and ignore blockers;
//! adjacent captures let any piece take an enemy next to it. Both are played
//! with [`Position::relocate`], which skips the ordinary legality check, so
//! this module re-checks that the mover's own king is not left attacked.

use crate::board::position::{AppliedMove, Position};
use crate::board::types::{Move, Piece, PieceKind, Square};
use crate::rules::catalog::MoveOverride;

/// Whether `mv` fits the moving piece's shape, ignoring anything in between.
/// Pawns push one square (two from their start rank) onto an empty square and
/// only move diagonally to capture. Kings never castle this way.
pub fn fits_pass_through(position: &Position, piece: Piece, mv: Move) -> bool {
    if mv.from == mv.to {
        return false;
    }
    let df = mv.to.file() as i8 - mv.from.file() as i8;
    let dr = mv.to.rank() as i8 - mv.from.rank() as i8;
    let target = position.piece_at(mv.to);

    match piece.kind {
        PieceKind::Pawn => {
            let forward = piece.color.forward();
            if df == 0 {
                target.is_none()
                    && (dr == forward
                        || (mv.from.rank() == piece.color.pawn_start_rank() && dr == 2 * forward))
            } else {
                df.abs() == 1 && dr == forward && target.is_some()
            }
        }
        PieceKind::Knight => matches!((df.abs(), dr.abs()), (1, 2) | (2, 1)),
        PieceKind::Bishop => df.abs() == dr.abs(),
        PieceKind::Rook => df == 0 || dr == 0,
        PieceKind::Queen => df.abs() == dr.abs() || df == 0 || dr == 0,
        PieceKind::King => df.abs() <= 1 && dr.abs() <= 1,
    }
}

/// Whether `mv` captures an enemy piece standing next to the mover.
pub fn fits_adjacent_capture(position: &Position, piece: Piece, mv: Move) -> bool {
    mv.from != mv.to
        && mv.from.chebyshev(mv.to) <= 1
        && position
            .piece_at(mv.to)
            .is_some_and(|target| target.color != piece.color)
}

/// Whether `mv` is a valid use of `kind` for the piece on `mv.from`.
pub fn permits(position: &Position, kind: MoveOverride, mv: Move) -> bool {
    let Some(piece) = position.piece_at(mv.from) else {
        return false;
    };
    let landing_ok = match position.piece_at(mv.to) {
        None => true,
        Some(target) => target.color != piece.color && target.kind != PieceKind::King,
    };
    landing_ok
        && match kind {
            MoveOverride::PassThrough => fits_pass_through(position, piece, mv),
            MoveOverride::AdjacentCapture => fits_adjacent_capture(position, piece, mv),
        }
}

/// Outcome of trying an override.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrideResult {
    /// The move does not use the override; fall back to ordinary rules.
    NotApplicable,
    /// The shape fits but would leave the mover's king attacked.
    ExposesKing,
    Applied(AppliedMove),
}

/// Play `mv` through the override if it fits. The position is only changed
/// when the result is `Applied`.
pub fn try_override(position: &mut Position, kind: MoveOverride, mv: Move) -> OverrideResult {
    if !permits(position, kind, mv) {
        return OverrideResult::NotApplicable;
    }
    let mut scratch = position.snapshot();
    let applied = match scratch.relocate(mv.from, mv.to, mv.promotion) {
        Ok(applied) => applied,
        Err(_) => return OverrideResult::NotApplicable,
    };
    if scratch.in_check(applied.piece.color) {
        return OverrideResult::ExposesKing;
    }
    position.restore(scratch);
    OverrideResult::Applied(applied)
}

/// Every destination the override opens for the piece on `from`.
pub fn override_targets(position: &Position, kind: MoveOverride, from: Square) -> Vec<Square> {
    Square::all()
        .filter(|to| permits(position, kind, Move::new(from, *to)))
        .collect()
}
