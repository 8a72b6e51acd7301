//! One-ply capture greedy that accounts for the piece left hanging on the
//! destination square. Ties are broken by the oracle's rng.

use std::time::Duration;

use rand::prelude::IndexedRandom;
use rand::rngs::StdRng;

use crate::board::position::Position;
use crate::board::types::{Move, PieceKind};
use crate::oracle::oracle_trait::{oracle_rng, MoveOracle, OracleOutput};

const MATE_SCORE: i32 = 100_000;

pub struct GreedyOracle {
    rng: StdRng,
}

impl GreedyOracle {
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            rng: oracle_rng(seed),
        }
    }

    #[inline]
    fn piece_value(kind: PieceKind) -> i32 {
        match kind {
            PieceKind::Pawn => 100,
            PieceKind::Knight => 320,
            PieceKind::Bishop => 330,
            PieceKind::Rook => 500,
            PieceKind::Queen => 900,
            PieceKind::King => 20000,
        }
    }

    /// Material won, minus the mover's value when it can be taken back.
    fn score(position: &Position, mv: Move) -> Option<i32> {
        let piece = position.piece_at(mv.from)?;
        let gain = position
            .capture_square(mv)
            .and_then(|square| position.piece_at(square))
            .map_or(0, |victim| Self::piece_value(victim.kind));

        let mut scratch = position.clone();
        let applied = scratch.apply_unchecked(mv).ok()?;
        if scratch.is_checkmate() {
            return Some(MATE_SCORE);
        }
        let landed = applied.promoted_to.unwrap_or(piece.kind);
        let promotion = applied.promoted_to.map_or(0, |kind| {
            Self::piece_value(kind) - Self::piece_value(PieceKind::Pawn)
        });
        let risk = if scratch.is_square_attacked(mv.to, piece.color.opposite()) {
            Self::piece_value(landed)
        } else {
            0
        };
        Some(gain + promotion - risk)
    }
}

impl Default for GreedyOracle {
    fn default() -> Self {
        Self::new(None)
    }
}

impl MoveOracle for GreedyOracle {
    fn name(&self) -> &str {
        "greedy"
    }

    fn best_move(
        &mut self,
        position: &Position,
        allowed: &[Move],
        _think_time: Duration,
    ) -> Result<OracleOutput, String> {
        let mut out = OracleOutput::default();
        out.info_lines
            .push(format!("greedy oracle allowed_moves {}", allowed.len()));
        if allowed.is_empty() {
            return Ok(out);
        }

        let mut best_value = i32::MIN;
        let mut best_moves = Vec::new();
        for mv in allowed {
            let Some(value) = Self::score(position, *mv) else {
                continue;
            };
            if value > best_value {
                best_value = value;
                best_moves.clear();
                best_moves.push(*mv);
            } else if value == best_value {
                best_moves.push(*mv);
            }
        }

        let picked = best_moves
            .as_slice()
            .choose(&mut self.rng)
            .ok_or("no scorable move among the allowed moves")?;
        out.info_lines
            .push(format!("greedy oracle score {best_value}"));
        out.best_move = Some(*picked);
        Ok(out)
    }
}
