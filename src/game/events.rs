//! Discrete notifications for the presentation layer.

use std::fmt;

use crate::board::types::{Color, Move, Piece, PieceKind, Square};
use crate::game::config::GameMode;
use crate::rules::capture::TimeAdjustment;
use crate::rules::catalog::PowerId;
use crate::rules::horde::PieceId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum GameOverReason {
    Checkmate,
    Timeout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameResult {
    pub winner: Color,
    pub reason: GameOverReason,
    /// Final scores indexed by `Color::index`.
    pub scores: [u32; 2],
}

impl GameResult {
    #[inline]
    pub fn score(&self, color: Color) -> u32 {
        self.scores[color.index()]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    GameStarted { mode: GameMode },
    FinalStretch { color: Color },
    TilePlaced { power: PowerId, anchor: Square, color: Color, cost: u32 },
    PowerActivated { power: PowerId, square: Square, color: Color },
    NoEligibleTargets { power: PowerId },
    MoveCommitted { mv: Move, color: Color, extra_move: bool },
    Captured { piece: Piece, square: Square, adjustment: TimeAdjustment },
    TiersUnlocked { highest: u8 },
    MirageRevealed { square: Square },
    MiragesDissolved,
    ClonesPlaced { real: Square, mirages: Vec<Square>, cost: u32 },
    ChandraRevealed { square: Square },
    PieceResurrected { piece: Piece, square: Square },
    PieceFrozen { square: Square },
    RespawnScheduled { id: PieceId, kind: PieceKind, due_ms: u64 },
    PieceRespawned { id: PieceId, kind: PieceKind, square: Square },
    RespawnFailed { id: PieceId, kind: PieceKind },
    HordePieceFallen { id: PieceId },
    GameOver(GameResult),
}

impl fmt::Display for GameEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameEvent::GameStarted { mode } => write!(f, "{mode} game started"),
            GameEvent::FinalStretch { color } => {
                write!(f, "final stretch for {color}: card costs halved")
            }
            GameEvent::TilePlaced {
                power,
                anchor,
                color,
                cost,
            } => write!(f, "{color} placed {power} at {anchor} for {cost}s"),
            GameEvent::PowerActivated {
                power,
                square,
                color,
            } => write!(f, "{color} activated {power} on {square}"),
            GameEvent::NoEligibleTargets { power } => write!(f, "{power}: no eligible targets"),
            GameEvent::MoveCommitted {
                mv,
                color,
                extra_move,
            } => {
                write!(f, "{color} played {mv}")?;
                if *extra_move {
                    write!(f, " and moves again")?;
                }
                Ok(())
            }
            GameEvent::Captured {
                piece,
                square,
                adjustment,
            } => {
                write!(f, "captured {} on {square}", piece.to_fen_char())?;
                match adjustment {
                    TimeAdjustment::Award { capturer, seconds } => {
                        write!(f, " (+{seconds}s {capturer})")
                    }
                    TimeAdjustment::Swing {
                        capturer,
                        owner,
                        seconds,
                    } => write!(f, " (KETU: -{seconds}s {capturer}, +{seconds}s {owner})"),
                }
            }
            GameEvent::TiersUnlocked { highest } => write!(f, "card tiers 1-{highest} unlocked"),
            GameEvent::MirageRevealed { square } => write!(f, "mirage on {square} revealed"),
            GameEvent::MiragesDissolved => write!(f, "mirages dissolved"),
            GameEvent::ClonesPlaced { mirages, cost, .. } => {
                write!(f, "{} mirage(s) placed for {cost}s", mirages.len())
            }
            GameEvent::ChandraRevealed { square } => {
                write!(f, "CHANDRA cannot give check: {square} revealed")
            }
            GameEvent::PieceResurrected { piece, square } => {
                write!(f, "{} resurrected on {square}", piece.to_fen_char())
            }
            GameEvent::PieceFrozen { square } => write!(f, "piece on {square} frozen"),
            GameEvent::RespawnScheduled { id, kind, due_ms } => {
                write!(f, "horde {} {id} respawns at {due_ms}ms", kind.to_char())
            }
            GameEvent::PieceRespawned { id, kind, square } => {
                write!(f, "horde {} {id} respawned on {square}", kind.to_char())
            }
            GameEvent::RespawnFailed { id, kind } => {
                write!(f, "horde {} {id} could not respawn", kind.to_char())
            }
            GameEvent::HordePieceFallen { id } => write!(f, "horde piece {id} has fallen"),
            GameEvent::GameOver(result) => write!(
                f,
                "{} wins by {} (white {}, black {})",
                result.winner,
                result.reason,
                result.score(Color::Light),
                result.score(Color::Dark)
            ),
        }
    }
}
