use crate::board::types::{Color, PositionError, Square};
use crate::rules::catalog::PowerId;

/// Why a move request was refused. A refused move never changes the game.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoveRejection {
    #[error("the game is not running")]
    NotRunning,

    #[error("the horde is to move")]
    BotTurn,

    #[error("finish the pending power interaction first")]
    InteractionPending,

    #[error("no piece on {0}")]
    NoPiece(Square),

    #[error("the piece on {square} belongs to {owner}, not the side to move")]
    WrongColor { square: Square, owner: Color },

    #[error("the piece on {0} is frozen")]
    Frozen(Square),

    #[error("the resurrected piece on {0} cannot move yet")]
    ResurrectedSource(Square),

    #[error("the resurrected piece on {0} cannot be captured yet")]
    ResurrectedTarget(Square),

    #[error("the piece on {0} is a mirage")]
    MirageSource(Square),

    #[error("the piece on {0} is shielded by SURYA")]
    Shielded(Square),

    #[error("the move would leave the king in check")]
    ExposesKing,

    #[error("illegal move")]
    Illegal,
}

/// Errors surfaced to the presentation layer. None of them end the process.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("move rejected: {0}")]
    RejectedMove(#[from] MoveRejection),

    #[error("no eligible targets for {0}")]
    NoEligibleTargets(PowerId),

    #[error("move oracle unavailable: {0}")]
    OracleUnavailable(String),

    #[error("move oracle found no move")]
    OracleNoMove,

    #[error("card {0} is not available")]
    CardUnavailable(PowerId),

    #[error("no card selected")]
    NoCardSelected,

    #[error("the game is not running")]
    NotRunning,

    #[error("invalid square for this action: {0}")]
    InvalidSquare(Square),

    #[error(transparent)]
    Position(#[from] PositionError),
}
