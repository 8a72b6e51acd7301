//! Selection and power-interaction state between moves.

use crate::board::types::Square;
use crate::game::errors::GameError;
use crate::game::orchestrator::MoveReport;
use crate::rules::catalog::PowerId;
use crate::rules::resolvers::{ChandraPlacement, GuruResolver, ShaniResolver};

/// What the next square click means. The modal variants gate ordinary piece
/// selection until they are completed or cancelled.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Interaction {
    #[default]
    Idle,
    SourceSelected(Square),
    CardSelected(PowerId),
    ActivationMode,
    ChandraPlacement(ChandraPlacement),
    GuruResolve(GuruResolver),
    ShaniResolve(ShaniResolver),
}

impl Interaction {
    /// Whether a card, activation or resolver is waiting for input.
    pub fn is_modal(&self) -> bool {
        !matches!(self, Interaction::Idle | Interaction::SourceSelected(_))
    }

    pub fn selected_source(&self) -> Option<Square> {
        match self {
            Interaction::SourceSelected(square) => Some(*square),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Interaction::Idle => "idle",
            Interaction::SourceSelected(_) => "piece selected",
            Interaction::CardSelected(_) => "card selected",
            Interaction::ActivationMode => "activation",
            Interaction::ChandraPlacement(_) => "placing clones",
            Interaction::GuruResolve(_) => "choosing resurrection",
            Interaction::ShaniResolve(_) => "choosing freeze target",
        }
    }
}

/// Result of CHANDRA confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChandraOutcome {
    Placed,
    /// The clone set would have given check; nothing was placed.
    Revealed,
}

/// What a routed square click did.
#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    Ignored,
    Selected(Square),
    TilePlaced(PowerId),
    Activated(PowerId),
    MirageToggled(Square),
    Resurrected(Square),
    Frozen(Square),
    Moved(Box<MoveReport>),
    Rejected(GameError),
}
