//! Turn and move orchestration.
//!
//! [`Game`] is the only thing that mutates a [`GameState`]. Every move, human
//! or horde, goes through [`play_move`] on a scratch copy of the state; the
//! copy replaces the live state only when the whole pipeline succeeded, so a
//! rejected move leaves nothing behind.

use std::time::Duration;

use tracing::{debug, info};

use crate::board::position::{AppliedMove, Position, STARTING_POSITION_FEN};
use crate::board::types::{Color, Move, Piece, PieceKind, Square};
use crate::game::config::{GameConfig, GameMode};
use crate::game::decorations::SquareDecorations;
use crate::game::errors::{GameError, MoveRejection};
use crate::game::events::{GameEvent, GameOverReason, GameResult};
use crate::game::interaction::{ChandraOutcome, ClickOutcome, Interaction};
use crate::game::state::{GameState, HistoryEntry};
use crate::rules::capture::{resolve_capture, CaptureContext, CaptureReport};
use crate::rules::catalog::{behavior, card, PowerId, ResolverKind};
use crate::rules::horde::{CaptureFate, HordeTracker, RespawnTask};
use crate::rules::overrides::{try_override, OverrideResult};
use crate::rules::resolvers::{ChandraPlacement, GuruResolver, ShaniResolver};
use crate::rules::zones::ActivationCandidate;

/// The human side in horde mode.
pub const HUMAN_COLOR: Color = Color::Light;
/// The computer-controlled side in horde mode.
pub const HORDE_COLOR: Color = Color::Dark;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    NotStarted,
    Running,
    Over(GameResult),
}

/// What a committed move did.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveReport {
    pub applied: AppliedMove,
    /// The move landed on a CHANDRA mirage instead of a real piece.
    pub revealed_mirage: bool,
    /// BUDHA kept the turn with the mover.
    pub extra_move: bool,
    pub capture: Option<CaptureReport>,
}

struct PipelineContext {
    mode: GameMode,
    session_id: u64,
    respawn_delay_ms: u64,
}

pub struct Game {
    config: GameConfig,
    mode: Option<GameMode>,
    phase: GamePhase,
    state: GameState,
    interaction: Interaction,
    events: Vec<GameEvent>,
    session_id: u64,
    initial_fen: String,
}

impl Game {
    pub fn new(config: GameConfig) -> Self {
        let state = GameState::new(config.start_seconds);
        Self {
            config,
            mode: None,
            phase: GamePhase::NotStarted,
            state,
            interaction: Interaction::Idle,
            events: Vec::new(),
            session_id: 0,
            initial_fen: STARTING_POSITION_FEN.to_owned(),
        }
    }

    pub fn start(&mut self, mode: GameMode) {
        self.start_with_position(mode, Position::new_game());
    }

    /// Start from an arbitrary position. Horde identities are taken from the
    /// pieces on the board.
    pub fn start_from_fen(&mut self, mode: GameMode, fen: &str) -> Result<(), GameError> {
        let position = Position::from_fen(fen)?;
        self.start_with_position(mode, position);
        Ok(())
    }

    fn start_with_position(&mut self, mode: GameMode, position: Position) {
        self.session_id += 1;
        let mut state = GameState::new(self.config.start_seconds);
        if mode == GameMode::Horde {
            state.horde = Some(HordeTracker::new(&position, HORDE_COLOR));
        }
        self.initial_fen = position.to_fen();
        state.position = position;
        self.state = state;
        self.mode = Some(mode);
        self.phase = GamePhase::Running;
        self.interaction = Interaction::Idle;
        self.events.push(GameEvent::GameStarted { mode });
        info!(%mode, session = self.session_id, "game started");
    }

    /// Drop the current game. Pending respawns and oracle replies from the
    /// old session become stale.
    pub fn reset(&mut self) {
        self.session_id += 1;
        self.state = GameState::new(self.config.start_seconds);
        self.mode = None;
        self.phase = GamePhase::NotStarted;
        self.interaction = Interaction::Idle;
        self.events.clear();
        self.initial_fen = STARTING_POSITION_FEN.to_owned();
        info!(session = self.session_id, "game reset");
    }

    #[inline]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    #[inline]
    pub fn mode(&self) -> Option<GameMode> {
        self.mode
    }

    #[inline]
    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.phase == GamePhase::Running
    }

    pub fn result(&self) -> Option<GameResult> {
        match self.phase {
            GamePhase::Over(result) => Some(result),
            _ => None,
        }
    }

    #[inline]
    pub fn session_id(&self) -> u64 {
        self.session_id
    }

    /// FEN of the position the current game started from.
    #[inline]
    pub fn initial_fen(&self) -> &str {
        &self.initial_fen
    }

    #[inline]
    pub fn state(&self) -> &GameState {
        &self.state
    }

    #[inline]
    pub fn position(&self) -> &Position {
        &self.state.position
    }

    #[inline]
    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    #[inline]
    pub fn side_to_move(&self) -> Color {
        self.state.position.side_to_move()
    }

    pub fn clock_remaining(&self, color: Color) -> u32 {
        self.state.clock.remaining(color)
    }

    pub fn captured_by(&self, color: Color) -> &[PieceKind] {
        self.state.captures.captured_by(color)
    }

    pub fn material(&self, color: Color) -> u32 {
        self.state.material(color)
    }

    /// Take every event raised since the last call.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    fn is_horde(&self) -> bool {
        self.mode == Some(GameMode::Horde)
    }

    /// Whether the horde oracle should be asked for a move.
    pub fn is_bot_turn(&self) -> bool {
        self.is_running() && self.is_horde() && self.side_to_move() == HORDE_COLOR
    }

    fn is_human_turn(&self) -> bool {
        !(self.is_horde() && self.side_to_move() == HORDE_COLOR)
    }

    fn ensure_running(&self) -> Result<(), GameError> {
        if self.is_running() {
            Ok(())
        } else {
            Err(GameError::NotRunning)
        }
    }

    fn respawn_delay_ms(&self) -> u64 {
        u64::try_from(self.config.respawn_delay.as_millis()).unwrap_or(u64::MAX)
    }

    fn finish(&mut self, winner: Color, reason: GameOverReason) {
        let result = GameResult {
            winner,
            reason,
            scores: self.state.final_scores(winner, reason),
        };
        self.phase = GamePhase::Over(result);
        self.interaction = Interaction::Idle;
        self.state.respawns.purge();
        self.events.push(GameEvent::GameOver(result));
        info!(%winner, %reason, light = result.score(Color::Light), dark = result.score(Color::Dark), "game over");
    }

    // ---------------------------------------------------------------------
    // Moves
    // ---------------------------------------------------------------------

    /// Select a piece of the side to move as the source of the next move.
    pub fn select_source(&mut self, square: Square) -> bool {
        if !self.is_running() || !self.is_human_turn() || self.interaction.is_modal() {
            return false;
        }
        let own = self
            .state
            .position
            .piece_at(square)
            .is_some_and(|piece| piece.color == self.side_to_move());
        if !own || self.state.ledger.is_frozen(square) {
            return false;
        }
        self.interaction = Interaction::SourceSelected(square);
        true
    }

    /// Human move request. The selection is cleared whether or not the move
    /// goes through.
    pub fn attempt_move(&mut self, mv: Move) -> Result<MoveReport, GameError> {
        if !self.is_running() {
            return Err(MoveRejection::NotRunning.into());
        }
        if !self.is_human_turn() {
            return Err(MoveRejection::BotTurn.into());
        }
        if self.interaction.is_modal() {
            return Err(MoveRejection::InteractionPending.into());
        }
        self.interaction = Interaction::Idle;
        self.commit(mv)
    }

    /// Apply a move chosen by the horde oracle.
    pub fn apply_bot_move(&mut self, mv: Move) -> Result<MoveReport, GameError> {
        if !self.is_running() {
            return Err(MoveRejection::NotRunning.into());
        }
        if !self.is_bot_turn() {
            return Err(GameError::RejectedMove(MoveRejection::Illegal));
        }
        self.commit(mv)
    }

    /// Legal moves the overlay does not forbid, as offered to the oracle.
    pub fn bot_allowed_moves(&self) -> Vec<Move> {
        self.state
            .position
            .legal_moves()
            .into_iter()
            .filter(|mv| precheck(&self.state, *mv).is_ok())
            .collect()
    }

    fn commit(&mut self, mv: Move) -> Result<MoveReport, GameError> {
        let ctx = PipelineContext {
            mode: self.mode.unwrap_or(GameMode::Standard),
            session_id: self.session_id,
            respawn_delay_ms: self.respawn_delay_ms(),
        };
        let mut next = self.state.clone();
        let mut events = Vec::new();
        let report = match play_move(&mut next, mv, &ctx, &mut events) {
            Ok(report) => report,
            Err(rejection) => {
                debug!(%mv, %rejection, "move rejected");
                return Err(rejection.into());
            }
        };
        self.state = next;
        self.events.append(&mut events);

        let mover = report.applied.piece.color;
        let position = &self.state.position;
        if position.side_to_move() != mover && position.is_checkmate() {
            self.finish(mover, GameOverReason::Checkmate);
        }
        Ok(report)
    }

    // ---------------------------------------------------------------------
    // Cards and tiles
    // ---------------------------------------------------------------------

    /// Price of `power` for the side to move right now.
    pub fn card_cost(&self, power: PowerId) -> u32 {
        let color = self.side_to_move();
        card(power).cost_for(
            self.mode.unwrap_or(GameMode::Standard),
            self.state.clock.in_final_stretch(color),
        )
    }

    pub fn is_card_available(&self, power: PowerId) -> bool {
        self.is_running()
            && self.is_human_turn()
            && self.state.tiers.is_unlocked(card(power).tier)
            && !self.state.is_card_used(power)
    }

    pub fn select_card(&mut self, power: PowerId) -> Result<(), GameError> {
        self.ensure_running()?;
        let switchable = matches!(
            self.interaction,
            Interaction::Idle | Interaction::SourceSelected(_) | Interaction::CardSelected(_)
        );
        if !switchable || !self.is_card_available(power) {
            return Err(GameError::CardUnavailable(power));
        }
        self.interaction = Interaction::CardSelected(power);
        Ok(())
    }

    pub fn cancel_card(&mut self) {
        if matches!(self.interaction, Interaction::CardSelected(_)) {
            self.interaction = Interaction::Idle;
        }
    }

    /// Place the selected card's tile centred on `anchor`, paying its price
    /// from the side to move.
    pub fn place_tile(&mut self, anchor: Square) -> Result<(), GameError> {
        self.ensure_running()?;
        let Interaction::CardSelected(power) = self.interaction else {
            return Err(GameError::NoCardSelected);
        };
        let color = self.side_to_move();
        let cost = self.card_cost(power);
        let radius = card(power).radius;

        let update = self.state.clock.subtract(color, cost);
        if update.entered_final_stretch {
            self.events.push(GameEvent::FinalStretch { color });
        }
        self.state.zones.place(anchor, power, radius);
        self.state.used_cards.push(power);
        self.state.note(format!("{power} tile at {anchor}"));
        self.interaction = Interaction::Idle;
        self.events.push(GameEvent::TilePlaced {
            power,
            anchor,
            color,
            cost,
        });
        info!(%power, %anchor, %color, cost, "tile placed");
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Activation
    // ---------------------------------------------------------------------

    pub fn enter_activation_mode(&mut self) -> Result<(), GameError> {
        self.ensure_running()?;
        if !self.is_human_turn() || self.interaction.is_modal() {
            return Err(MoveRejection::InteractionPending.into());
        }
        self.interaction = Interaction::ActivationMode;
        Ok(())
    }

    pub fn exit_activation_mode(&mut self) {
        if self.interaction == Interaction::ActivationMode {
            self.interaction = Interaction::Idle;
        }
    }

    /// Pieces of the side to move that could take a power right now.
    pub fn eligible_activations(&self) -> Vec<ActivationCandidate> {
        let state = &self.state;
        state.zones.eligible_pieces(
            &state.position,
            state.position.side_to_move(),
            |square| state.ledger.powered_at(square).is_some() || state.is_mirage(square),
        )
    }

    /// Trigger the first live tile covering `square` for the piece standing
    /// there. Buff powers are granted at once; resolver powers open their
    /// interaction. A square outside the eligible set is ignored.
    pub fn activate(&mut self, square: Square) -> Result<Option<PowerId>, GameError> {
        self.ensure_running()?;
        if self.interaction != Interaction::ActivationMode {
            return Ok(None);
        }
        if !self.eligible_activations().iter().any(|c| c.square == square) {
            return Ok(None);
        }
        let color = self.side_to_move();
        let Some(piece) = self.state.position.piece_at(square) else {
            return Ok(None);
        };
        let Some(tile) = self.state.zones.first_activatable(square, color) else {
            return Ok(None);
        };
        let (power, anchor, radius) = (tile.power, tile.anchor, tile.radius);

        let next = match behavior(power).resolver {
            None => Interaction::Idle,
            Some(ResolverKind::Clone) => {
                if piece.kind == PieceKind::King {
                    return self.no_eligible_targets(power);
                }
                Interaction::ChandraPlacement(ChandraPlacement::new(square, piece))
            }
            Some(ResolverKind::Resurrect) => match GuruResolver::open(
                anchor,
                radius,
                color,
                &self.state.captures,
                &self.state.position,
            ) {
                Some(resolver) => Interaction::GuruResolve(resolver),
                None => return self.no_eligible_targets(power),
            },
            Some(ResolverKind::Freeze) => match ShaniResolver::open(
                anchor,
                radius,
                color,
                &self.state.position,
                &self.state.ledger,
            ) {
                Some(resolver) => Interaction::ShaniResolve(resolver),
                None => return self.no_eligible_targets(power),
            },
        };

        self.state.zones.activate(square, color);
        if behavior(power).resolver.is_none() {
            self.state.ledger.grant(square, power, color);
        }
        self.interaction = next;
        self.state.note(format!("{power} activated on {square}"));
        self.events.push(GameEvent::PowerActivated {
            power,
            square,
            color,
        });
        info!(%power, %square, %color, "power activated");
        Ok(Some(power))
    }

    /// Resolver would open empty: the tile stays unused and activation ends.
    fn no_eligible_targets(&mut self, power: PowerId) -> Result<Option<PowerId>, GameError> {
        self.interaction = Interaction::Idle;
        self.events.push(GameEvent::NoEligibleTargets { power });
        debug!(%power, "resolver has no eligible targets");
        Err(GameError::NoEligibleTargets(power))
    }

    /// Close whatever card, activation or resolver is open. A resolver's
    /// tile activation stays spent.
    pub fn cancel_interaction(&mut self) -> bool {
        if self.interaction == Interaction::Idle {
            return false;
        }
        debug!(interaction = self.interaction.label(), "interaction cancelled");
        self.interaction = Interaction::Idle;
        true
    }

    // ---------------------------------------------------------------------
    // Resolvers
    // ---------------------------------------------------------------------

    pub fn chandra_toggle(&mut self, square: Square) -> bool {
        let Interaction::ChandraPlacement(placement) = &mut self.interaction else {
            return false;
        };
        placement.toggle_mirage(square, &self.state.position)
    }

    /// Move the real CHANDRA piece along its rank before confirming. Free,
    /// but never onto a square that leaves its own king attacked.
    pub fn chandra_relocate(&mut self, square: Square) -> bool {
        let Interaction::ChandraPlacement(placement) = &mut self.interaction else {
            return false;
        };
        let state = &mut self.state;
        if !placement.can_relocate_to(square, &state.position) {
            return false;
        }
        let from = placement.real();
        let piece = placement.piece();
        let mut scratch = state.position.snapshot();
        scratch.remove(from);
        scratch.put(square, piece);
        if scratch.in_check(piece.color) {
            return false;
        }
        state.position.restore(scratch);
        state.ledger.shift(from, square);
        state.zones.shift_binding(from, square);
        placement.set_real(square);
        debug!(%from, to = %square, "CHANDRA piece relocated");
        true
    }

    /// Pay for and place the chosen mirages. `None` when nothing is chosen
    /// yet; the placement stays open in that case.
    pub fn chandra_confirm(&mut self) -> Option<ChandraOutcome> {
        let Interaction::ChandraPlacement(placement) = &self.interaction else {
            return None;
        };
        if placement.mirages().is_empty() {
            return None;
        }
        let Interaction::ChandraPlacement(placement) = std::mem::take(&mut self.interaction)
        else {
            return None;
        };

        let color = placement.piece().color;
        let cost = placement.cost();
        let update = self.state.clock.subtract(color, cost);
        if update.entered_final_stretch {
            self.events.push(GameEvent::FinalStretch { color });
        }

        let mut scratch = self.state.position.snapshot();
        for square in placement.mirages() {
            scratch.put(*square, placement.piece());
        }
        let gives_check = std::iter::once(placement.real())
            .chain(placement.mirages().iter().copied())
            .any(|square| scratch.attacks_king_from(square));
        if gives_check {
            let square = placement.real();
            self.events.push(GameEvent::ChandraRevealed { square });
            self.state.note(format!("CHANDRA revealed on {square}"));
            debug!(%square, "clone set would give check");
            return Some(ChandraOutcome::Revealed);
        }

        self.state.position.restore(scratch);
        let real = placement.real();
        let mirages = placement.mirages().to_vec();
        self.state.note(format!("CHANDRA clones on {}", join_squares(&mirages)));
        self.state.chandra = Some(placement.into_clone());
        info!(%real, count = mirages.len(), cost, "CHANDRA clones placed");
        self.events.push(GameEvent::ClonesPlaced {
            real,
            mirages,
            cost,
        });
        Some(ChandraOutcome::Placed)
    }

    /// Bring back the captured piece recorded on `square`.
    pub fn guru_select(&mut self, square: Square) -> bool {
        let Interaction::GuruResolve(resolver) = &self.interaction else {
            return false;
        };
        let Some(record) = resolver.candidate_at(square) else {
            return false;
        };
        let state = &mut self.state;
        if state.position.is_occupied(square) {
            return false;
        }
        let piece = Piece::new(record.color, record.kind);
        state.position.put(square, piece);
        state.ledger.mark_resurrected(square, record);
        state.captures.take(&record);
        state.note(format!("GURU resurrected {} on {square}", piece.to_fen_char()));
        self.interaction = Interaction::Idle;
        self.events.push(GameEvent::PieceResurrected { piece, square });
        info!(%square, "piece resurrected");
        true
    }

    pub fn shani_select(&mut self, square: Square) -> bool {
        let Interaction::ShaniResolve(resolver) = &self.interaction else {
            return false;
        };
        let owner = resolver.owner;
        let still_enemy = self
            .state
            .position
            .piece_at(square)
            .is_some_and(|piece| piece.color != owner);
        if !resolver.is_target(square) || !still_enemy {
            return false;
        }
        self.state.ledger.freeze(square);
        self.state.note(format!("SHANI froze {square}"));
        self.interaction = Interaction::Idle;
        self.events.push(GameEvent::PieceFrozen { square });
        info!(%square, "piece frozen");
        true
    }

    // ---------------------------------------------------------------------
    // Clicks
    // ---------------------------------------------------------------------

    /// Route a board click according to the current interaction.
    pub fn click(&mut self, square: Square) -> ClickOutcome {
        if !self.is_running() || !self.is_human_turn() {
            return ClickOutcome::Ignored;
        }
        match self.interaction.clone() {
            Interaction::CardSelected(power) => match self.place_tile(square) {
                Ok(()) => ClickOutcome::TilePlaced(power),
                Err(err) => ClickOutcome::Rejected(err),
            },
            Interaction::GuruResolve(_) => {
                if self.guru_select(square) {
                    ClickOutcome::Resurrected(square)
                } else {
                    ClickOutcome::Ignored
                }
            }
            Interaction::ShaniResolve(_) => {
                if self.shani_select(square) {
                    ClickOutcome::Frozen(square)
                } else {
                    ClickOutcome::Ignored
                }
            }
            Interaction::ChandraPlacement(_) => {
                if self.chandra_toggle(square) {
                    ClickOutcome::MirageToggled(square)
                } else {
                    ClickOutcome::Ignored
                }
            }
            Interaction::ActivationMode => match self.activate(square) {
                Ok(Some(power)) => ClickOutcome::Activated(power),
                Ok(None) => ClickOutcome::Ignored,
                Err(err) => ClickOutcome::Rejected(err),
            },
            Interaction::Idle => {
                if self.select_source(square) {
                    ClickOutcome::Selected(square)
                } else {
                    ClickOutcome::Ignored
                }
            }
            Interaction::SourceSelected(from) => {
                let own = self
                    .state
                    .position
                    .piece_at(square)
                    .is_some_and(|piece| piece.color == self.side_to_move());
                if own {
                    return if self.select_source(square) {
                        ClickOutcome::Selected(square)
                    } else {
                        ClickOutcome::Ignored
                    };
                }
                match self.attempt_move(Move::new(from, square)) {
                    Ok(report) => ClickOutcome::Moved(Box::new(report)),
                    Err(err) => ClickOutcome::Rejected(err),
                }
            }
        }
    }

    // ---------------------------------------------------------------------
    // Time
    // ---------------------------------------------------------------------

    /// Run the game clock forward. Whole seconds are charged to the side to
    /// move; respawns that fall due are attempted afterwards.
    pub fn advance_time(&mut self, elapsed: Duration) {
        if !self.is_running() {
            return;
        }
        let ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        self.state.elapsed_ms = self.state.elapsed_ms.saturating_add(ms);
        self.state.tick_carry_ms = self.state.tick_carry_ms.saturating_add(ms);

        while self.state.tick_carry_ms >= 1000 {
            self.state.tick_carry_ms -= 1000;
            let color = self.side_to_move();
            let update = self.state.clock.tick(color);
            if update.entered_final_stretch {
                info!(%color, "final stretch");
                self.events.push(GameEvent::FinalStretch { color });
            }
            if update.expired {
                self.finish(color.opposite(), GameOverReason::Timeout);
                return;
            }
        }
        self.fire_due_respawns();
    }

    fn fire_due_respawns(&mut self) {
        let due = self
            .state
            .respawns
            .take_due(self.state.elapsed_ms, self.session_id);
        let state = &mut self.state;
        for task in due {
            let Some(horde) = state.horde.as_mut() else {
                continue;
            };
            let target = if state.position.side_to_move() == HUMAN_COLOR {
                horde.respawn_target(task.id, task.kind, &state.position)
            } else {
                None
            };
            match target {
                Some(square) => {
                    state.position.put(square, Piece::new(horde.color(), task.kind));
                    horde.bind(square, task.id);
                    debug!(id = %task.id, %square, "horde piece respawned");
                    self.events.push(GameEvent::PieceRespawned {
                        id: task.id,
                        kind: task.kind,
                        square,
                    });
                }
                None => {
                    debug!(id = %task.id, "horde respawn failed");
                    self.events.push(GameEvent::RespawnFailed {
                        id: task.id,
                        kind: task.kind,
                    });
                }
            }
        }
    }

    // ---------------------------------------------------------------------
    // Presentation
    // ---------------------------------------------------------------------

    pub fn decorations(&self, square: Square) -> SquareDecorations {
        let state = &self.state;
        let mut deco = SquareDecorations::empty();
        deco.set(SquareDecorations::ZONE, state.zones.covers(square));
        deco.set(
            SquareDecorations::TILE_ANCHOR,
            state.zones.tiles().iter().any(|tile| tile.anchor == square),
        );
        deco.set(
            SquareDecorations::POWERED,
            state.ledger.powered_at(square).is_some(),
        );
        deco.set(SquareDecorations::FROZEN, state.ledger.is_frozen(square));
        deco.set(
            SquareDecorations::RESURRECTED,
            state.ledger.is_resurrected(square),
        );
        deco.set(SquareDecorations::MIRAGE, state.is_mirage(square));

        match &self.interaction {
            Interaction::SourceSelected(selected) => {
                deco.set(SquareDecorations::SELECTED, *selected == square);
            }
            Interaction::ActivationMode => deco.set(
                SquareDecorations::ACTIVATION_TARGET,
                self.eligible_activations()
                    .iter()
                    .any(|candidate| candidate.square == square),
            ),
            Interaction::GuruResolve(resolver) => deco.set(
                SquareDecorations::RESURRECTION_SLOT,
                resolver.candidate_at(square).is_some(),
            ),
            Interaction::ShaniResolve(resolver) => {
                deco.set(SquareDecorations::FREEZE_TARGET, resolver.is_target(square));
            }
            Interaction::ChandraPlacement(placement) => {
                deco.set(
                    SquareDecorations::MIRAGE_SLOT,
                    placement.mirages().contains(&square),
                );
                deco.set(SquareDecorations::SELECTED, placement.real() == square);
            }
            Interaction::Idle | Interaction::CardSelected(_) => {}
        }
        deco
    }
}

fn join_squares(squares: &[Square]) -> String {
    squares
        .iter()
        .map(Square::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// The rook that castles alongside `mv`, if `mv` is a castling king move.
fn castling_rook(piece: Piece, mv: Move) -> Option<Square> {
    if piece.kind != PieceKind::King || mv.from.file().abs_diff(mv.to.file()) != 2 {
        return None;
    }
    let file = if mv.to.file() > mv.from.file() { 7 } else { 0 };
    Square::from_coords(file, mv.from.rank() as i8)
}

/// Overlay rules that refuse a move before any board rules are consulted.
fn precheck(state: &GameState, mv: Move) -> Result<Piece, MoveRejection> {
    let position = &state.position;
    let ledger = &state.ledger;
    let piece = position
        .piece_at(mv.from)
        .ok_or(MoveRejection::NoPiece(mv.from))?;
    if piece.color != position.side_to_move() {
        return Err(MoveRejection::WrongColor {
            square: mv.from,
            owner: piece.color,
        });
    }
    if state.is_mirage(mv.from) {
        return Err(MoveRejection::MirageSource(mv.from));
    }
    if ledger.is_frozen(mv.from) {
        return Err(MoveRejection::Frozen(mv.from));
    }
    if ledger.is_resurrected(mv.from) {
        return Err(MoveRejection::ResurrectedSource(mv.from));
    }
    if let Some(rook) = castling_rook(piece, mv) {
        if ledger.is_frozen(rook) {
            return Err(MoveRejection::Frozen(rook));
        }
        if ledger.is_resurrected(rook) {
            return Err(MoveRejection::ResurrectedSource(rook));
        }
    }
    if ledger.is_resurrected(mv.to) {
        return Err(MoveRejection::ResurrectedTarget(mv.to));
    }
    if let Some(target) = position.capture_square(mv) {
        if ledger.is_resurrected(target) {
            return Err(MoveRejection::ResurrectedTarget(target));
        }
        let shielded = ledger
            .active_power(target)
            .is_some_and(|entry| behavior(entry.power).shields_holder);
        if shielded && !state.is_mirage(target) {
            return Err(MoveRejection::Shielded(target));
        }
    }
    Ok(piece)
}

/// Run one move through the full pipeline against `state`. On error `state`
/// may be partially modified and must be discarded.
fn play_move(
    state: &mut GameState,
    mv: Move,
    ctx: &PipelineContext,
    events: &mut Vec<GameEvent>,
) -> Result<MoveReport, MoveRejection> {
    let piece = precheck(state, mv)?;
    let mover = piece.color;
    let number = state.position.fullmove_number();
    let attacker_power = state.ledger.active_power(mv.from);
    let target = state.position.capture_square(mv).unwrap_or(mv.to);

    // CHANDRA routing: a mirage target is a reveal, touching the real piece
    // lifts the mirages first.
    let (revealed_mirage, lift_mirages) = match state.chandra.as_ref() {
        Some(clone) if clone.is_mirage(target) => (true, false),
        Some(clone) => (false, clone.is_real(mv.from) || clone.is_real(target)),
        None => (false, false),
    };
    if lift_mirages {
        if let Some(clone) = state.chandra.take() {
            clone.clear_mirages(&mut state.position);
            debug!(real = %clone.real(), "CHANDRA mirages lifted");
        }
    }

    let applied = if revealed_mirage {
        let applied = state
            .position
            .apply_legal_move(mv)
            .map_err(|_| MoveRejection::Illegal)?;
        if let Some(clone) = state.chandra.take() {
            clone.clear_mirages(&mut state.position);
        }
        events.push(GameEvent::MirageRevealed { square: target });
        applied
    } else {
        let mut overridden = None;
        if let Some(kind) = attacker_power.and_then(|entry| behavior(entry.power).move_override) {
            match try_override(&mut state.position, kind, mv) {
                OverrideResult::Applied(applied) => overridden = Some(applied),
                OverrideResult::ExposesKing => return Err(MoveRejection::ExposesKing),
                OverrideResult::NotApplicable => {}
            }
        }
        match overridden {
            Some(applied) => applied,
            None => state
                .position
                .apply_legal_move(mv)
                .map_err(|_| MoveRejection::Illegal)?,
        }
    };

    let captured = if revealed_mirage { None } else { applied.captured };

    let mut extra_move = false;
    if let Some(entry) = attacker_power.filter(|entry| behavior(entry.power).extra_move) {
        if captured.is_some() {
            state.ledger.remove_power(mv.from);
        } else if entry.uses_left == 1 && !state.position.in_check(mover.opposite()) {
            state.position.set_side_to_move(mover);
            extra_move = true;
        }
    }

    let mut capture = None;
    if let Some((square, victim)) = captured {
        let capture_ctx = CaptureContext {
            capturer: mover,
            victim,
            square,
            attacker_power,
        };
        let report = resolve_capture(
            &capture_ctx,
            &mut state.clock,
            &mut state.ledger,
            &mut state.captures,
            &mut state.tiers,
        );
        events.push(GameEvent::Captured {
            piece: victim,
            square,
            adjustment: report.adjustment,
        });
        if report.capturer_clock.entered_final_stretch {
            events.push(GameEvent::FinalStretch { color: mover });
        }
        if report.tiers_changed {
            events.push(GameEvent::TiersUnlocked {
                highest: state.tiers.highest(),
            });
        }
        if ctx.mode == GameMode::Horde && victim.color == HORDE_COLOR {
            if let Some(horde) = state.horde.as_mut() {
                match horde.on_capture(square) {
                    CaptureFate::Respawn { id, lives_left } => {
                        let due_ms = state.elapsed_ms.saturating_add(ctx.respawn_delay_ms);
                        state.respawns.schedule(RespawnTask {
                            id,
                            kind: victim.kind,
                            due_ms,
                            session_id: ctx.session_id,
                        });
                        debug!(%id, lives_left, due_ms, "horde respawn scheduled");
                        events.push(GameEvent::RespawnScheduled {
                            id,
                            kind: victim.kind,
                            due_ms,
                        });
                    }
                    CaptureFate::Fallen { id } => {
                        info!(%id, "horde piece fallen");
                        events.push(GameEvent::HordePieceFallen { id });
                    }
                    CaptureFate::Untracked => {}
                }
            }
        }
        capture = Some(report);
    }

    state.ledger.spend_and_follow(mv.from, mv.to);
    if let Some((rook_from, rook_to)) = applied.rook_shift {
        state.ledger.shift(rook_from, rook_to);
    }
    if let Some(horde) = state.horde.as_mut() {
        horde.follow_move(mv.from, mv.to);
        if let Some((rook_from, rook_to)) = applied.rook_shift {
            horde.follow_move(rook_from, rook_to);
        }
        if let Some(kind) = applied.promoted_to {
            horde.promote(mv.to, kind);
        }
    }
    state.zones.clear_stale_bindings(&state.position);

    state.plies += 1;
    let expired_tiles = state.zones.tick();
    state.ledger.tick();
    let dissolved = state.chandra.as_mut().is_some_and(|clone| clone.tick());
    if dissolved {
        if let Some(clone) = state.chandra.take() {
            clone.clear_mirages(&mut state.position);
        }
        events.push(GameEvent::MiragesDissolved);
    }

    let check = state.position.in_check(mover.opposite());
    state.history.push(HistoryEntry::Move {
        number,
        color: mover,
        mv: applied.mv,
        check,
    });
    events.push(GameEvent::MoveCommitted {
        mv: applied.mv,
        color: mover,
        extra_move,
    });
    debug!(mv = %applied.mv, %mover, plies = state.plies, expired_tiles, extra_move, "move committed");

    Ok(MoveReport {
        applied,
        revealed_mirage,
        extra_move,
        capture,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::capture::{CaptureRecord, TimeAdjustment};

    fn sq(name: &str) -> Square {
        name.parse().expect("test square should parse")
    }

    fn mv(text: &str) -> Move {
        text.parse().expect("test move should parse")
    }

    fn config(start_seconds: u32) -> GameConfig {
        GameConfig {
            start_seconds,
            respawn_delay: Duration::from_millis(10),
            bot_think_time: Duration::ZERO,
            ..GameConfig::default()
        }
    }

    fn game_from(mode: GameMode, fen: &str, start_seconds: u32) -> Game {
        let mut game = Game::new(config(start_seconds));
        game.start_from_fen(mode, fen)
            .expect("test FEN should parse");
        game.drain_events();
        game
    }

    fn place_and_activate(game: &mut Game, power: PowerId, anchor: &str, piece: &str) {
        game.state.tiers.unlock_through(card(power).tier);
        game.select_card(power).expect("card should be selectable");
        game.place_tile(sq(anchor)).expect("tile should be placed");
        game.enter_activation_mode()
            .expect("activation mode should open");
        let activated = game.activate(sq(piece)).expect("activation should succeed");
        assert_eq!(activated, Some(power));
    }

    #[test]
    fn scenario_a_pawn_capture_awards_time_and_unlocks_tier_one() {
        let mut game = Game::new(config(70));
        game.start(GameMode::Standard);
        game.attempt_move(mv("e2e4")).expect("e2e4");
        game.attempt_move(mv("d7d5")).expect("d7d5");
        let report = game.attempt_move(mv("e4d5")).expect("exd5");

        let capture = report.capture.expect("capture report");
        assert_eq!(
            capture.adjustment,
            TimeAdjustment::Award {
                capturer: Color::Light,
                seconds: 2
            }
        );
        assert_eq!(game.clock_remaining(Color::Light), 72);
        assert!(game.state().tiers.is_unlocked(1));
        assert_eq!(game.captured_by(Color::Light), &[PieceKind::Pawn]);
    }

    #[test]
    fn scenario_b_tile_costs_time_and_lasts_three_turns() {
        let mut game = Game::new(config(70));
        game.start(GameMode::Standard);
        game.state.tiers.unlock_through(1);
        assert_eq!(card(PowerId::Surya).radius, 2);
        assert_eq!(game.card_cost(PowerId::Surya), 8);

        game.select_card(PowerId::Surya).expect("select SURYA");
        game.place_tile(sq("d4")).expect("place SURYA");

        assert_eq!(game.clock_remaining(Color::Light), 62);
        let tiles = game.state().zones.tiles();
        assert_eq!(tiles.len(), 1);
        assert_eq!(tiles[0].anchor, sq("d4"));
        assert_eq!(tiles[0].turns_remaining(), 3.0);
        assert!(game.state().is_card_used(PowerId::Surya));
        assert!(game.select_card(PowerId::Surya).is_err());
    }

    #[test]
    fn scenario_c_rahu_passes_through_a_blocker() {
        let mut game = game_from(GameMode::Standard, "4k3/8/n7/P7/R7/8/8/4K3 w - - 0 1", 90);
        place_and_activate(&mut game, PowerId::Rahu, "a4", "a4");

        let report = game.attempt_move(mv("a4a6")).expect("RAHU capture");
        assert!(report.capture.is_some());
        let position = game.position();
        assert_eq!(
            position.piece_at(sq("a5")),
            Some(Piece::new(Color::Light, PieceKind::Pawn))
        );
        assert_eq!(
            position.piece_at(sq("a6")),
            Some(Piece::new(Color::Light, PieceKind::Rook))
        );
        let entry = game
            .state()
            .ledger
            .powered_at(sq("a6"))
            .expect("RAHU follows the rook");
        assert_eq!(entry.uses_left, 1);
        assert_eq!(position.side_to_move(), Color::Dark);
    }

    #[test]
    fn scenario_d_final_stretch_fires_once_and_halves_costs() {
        let mut game = Game::new(config(31));
        game.start(GameMode::Standard);
        game.drain_events();

        game.advance_time(Duration::from_millis(1000));
        assert_eq!(game.clock_remaining(Color::Light), 30);
        let events = game.drain_events();
        assert_eq!(
            events,
            vec![GameEvent::FinalStretch {
                color: Color::Light
            }]
        );
        assert_eq!(game.card_cost(PowerId::Surya), 4);

        game.advance_time(Duration::from_millis(1000));
        assert!(game.drain_events().is_empty());
    }

    #[test]
    fn scenario_e_guru_without_candidates_does_not_open() {
        let mut game = Game::new(config(90));
        game.start(GameMode::Standard);
        game.state.tiers.unlock_through(2);
        game.select_card(PowerId::Guru).expect("select GURU");
        game.place_tile(sq("e4")).expect("place GURU");
        game.enter_activation_mode().expect("activation mode");

        let err = game.activate(sq("e2")).expect_err("no candidates");
        assert_eq!(err, GameError::NoEligibleTargets(PowerId::Guru));
        assert_eq!(game.interaction(), &Interaction::Idle);
        assert!(!game.state().zones.tiles()[0].is_activated(Color::Light));
        assert!(game
            .drain_events()
            .contains(&GameEvent::NoEligibleTargets {
                power: PowerId::Guru
            }));
    }

    #[test]
    fn ketu_capture_swings_twelve_seconds() {
        let mut game = game_from(GameMode::Standard, "4k3/8/8/4p3/3N4/8/8/4K3 w - - 0 1", 90);
        place_and_activate(&mut game, PowerId::Ketu, "d4", "d4");
        assert_eq!(game.clock_remaining(Color::Light), 82);

        game.attempt_move(mv("e1f1")).expect("quiet king move");
        let report = game.attempt_move(mv("e5d4")).expect("capture KETU holder");
        assert_eq!(
            report.capture.expect("capture").adjustment,
            TimeAdjustment::Swing {
                capturer: Color::Dark,
                owner: Color::Light,
                seconds: 12
            }
        );
        assert_eq!(game.clock_remaining(Color::Light), 94);
        assert_eq!(game.clock_remaining(Color::Dark), 78);
        assert!(game.state().ledger.powered_at(sq("d4")).is_none());
    }

    #[test]
    fn surya_shields_its_holder() {
        let mut game = game_from(GameMode::Standard, "4k3/8/8/4p3/3N4/8/8/4K3 w - - 0 1", 90);
        place_and_activate(&mut game, PowerId::Surya, "d4", "d4");
        game.attempt_move(mv("e1f1")).expect("quiet king move");

        let before = game.state().clone();
        let err = game.attempt_move(mv("e5d4")).expect_err("shielded");
        assert_eq!(err, GameError::RejectedMove(MoveRejection::Shielded(sq("d4"))));
        assert_eq!(game.state(), &before);
    }

    #[test]
    fn budha_grants_an_extra_move() {
        let mut game = game_from(GameMode::Standard, "4k3/8/8/8/8/8/8/3NK3 w - - 0 1", 90);
        place_and_activate(&mut game, PowerId::Budha, "d1", "d1");

        let report = game.attempt_move(mv("d1c3")).expect("knight move");
        assert!(report.extra_move);
        assert_eq!(game.side_to_move(), Color::Light);
        assert!(game.state().ledger.powered_at(sq("c3")).is_none());

        game.attempt_move(mv("c3d5")).expect("second move");
        assert_eq!(game.side_to_move(), Color::Dark);
    }

    #[test]
    fn frozen_piece_cannot_move() {
        let mut game = game_from(GameMode::Standard, "4k3/8/8/4p3/3N4/8/8/4K3 w - - 0 1", 90);
        place_and_activate(&mut game, PowerId::Shani, "d4", "d4");
        assert!(!game.shani_select(sq("d4")));
        assert!(game.shani_select(sq("e5")));
        assert!(game.state().ledger.is_frozen(sq("e5")));

        game.attempt_move(mv("e1d1")).expect("quiet king move");
        let err = game.attempt_move(mv("e5e4")).expect_err("frozen");
        assert_eq!(err, GameError::RejectedMove(MoveRejection::Frozen(sq("e5"))));
        assert!(game
            .bot_allowed_moves()
            .iter()
            .all(|candidate| candidate.from != sq("e5")));
    }

    #[test]
    fn resurrected_piece_is_untouchable() {
        let mut game = game_from(GameMode::Standard, "4k3/b7/8/8/8/8/3P4/4K3 w - - 0 1", 90);
        game.state.captures.push(
            Color::Dark,
            CaptureRecord {
                kind: PieceKind::Knight,
                color: Color::Light,
                square: sq("d4"),
            },
        );
        place_and_activate(&mut game, PowerId::Guru, "d3", "d2");
        assert!(!game.guru_select(sq("e4")));
        assert!(game.guru_select(sq("d4")));
        assert_eq!(
            game.position().piece_at(sq("d4")),
            Some(Piece::new(Color::Light, PieceKind::Knight))
        );
        assert!(game.state().captures.records().is_empty());

        let err = game.attempt_move(mv("d4f5")).expect_err("cannot move yet");
        assert_eq!(
            err,
            GameError::RejectedMove(MoveRejection::ResurrectedSource(sq("d4")))
        );
        game.attempt_move(mv("d2d3")).expect("pawn push");
        let err = game.attempt_move(mv("a7d4")).expect_err("cannot be taken yet");
        assert_eq!(
            err,
            GameError::RejectedMove(MoveRejection::ResurrectedTarget(sq("d4")))
        );
    }

    #[test]
    fn capturing_a_mirage_reveals_without_side_effects() {
        let mut game = game_from(GameMode::Standard, "1k2r3/8/8/8/8/R7/8/7K w - - 0 1", 90);
        place_and_activate(&mut game, PowerId::Chandra, "a3", "a3");
        assert!(game.chandra_toggle(sq("e3")));
        assert_eq!(game.chandra_confirm(), Some(ChandraOutcome::Placed));
        assert_eq!(game.clock_remaining(Color::Light), 80);
        assert!(game.decorations(sq("e3")).contains(SquareDecorations::MIRAGE));

        game.attempt_move(mv("h1g1")).expect("quiet king move");
        let report = game.attempt_move(mv("e8e3")).expect("take the mirage");
        assert!(report.revealed_mirage);
        assert!(report.capture.is_none());
        assert!(game.state().chandra.is_none());
        assert!(game.state().captures.records().is_empty());
        assert_eq!(game.clock_remaining(Color::Dark), 90);
        assert_eq!(
            game.position().piece_at(sq("a3")),
            Some(Piece::new(Color::Light, PieceKind::Rook))
        );
    }

    #[test]
    fn chandra_checking_clone_is_revealed() {
        let mut game = game_from(GameMode::Standard, "4k3/8/8/8/8/R7/8/7K w - - 0 1", 90);
        place_and_activate(&mut game, PowerId::Chandra, "a3", "a3");
        assert_eq!(game.chandra_confirm(), None);
        assert!(game.chandra_toggle(sq("e3")));
        assert_eq!(game.chandra_confirm(), Some(ChandraOutcome::Revealed));
        assert!(game.state().chandra.is_none());
        assert!(game.position().piece_at(sq("e3")).is_none());
        assert_eq!(game.clock_remaining(Color::Light), 80);
    }

    #[test]
    fn checkmate_ends_the_game_with_bonus() {
        let mut game = Game::new(config(100));
        game.start(GameMode::Standard);
        for text in ["f2f3", "e7e5", "g2g4", "d8h4"] {
            game.attempt_move(mv(text)).expect("fool's mate move");
        }
        let result = game.result().expect("game should be over");
        assert_eq!(result.winner, Color::Dark);
        assert_eq!(result.reason, GameOverReason::Checkmate);
        assert_eq!(result.scores, [0, 10]);
        assert!(game.attempt_move(mv("e2e4")).is_err());
    }

    #[test]
    fn timeout_hands_the_win_to_the_opponent() {
        let mut game = Game::new(config(2));
        game.start(GameMode::Standard);
        game.advance_time(Duration::from_secs(2));
        let result = game.result().expect("game should be over");
        assert_eq!(result.winner, Color::Dark);
        assert_eq!(result.reason, GameOverReason::Timeout);
        assert_eq!(result.scores, [0, 5]);
    }

    #[test]
    fn rejected_move_changes_nothing() {
        let mut game = Game::new(config(100));
        game.start(GameMode::Standard);
        let before = game.state().clone();
        assert!(game.attempt_move(mv("e2e5")).is_err());
        assert_eq!(game.state(), &before);
    }

    #[test]
    fn clicks_select_then_move() {
        let mut game = Game::new(config(100));
        game.start(GameMode::Standard);
        assert_eq!(game.click(sq("e7")), ClickOutcome::Ignored);
        assert_eq!(game.click(sq("e2")), ClickOutcome::Selected(sq("e2")));
        assert_eq!(game.click(sq("d2")), ClickOutcome::Selected(sq("d2")));
        assert!(matches!(game.click(sq("d4")), ClickOutcome::Moved(_)));
        assert_eq!(game.interaction(), &Interaction::Idle);
        assert_eq!(game.side_to_move(), Color::Dark);
    }

    #[test]
    fn horde_capture_schedules_a_respawn_that_fires_on_the_human_turn() {
        let mut game = Game::new(config(100));
        game.start(GameMode::Horde);
        game.attempt_move(mv("e2e4")).expect("e2e4");
        assert_eq!(
            game.attempt_move(mv("d7d5")),
            Err(GameError::RejectedMove(MoveRejection::BotTurn))
        );
        game.apply_bot_move(mv("d7d5")).expect("bot d7d5");
        let id = game
            .state()
            .horde
            .as_ref()
            .and_then(|horde| horde.id_at(sq("d5")))
            .expect("tracked pawn");

        game.attempt_move(mv("e4d5")).expect("exd5");
        assert_eq!(game.state().respawns.len(), 1);
        game.apply_bot_move(mv("g8f6")).expect("bot develops");
        game.advance_time(Duration::from_millis(20));

        let events = game.drain_events();
        assert!(events.contains(&GameEvent::PieceRespawned {
            id,
            kind: PieceKind::Pawn,
            square: sq("d7")
        }));
        let horde = game.state().horde.as_ref().expect("horde tracker");
        assert_eq!(horde.id_at(sq("d7")), Some(id));
        assert_eq!(horde.identity(id).map(|identity| identity.lives()), Some(2));
    }

    #[test]
    fn respawn_fails_on_the_horde_turn() {
        let mut game = Game::new(config(100));
        game.start(GameMode::Horde);
        game.attempt_move(mv("e2e4")).expect("e2e4");
        game.apply_bot_move(mv("d7d5")).expect("bot d7d5");
        game.attempt_move(mv("e4d5")).expect("exd5");
        game.advance_time(Duration::from_millis(20));
        assert!(game
            .drain_events()
            .iter()
            .any(|event| matches!(event, GameEvent::RespawnFailed { .. })));
        assert!(game.state().respawns.is_empty());
    }

    #[test]
    fn reset_discards_pending_respawns() {
        let mut game = Game::new(config(100));
        game.start(GameMode::Horde);
        game.attempt_move(mv("e2e4")).expect("e2e4");
        game.apply_bot_move(mv("d7d5")).expect("bot d7d5");
        game.attempt_move(mv("e4d5")).expect("exd5");
        let stale = game.state().respawns.pending()[0];

        game.reset();
        game.start(GameMode::Horde);
        game.state.respawns.schedule(stale);
        game.advance_time(Duration::from_millis(20));
        assert!(!game.drain_events().iter().any(|event| matches!(
            event,
            GameEvent::PieceRespawned { .. } | GameEvent::RespawnFailed { .. }
        )));
        assert!(game.state().respawns.is_empty());
    }

    #[test]
    fn horde_cannot_select_cards_on_its_turn() {
        let mut game = Game::new(config(100));
        game.start(GameMode::Horde);
        game.state.tiers.unlock_through(3);
        assert_eq!(game.card_cost(PowerId::Shani), 7);
        game.attempt_move(mv("e2e4")).expect("e2e4");
        assert_eq!(
            game.select_card(PowerId::Rahu),
            Err(GameError::CardUnavailable(PowerId::Rahu))
        );
    }

    #[test]
    fn promoted_horde_queen_does_not_respawn() {
        let mut game = game_from(GameMode::Horde, "4k3/8/8/8/8/8/1p2K3/7R w - - 0 1", 100);
        let pawn = game
            .state()
            .horde
            .as_ref()
            .and_then(|horde| horde.id_at(sq("b2")))
            .expect("tracked pawn");

        game.attempt_move(mv("e2e3")).expect("king step");
        game.apply_bot_move(mv("b2b1q")).expect("bot promotes");
        let horde = game.state().horde.as_ref().expect("horde tracker");
        let identity = horde.identity(pawn).expect("identity");
        assert_eq!((identity.kind(), identity.lives()), (PieceKind::Queen, 0));

        game.attempt_move(mv("h1b1")).expect("take the queen");
        assert!(game.state().respawns.is_empty());
        game.apply_bot_move(mv("e8d8")).expect("bot king move");
        game.advance_time(Duration::from_millis(20));

        let events = game.drain_events();
        assert!(events.contains(&GameEvent::HordePieceFallen { id: pawn }));
        assert!(!events.iter().any(|event| matches!(
            event,
            GameEvent::RespawnScheduled { .. } | GameEvent::PieceRespawned { .. }
        )));
        assert!(game.position().piece_at(sq("b2")).is_none());
    }

    #[test]
    fn capturing_the_real_chandra_piece_lifts_mirages_and_scores() {
        let mut game = game_from(GameMode::Standard, "1k6/8/8/8/8/R7/1b6/7K w - - 0 1", 90);
        place_and_activate(&mut game, PowerId::Chandra, "a3", "a3");
        assert!(game.chandra_toggle(sq("e3")));
        assert_eq!(game.chandra_confirm(), Some(ChandraOutcome::Placed));

        game.attempt_move(mv("h1g1")).expect("quiet king move");
        let report = game.attempt_move(mv("b2a3")).expect("take the real rook");
        assert!(!report.revealed_mirage);
        assert_eq!(
            report.capture.expect("capture report").adjustment,
            TimeAdjustment::Award {
                capturer: Color::Dark,
                seconds: 6
            }
        );
        assert!(game.state().chandra.is_none());
        assert!(game.position().piece_at(sq("e3")).is_none());
        assert_eq!(game.clock_remaining(Color::Dark), 96);
        assert_eq!(game.captured_by(Color::Dark), &[PieceKind::Rook]);
        assert_eq!(game.state().captures.records().len(), 1);
        assert!(game.state().tiers.is_unlocked(3));
    }

    #[test]
    fn chandra_mirages_dissolve_when_the_budget_runs_out() {
        let mut game = game_from(GameMode::Standard, "1k6/8/8/8/8/R7/8/7K w - - 0 1", 90);
        place_and_activate(&mut game, PowerId::Chandra, "a3", "a3");
        assert!(game.chandra_toggle(sq("e3")));
        assert_eq!(game.chandra_confirm(), Some(ChandraOutcome::Placed));
        game.drain_events();

        let quiet = ["h1g1", "b8c8", "g1h1", "c8b8", "h1g1", "b8c8", "g1h1"];
        for text in quiet {
            game.attempt_move(mv(text)).expect("quiet king move");
        }
        assert!(game.state().is_mirage(sq("e3")));
        assert!(game.position().piece_at(sq("e3")).is_some());

        game.attempt_move(mv("c8b8")).expect("eighth ply");
        assert!(game.state().chandra.is_none());
        assert!(game.position().piece_at(sq("e3")).is_none());
        assert_eq!(
            game.position().piece_at(sq("a3")),
            Some(Piece::new(Color::Light, PieceKind::Rook))
        );
        assert!(game.drain_events().contains(&GameEvent::MiragesDissolved));
    }

    #[test]
    fn budha_capture_cancels_the_extra_move() {
        let mut game = game_from(GameMode::Standard, "4k3/8/8/8/8/2p5/8/3NK3 w - - 0 1", 90);
        place_and_activate(&mut game, PowerId::Budha, "d1", "d1");

        let report = game.attempt_move(mv("d1c3")).expect("knight capture");
        assert!(report.capture.is_some());
        assert!(!report.extra_move);
        assert_eq!(game.side_to_move(), Color::Dark);
        assert!(game.state().ledger.powered_at(sq("d1")).is_none());
        assert!(game.state().ledger.powered_at(sq("c3")).is_none());
    }

    #[test]
    fn budha_move_giving_check_keeps_no_extra_move() {
        let mut game = game_from(GameMode::Standard, "4k3/8/8/8/4N3/8/8/4K3 w - - 0 1", 90);
        place_and_activate(&mut game, PowerId::Budha, "e4", "e4");

        let report = game.attempt_move(mv("e4f6")).expect("knight check");
        assert!(!report.extra_move);
        assert_eq!(game.side_to_move(), Color::Dark);
        assert!(game.position().in_check(Color::Dark));
        assert!(game.state().ledger.powered_at(sq("f6")).is_none());
    }

    #[test]
    fn mangala_captures_an_adjacent_piece_through_the_pipeline() {
        let mut game = game_from(GameMode::Standard, "4k3/8/8/3n4/3P4/8/8/4K3 w - - 0 1", 90);
        place_and_activate(&mut game, PowerId::Mangala, "d4", "d4");
        assert!(!game.position().legal_moves().contains(&mv("d4d5")));

        let report = game.attempt_move(mv("d4d5")).expect("adjacent capture");
        let capture = report.capture.expect("capture report");
        assert_eq!(
            capture.adjustment,
            TimeAdjustment::Award {
                capturer: Color::Light,
                seconds: 4
            }
        );
        assert_eq!(
            game.position().piece_at(sq("d5")),
            Some(Piece::new(Color::Light, PieceKind::Pawn))
        );
        assert_eq!(game.side_to_move(), Color::Dark);
        let entry = game
            .state()
            .ledger
            .powered_at(sq("d5"))
            .expect("MANGALA follows the pawn");
        assert_eq!(entry.uses_left, 2);
        assert_eq!(game.captured_by(Color::Light), &[PieceKind::Knight]);
    }
}
