//! Line-oriented front-end over a [`Session`].
//!
//! Every command first charges the wall-clock time since the previous one to
//! the side to move, then runs, then lets the horde answer and prints any
//! events the game raised.

use std::io::{self, BufRead, Write};
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::board::render::render_position_with_markers;
use crate::board::types::{Color, Move, Square};
use crate::game::config::{GameConfig, GameMode};
use crate::game::interaction::{ChandraOutcome, ClickOutcome};
use crate::game::orchestrator::{GamePhase, MoveReport};
use crate::rules::catalog::PowerId;
use crate::session::Session;
use crate::utils::game_record::write_game_record;

const HELP: &str = "commands: start standard|horde, reset, click <sq>, move <lan>, \
card <id>, activate, skip, relocate <sq>, confirm, cancel, board, status, record, quit";

/// Extra time granted to the oracle on top of its configured think time.
const BOT_GRACE: Duration = Duration::from_secs(2);
const BOT_POLL: Duration = Duration::from_millis(10);

pub fn run_stdio_loop(config: GameConfig) -> io::Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut frontend = TextFrontend::new(Session::new(config));
    writeln!(stdout, "{HELP}")?;

    for line in stdin.lock().lines() {
        let line = line?;
        let should_quit = frontend.handle_command(&line, &mut stdout)?;
        stdout.flush()?;
        if should_quit {
            break;
        }
    }

    Ok(())
}

pub struct TextFrontend {
    session: Session,
    last_tick: Instant,
}

impl TextFrontend {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            last_tick: Instant::now(),
        }
    }

    #[inline]
    pub fn session(&self) -> &Session {
        &self.session
    }

    fn catch_up_clock(&mut self) {
        let now = Instant::now();
        self.session.advance(now.duration_since(self.last_tick));
        self.last_tick = now;
    }

    pub fn handle_command(&mut self, line: &str, out: &mut impl Write) -> io::Result<bool> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(false);
        }
        self.catch_up_clock();

        let mut parts = trimmed.split_whitespace();
        let cmd = parts.next().unwrap_or_default();
        let arg = parts.next();

        match cmd {
            "help" => writeln!(out, "{HELP}")?,
            "start" => {
                let name = arg.unwrap_or("standard");
                match name.parse::<GameMode>() {
                    Ok(mode) => self.session.start(mode),
                    Err(_) => writeln!(out, "error: unknown mode '{name}'")?,
                }
            }
            "reset" => {
                self.session.reset();
                writeln!(out, "game reset")?;
            }
            "click" => {
                if let Some(square) = parse_arg::<Square>(arg, "square", out)? {
                    let outcome = self.session.game_mut().click(square);
                    write_click(&outcome, out)?;
                }
            }
            "move" => {
                if let Some(mv) = parse_arg::<Move>(arg, "move", out)? {
                    match self.session.game_mut().attempt_move(mv) {
                        Ok(report) => write_report(&report, out)?,
                        Err(err) => writeln!(out, "error: {err}")?,
                    }
                }
            }
            "card" => {
                if let Some(power) = parse_arg::<PowerId>(arg, "card", out)? {
                    match self.session.game_mut().select_card(power) {
                        Ok(()) => writeln!(
                            out,
                            "{power} selected for {}s, click an anchor square",
                            self.session.game().card_cost(power)
                        )?,
                        Err(err) => writeln!(out, "error: {err}")?,
                    }
                }
            }
            "activate" => match self.session.game_mut().enter_activation_mode() {
                Ok(()) => {
                    let candidates = self.session.game().eligible_activations();
                    if candidates.is_empty() {
                        writeln!(out, "no piece can be activated")?;
                    }
                    for candidate in candidates {
                        writeln!(
                            out,
                            "  {} -> {} (tile at {})",
                            candidate.square, candidate.power, candidate.tile_anchor
                        )?;
                    }
                }
                Err(err) => writeln!(out, "error: {err}")?,
            },
            "skip" => {
                let game = self.session.game_mut();
                game.cancel_card();
                game.exit_activation_mode();
            }
            "relocate" => {
                if let Some(square) = parse_arg::<Square>(arg, "square", out)? {
                    if !self.session.game_mut().chandra_relocate(square) {
                        writeln!(out, "error: cannot relocate to {square}")?;
                    }
                }
            }
            "confirm" => match self.session.game_mut().chandra_confirm() {
                Some(ChandraOutcome::Placed) => writeln!(out, "mirages placed")?,
                Some(ChandraOutcome::Revealed) => writeln!(out, "clones revealed")?,
                None => writeln!(out, "error: no mirage chosen")?,
            },
            "cancel" => {
                if !self.session.game_mut().cancel_interaction() {
                    writeln!(out, "nothing to cancel")?;
                }
            }
            "board" => self.write_board(out)?,
            "status" => self.write_status(out)?,
            "record" => write!(out, "{}", write_game_record(self.session.game()))?,
            "quit" | "exit" => return Ok(true),
            _ => writeln!(out, "error: unknown command '{cmd}'")?,
        }

        self.run_horde(out)?;
        self.write_events(out)?;
        Ok(false)
    }

    /// Poll the oracle until the horde has moved, keeping its clock running
    /// while it thinks.
    fn run_horde(&mut self, out: &mut impl Write) -> io::Result<()> {
        if !self.session.game().is_bot_turn() {
            return Ok(());
        }
        let deadline = Instant::now() + self.session.game().config().bot_think_time + BOT_GRACE;
        loop {
            match self.session.pump() {
                Ok(Some(report)) => return write_report(&report, out),
                Ok(None) => {}
                Err(err) => {
                    writeln!(out, "error: {err}")?;
                    return Ok(());
                }
            }
            if !self.session.is_searching() || Instant::now() >= deadline {
                debug!(searching = self.session.is_searching(), "horde poll ended");
                return Ok(());
            }
            thread::sleep(BOT_POLL);
            self.catch_up_clock();
        }
    }

    fn write_events(&mut self, out: &mut impl Write) -> io::Result<()> {
        for event in self.session.game_mut().drain_events() {
            writeln!(out, "* {event}")?;
        }
        Ok(())
    }

    fn write_board(&self, out: &mut impl Write) -> io::Result<()> {
        let game = self.session.game();
        let board = render_position_with_markers(game.position(), |square| {
            game.decorations(square).marker()
        });
        write!(out, "{board}")?;
        writeln!(out, "{} to move", game.side_to_move())
    }

    fn write_status(&self, out: &mut impl Write) -> io::Result<()> {
        let game = self.session.game();
        let state = game.state();
        match game.mode() {
            Some(mode) => writeln!(out, "mode: {mode}")?,
            None => writeln!(out, "mode: none")?,
        }
        match game.phase() {
            GamePhase::NotStarted => writeln!(out, "phase: not started")?,
            GamePhase::Running => writeln!(out, "phase: running, {} to move", game.side_to_move())?,
            GamePhase::Over(result) => writeln!(
                out,
                "phase: over, {} won by {} ({} - {})",
                result.winner,
                result.reason,
                result.score(Color::Light),
                result.score(Color::Dark)
            )?,
        }
        for color in Color::ALL {
            let captured: String = game
                .captured_by(color)
                .iter()
                .map(|kind| kind.to_char())
                .collect();
            writeln!(
                out,
                "{color}: {}s, material {}, captured [{captured}]",
                game.clock_remaining(color),
                game.material(color)
            )?;
        }
        writeln!(out, "tiers unlocked: {}", state.tiers.highest())?;

        let cards: Vec<String> = PowerId::ALL
            .iter()
            .filter(|power| game.is_card_available(**power))
            .map(|power| format!("{power}({}s)", game.card_cost(*power)))
            .collect();
        writeln!(out, "cards: {}", cards.join(" "))?;

        for tile in state.zones.tiles() {
            writeln!(
                out,
                "tile {} at {}: {} turns left",
                tile.power,
                tile.anchor,
                tile.turns_remaining()
            )?;
        }
        for (square, powered) in state.ledger.powered() {
            writeln!(
                out,
                "powered {square}: {} ({} uses)",
                powered.power, powered.uses_left
            )?;
        }
        writeln!(out, "oracle: {}", self.session.oracle_name())?;
        writeln!(out, "interaction: {}", game.interaction().label())
    }
}

fn parse_arg<T: std::str::FromStr>(
    arg: Option<&str>,
    what: &str,
    out: &mut impl Write,
) -> io::Result<Option<T>> {
    let Some(text) = arg else {
        writeln!(out, "error: missing {what}")?;
        return Ok(None);
    };
    match text.parse::<T>() {
        Ok(value) => Ok(Some(value)),
        Err(_) => {
            writeln!(out, "error: invalid {what} '{text}'")?;
            Ok(None)
        }
    }
}

fn write_report(report: &MoveReport, out: &mut impl Write) -> io::Result<()> {
    let applied = &report.applied;
    write!(out, "{} {}", applied.piece.color, applied.mv)?;
    if report.revealed_mirage {
        write!(out, " (mirage revealed)")?;
    }
    if report.extra_move {
        write!(out, " (extra move)")?;
    }
    writeln!(out)
}

fn write_click(outcome: &ClickOutcome, out: &mut impl Write) -> io::Result<()> {
    match outcome {
        ClickOutcome::Ignored => writeln!(out, "ignored"),
        ClickOutcome::Selected(square) => writeln!(out, "selected {square}"),
        ClickOutcome::TilePlaced(power) => writeln!(out, "{power} tile placed"),
        ClickOutcome::Activated(power) => writeln!(out, "{power} activated"),
        ClickOutcome::MirageToggled(square) => writeln!(out, "mirage toggled on {square}"),
        ClickOutcome::Resurrected(square) => writeln!(out, "resurrected on {square}"),
        ClickOutcome::Frozen(square) => writeln!(out, "froze {square}"),
        ClickOutcome::Moved(report) => write_report(report, out),
        ClickOutcome::Rejected(err) => writeln!(out, "error: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::random::RandomOracle;

    fn frontend() -> TextFrontend {
        let config = GameConfig {
            bot_engine: "random".to_owned(),
            bot_think_time: Duration::ZERO,
            seed: Some(3),
            ..GameConfig::default()
        };
        TextFrontend::new(Session::with_inline_oracle(
            config,
            Box::new(RandomOracle::new(Some(3))),
        ))
    }

    fn run(frontend: &mut TextFrontend, line: &str) -> String {
        let mut out = Vec::new();
        let quit = frontend
            .handle_command(line, &mut out)
            .expect("writing to a Vec should not fail");
        assert!(!quit, "{line} should not quit");
        String::from_utf8(out).expect("output should be utf-8")
    }

    #[test]
    fn start_and_move_reports_events() {
        let mut frontend = frontend();
        let started = run(&mut frontend, "start standard");
        assert!(started.contains("standard game started"), "{started}");

        let moved = run(&mut frontend, "move e2e4");
        assert!(moved.contains("e2e4"), "{moved}");
        assert_eq!(frontend.session().game().side_to_move(), Color::Dark);
    }

    #[test]
    fn clicks_select_then_move() {
        let mut frontend = frontend();
        run(&mut frontend, "start standard");
        assert!(run(&mut frontend, "click g1").contains("selected g1"));
        let moved = run(&mut frontend, "click f3");
        assert!(moved.contains("g1f3"), "{moved}");
    }

    #[test]
    fn horde_answers_after_human_move() {
        let mut frontend = frontend();
        run(&mut frontend, "start horde");
        run(&mut frontend, "move d2d4");
        let game = frontend.session().game();
        assert_eq!(game.side_to_move(), Color::Light);
        assert_eq!(game.state().plies, 2);
    }

    #[test]
    fn bad_input_is_reported_not_fatal() {
        let mut frontend = frontend();
        run(&mut frontend, "start standard");
        assert!(run(&mut frontend, "move e2e5").starts_with("error:"));
        assert!(run(&mut frontend, "click z9").contains("invalid square"));
        assert!(run(&mut frontend, "card SHANI").starts_with("error:"));
        assert!(run(&mut frontend, "frobnicate").contains("unknown command"));
        assert!(run(&mut frontend, "start chess960").contains("unknown mode"));
    }

    #[test]
    fn board_status_and_record_render() {
        let mut frontend = frontend();
        run(&mut frontend, "start standard");
        run(&mut frontend, "move e2e4");

        let board = run(&mut frontend, "board");
        assert!(board.contains("a  b  c"), "{board}");
        let status = run(&mut frontend, "status");
        assert!(status.contains("mode: standard"), "{status}");
        assert!(status.contains("tiers unlocked: 0"), "{status}");
        let record = run(&mut frontend, "record");
        assert!(record.contains("1. e2e4"), "{record}");
    }

    #[test]
    fn quit_ends_the_loop() {
        let mut frontend = frontend();
        let mut out = Vec::new();
        assert!(frontend
            .handle_command("quit", &mut out)
            .expect("quit should succeed"));
    }
}
