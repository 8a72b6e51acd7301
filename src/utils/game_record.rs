//! PGN-style game record export.
//!
//! Headers follow PGN tag-pair syntax; movetext uses coordinate notation with
//! power usage written as brace comments between moves.

use std::collections::BTreeMap;

use chrono::{Local, NaiveDate};

use crate::board::position::STARTING_POSITION_FEN;
use crate::board::types::Color;
use crate::game::events::{GameOverReason, GameResult};
use crate::game::orchestrator::Game;
use crate::game::state::HistoryEntry;

/// Record of `game` dated today.
pub fn write_game_record(game: &Game) -> String {
    write_game_record_on(game, Local::now().date_naive())
}

pub fn write_game_record_on(game: &Game, date: NaiveDate) -> String {
    let result = game.result();
    let initial_fen = game.initial_fen();
    let mut headers = BTreeMap::<&str, String>::new();
    headers.insert("Event", "Chessuranga Game".to_owned());
    headers.insert("Site", "Local".to_owned());
    headers.insert("Date", date.format("%Y.%m.%d").to_string());
    headers.insert(
        "Mode",
        game.mode()
            .map_or_else(|| "-".to_owned(), |mode| mode.to_string()),
    );
    headers.insert("Result", result_token(result).to_owned());
    if let Some(result) = result {
        headers.insert("Termination", result.reason.to_string());
        headers.insert(
            "Score",
            format!(
                "{}-{}",
                result.score(Color::Light),
                result.score(Color::Dark)
            ),
        );
    }
    if initial_fen != STARTING_POSITION_FEN {
        headers.insert("SetUp", "1".to_owned());
        headers.insert("FEN", initial_fen.to_owned());
    }

    let mut out = String::new();
    for (key, value) in &headers {
        out.push_str(&format!("[{key} \"{}\"]\n", escape_value(value)));
    }
    out.push('\n');

    let mated = result.is_some_and(|r| r.reason == GameOverReason::Checkmate);
    out.push_str(&movetext(&game.state().history, mated, result_token(result)));
    out.push('\n');
    out
}

fn result_token(result: Option<GameResult>) -> &'static str {
    match result.map(|r| r.winner) {
        Some(Color::Light) => "1-0",
        Some(Color::Dark) => "0-1",
        None => "*",
    }
}

fn escape_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

fn movetext(history: &[HistoryEntry], mated: bool, result: &str) -> String {
    let last_move = history
        .iter()
        .rposition(|entry| matches!(entry, HistoryEntry::Move { .. }));
    let mut parts = Vec::with_capacity(history.len() + 1);
    let mut previous = None;

    for (idx, entry) in history.iter().enumerate() {
        match entry {
            HistoryEntry::Note(text) => {
                parts.push(format!("{{{text}}}"));
                previous = None;
            }
            HistoryEntry::Move {
                number,
                color,
                mv,
                check,
            } => {
                let suffix = match (*check, mated && Some(idx) == last_move) {
                    (_, true) => "#",
                    (true, false) => "+",
                    (false, false) => "",
                };
                let token = match color {
                    Color::Light => format!("{number}. {mv}{suffix}"),
                    Color::Dark if previous == Some((*number, Color::Light)) => {
                        format!("{mv}{suffix}")
                    }
                    Color::Dark => format!("{number}... {mv}{suffix}"),
                };
                parts.push(token);
                previous = Some((*number, *color));
            }
        }
    }
    parts.push(result.to_owned());
    parts.join(" ")
}
