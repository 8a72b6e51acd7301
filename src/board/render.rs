//! Terminal-oriented Unicode board renderer.
//!
//! Assumes square indexing where `0 == a1`, `7 == h1`, and `63 == h8`.

use crate::board::position::Position;
use crate::board::types::{Color, Piece, PieceKind, Square};

/// Render the board to a Unicode string for terminal output.
pub fn render_position(position: &Position) -> String {
    render_position_with_markers(position, |_| None)
}

/// Render the board, printing `marker(square)` after each square that has one.
/// Unmarked squares are padded with a space so columns stay aligned.
pub fn render_position_with_markers<F>(position: &Position, marker: F) -> String
where
    F: Fn(Square) -> Option<char>,
{
    let mut out = String::new();
    out.push_str("   a  b  c  d  e  f  g  h\n");

    for rank in (0..8i8).rev() {
        let rank_char = char::from(b'1' + rank as u8);
        out.push(rank_char);
        out.push(' ');

        for file in 0..8i8 {
            let Some(sq) = Square::from_coords(file, rank) else {
                continue;
            };
            out.push(' ');
            match position.piece_at(sq) {
                Some(piece) => out.push(piece_to_unicode(piece)),
                None => out.push('·'),
            }
            out.push(marker(sq).unwrap_or(' '));
        }

        out.push(' ');
        out.push(rank_char);
        out.push('\n');
    }

    out.push_str("   a  b  c  d  e  f  g  h");
    out
}

fn piece_to_unicode(piece: Piece) -> char {
    match (piece.color, piece.kind) {
        (Color::Light, PieceKind::Pawn) => '♙',
        (Color::Light, PieceKind::Knight) => '♘',
        (Color::Light, PieceKind::Bishop) => '♗',
        (Color::Light, PieceKind::Rook) => '♖',
        (Color::Light, PieceKind::Queen) => '♕',
        (Color::Light, PieceKind::King) => '♔',
        (Color::Dark, PieceKind::Pawn) => '♟',
        (Color::Dark, PieceKind::Knight) => '♞',
        (Color::Dark, PieceKind::Bishop) => '♝',
        (Color::Dark, PieceKind::Rook) => '♜',
        (Color::Dark, PieceKind::Queen) => '♛',
        (Color::Dark, PieceKind::King) => '♚',
    }
}
