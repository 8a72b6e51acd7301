//! FEN parsing and generation for `Position`.

use crate::board::position::{
    CastlingRights, Position, CASTLE_DARK_KINGSIDE, CASTLE_DARK_QUEENSIDE,
    CASTLE_LIGHT_KINGSIDE, CASTLE_LIGHT_QUEENSIDE,
};
use crate::board::types::{Color, Piece, PositionError, Square};

fn invalid(msg: impl Into<String>) -> PositionError {
    PositionError::InvalidFen(msg.into())
}

pub fn parse_fen(fen: &str) -> Result<Position, PositionError> {
    let mut parts = fen.split_whitespace();

    let board_part = parts.next().ok_or_else(|| invalid("missing board layout"))?;
    let side_part = parts.next().ok_or_else(|| invalid("missing side to move"))?;
    let castling_part = parts.next().ok_or_else(|| invalid("missing castling rights"))?;
    let en_passant_part = parts.next().ok_or_else(|| invalid("missing en-passant square"))?;
    let halfmove_part = parts.next().ok_or_else(|| invalid("missing halfmove clock"))?;
    let fullmove_part = parts.next().ok_or_else(|| invalid("missing fullmove number"))?;

    if parts.next().is_some() {
        return Err(invalid("extra trailing fields"));
    }

    let mut position = Position::empty();
    parse_board(board_part, &mut position)?;

    position.side_to_move = match side_part {
        "w" => Color::Light,
        "b" => Color::Dark,
        other => return Err(invalid(format!("invalid side to move '{other}'"))),
    };
    position.castling_rights = parse_castling_rights(castling_part)?;
    position.en_passant_square = match en_passant_part {
        "-" => None,
        sq => Some(
            sq.parse::<Square>()
                .map_err(|_| invalid(format!("invalid en-passant square '{sq}'")))?,
        ),
    };
    position.halfmove_clock = halfmove_part
        .parse::<u16>()
        .map_err(|_| invalid(format!("invalid halfmove clock '{halfmove_part}'")))?;
    position.fullmove_number = fullmove_part
        .parse::<u16>()
        .map_err(|_| invalid(format!("invalid fullmove number '{fullmove_part}'")))?;

    position.recalc_occupancy();
    Ok(position)
}

fn parse_board(board_part: &str, position: &mut Position) -> Result<(), PositionError> {
    let ranks: Vec<&str> = board_part.split('/').collect();
    if ranks.len() != 8 {
        return Err(invalid("board layout must contain 8 ranks"));
    }

    for (fen_rank_idx, rank_str) in ranks.iter().enumerate() {
        let rank = 7 - fen_rank_idx as i8;
        let mut file = 0i8;

        for ch in rank_str.chars() {
            if let Some(empty_count) = ch.to_digit(10) {
                if !(1..=8).contains(&empty_count) {
                    return Err(invalid(format!("invalid empty-square count '{ch}'")));
                }
                file += empty_count as i8;
                continue;
            }

            let piece = Piece::from_fen_char(ch)
                .ok_or_else(|| invalid(format!("invalid piece character '{ch}'")))?;
            let square = Square::from_coords(file, rank)
                .ok_or_else(|| invalid("board rank has too many files"))?;
            position.set_bit(square, piece);
            file += 1;
        }

        if file != 8 {
            return Err(invalid("board rank does not sum to 8 files"));
        }
    }

    Ok(())
}

fn parse_castling_rights(part: &str) -> Result<CastlingRights, PositionError> {
    if part == "-" {
        return Ok(0);
    }
    part.chars().try_fold(0, |rights, ch| {
        let bit = match ch {
            'K' => CASTLE_LIGHT_KINGSIDE,
            'Q' => CASTLE_LIGHT_QUEENSIDE,
            'k' => CASTLE_DARK_KINGSIDE,
            'q' => CASTLE_DARK_QUEENSIDE,
            _ => return Err(invalid(format!("invalid castling character '{ch}'"))),
        };
        Ok(rights | bit)
    })
}

pub fn generate_fen(position: &Position) -> String {
    let mut board = String::with_capacity(72);
    for rank in (0..8i8).rev() {
        let mut empty = 0u8;
        for file in 0..8i8 {
            let piece = Square::from_coords(file, rank).and_then(|sq| position.piece_at(sq));
            match piece {
                Some(piece) => {
                    if empty > 0 {
                        board.push(char::from(b'0' + empty));
                        empty = 0;
                    }
                    board.push(piece.to_fen_char());
                }
                None => empty += 1,
            }
        }
        if empty > 0 {
            board.push(char::from(b'0' + empty));
        }
        if rank > 0 {
            board.push('/');
        }
    }

    let side = match position.side_to_move {
        Color::Light => "w",
        Color::Dark => "b",
    };

    let mut castling = String::new();
    for (bit, ch) in [
        (CASTLE_LIGHT_KINGSIDE, 'K'),
        (CASTLE_LIGHT_QUEENSIDE, 'Q'),
        (CASTLE_DARK_KINGSIDE, 'k'),
        (CASTLE_DARK_QUEENSIDE, 'q'),
    ] {
        if position.castling_rights & bit != 0 {
            castling.push(ch);
        }
    }
    if castling.is_empty() {
        castling.push('-');
    }

    let en_passant = position
        .en_passant_square
        .map_or_else(|| "-".to_owned(), |sq| sq.to_string());

    format!(
        "{board} {side} {castling} {en_passant} {} {}",
        position.halfmove_clock, position.fullmove_number
    )
}
