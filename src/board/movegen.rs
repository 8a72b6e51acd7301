//! Legal move generation.
//!
//! Pseudo-legal moves are produced per piece type, then filtered by applying
//! each candidate to a scratch copy and rejecting those that leave the
//! mover's king attacked. Enemy kings are masked out of every target set.

use crate::board::attacks::{
    bishop_attacks, king_attacks, knight_attacks, pawn_attacks, queen_attacks, rook_attacks,
};
use crate::board::position::{
    Position, CASTLE_DARK_KINGSIDE, CASTLE_DARK_QUEENSIDE, CASTLE_LIGHT_KINGSIDE,
    CASTLE_LIGHT_QUEENSIDE,
};
use crate::board::types::{Color, Move, Piece, PieceKind, Square};

pub fn generate_legal_moves(position: &Position) -> Vec<Move> {
    let side = position.side_to_move();
    let mut pseudo = Vec::with_capacity(64);
    generate_pseudo_legal_moves(position, &mut pseudo);

    pseudo
        .into_iter()
        .filter(|mv| {
            let mut scratch = position.clone();
            scratch.apply_unchecked(*mv).is_ok() && !scratch.in_check(side)
        })
        .collect()
}

pub fn generate_pseudo_legal_moves(position: &Position, out: &mut Vec<Move>) {
    let side = position.side_to_move();
    let own = position.occupancy_of(side);
    let enemy_king = position.bitboard(side.opposite(), PieceKind::King);
    let occ = position.occupancy();
    let targets = !own & !enemy_king;

    generate_pawn_moves(position, side, out);

    for from in Square::iter_bits(position.bitboard(side, PieceKind::Knight)) {
        push_targets(out, from, knight_attacks(from) & targets);
    }
    for from in Square::iter_bits(position.bitboard(side, PieceKind::Bishop)) {
        push_targets(out, from, bishop_attacks(from, occ) & targets);
    }
    for from in Square::iter_bits(position.bitboard(side, PieceKind::Rook)) {
        push_targets(out, from, rook_attacks(from, occ) & targets);
    }
    for from in Square::iter_bits(position.bitboard(side, PieceKind::Queen)) {
        push_targets(out, from, queen_attacks(from, occ) & targets);
    }
    for from in Square::iter_bits(position.bitboard(side, PieceKind::King)) {
        push_targets(out, from, king_attacks(from) & targets);
        generate_castling_moves(position, side, from, out);
    }
}

fn push_targets(out: &mut Vec<Move>, from: Square, targets: u64) {
    out.extend(Square::iter_bits(targets).map(|to| Move::new(from, to)));
}

fn push_pawn_move(out: &mut Vec<Move>, from: Square, to: Square, color: Color) {
    if to.rank() == color.promotion_rank() {
        for promo in PieceKind::PROMOTIONS {
            out.push(Move::with_promotion(from, to, Some(promo)));
        }
    } else {
        out.push(Move::new(from, to));
    }
}

fn generate_pawn_moves(position: &Position, side: Color, out: &mut Vec<Move>) {
    let enemy = side.opposite();
    let capturable = position.occupancy_of(enemy) & !position.bitboard(enemy, PieceKind::King);
    let forward = side.forward();

    for from in Square::iter_bits(position.bitboard(side, PieceKind::Pawn)) {
        if let Some(one) = from.offset(0, forward) {
            if !position.is_occupied(one) {
                push_pawn_move(out, from, one, side);
                if from.rank() == side.pawn_start_rank() {
                    if let Some(two) = from.offset(0, 2 * forward) {
                        if !position.is_occupied(two) {
                            out.push(Move::new(from, two));
                        }
                    }
                }
            }
        }

        for to in Square::iter_bits(pawn_attacks(side, from) & capturable) {
            push_pawn_move(out, from, to, side);
        }

        if let Some(ep) = position.en_passant_square() {
            if pawn_attacks(side, from) & ep.bit() != 0 {
                let victim = Square::from_coords(ep.file() as i8, from.rank() as i8);
                let victim_present = victim.and_then(|sq| position.piece_at(sq))
                    == Some(Piece::new(enemy, PieceKind::Pawn));
                if victim_present && !position.is_occupied(ep) {
                    out.push(Move::new(from, ep));
                }
            }
        }
    }
}

fn generate_castling_moves(position: &Position, side: Color, king_from: Square, out: &mut Vec<Move>) {
    let (rank, kingside, queenside) = match side {
        Color::Light => (0i8, CASTLE_LIGHT_KINGSIDE, CASTLE_LIGHT_QUEENSIDE),
        Color::Dark => (7i8, CASTLE_DARK_KINGSIDE, CASTLE_DARK_QUEENSIDE),
    };
    if Square::from_coords(4, rank) != Some(king_from) {
        return;
    }
    let rights = position.castling_rights();
    if rights & (kingside | queenside) == 0 {
        return;
    }
    let enemy = side.opposite();
    if position.is_square_attacked(king_from, enemy) {
        return;
    }

    let own_rook = Some(Piece::new(side, PieceKind::Rook));
    let square = |file: i8| Square::from_coords(file, rank);
    let empty = |file: i8| square(file).is_some_and(|sq| !position.is_occupied(sq));
    let safe = |file: i8| square(file).is_some_and(|sq| !position.is_square_attacked(sq, enemy));

    if rights & kingside != 0
        && square(7).and_then(|sq| position.piece_at(sq)) == own_rook
        && empty(5)
        && empty(6)
        && safe(5)
        && safe(6)
    {
        if let Some(to) = square(6) {
            out.push(Move::new(king_from, to));
        }
    }

    if rights & queenside != 0
        && square(0).and_then(|sq| position.piece_at(sq)) == own_rook
        && empty(1)
        && empty(2)
        && empty(3)
        && safe(2)
        && safe(3)
    {
        if let Some(to) = square(2) {
            out.push(Move::new(king_from, to));
        }
    }
}

/// Count leaf nodes of the legal move tree to `depth`.
pub fn perft(position: &Position, depth: u8) -> u64 {
    if depth == 0 {
        return 1;
    }
    let moves = generate_legal_moves(position);
    if depth == 1 {
        return moves.len() as u64;
    }
    moves
        .into_iter()
        .map(|mv| {
            let mut next = position.clone();
            match next.apply_unchecked(mv) {
                Ok(_) => perft(&next, depth - 1),
                Err(_) => 0,
            }
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::position::STARTING_POSITION_FEN;

    const KIWIPETE_FEN: &str =
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
    const POSITION_3_FEN: &str = "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1";

    #[test]
    fn start_position_has_twenty_moves() {
        let position = Position::from_fen(STARTING_POSITION_FEN).expect("start FEN should parse");
        assert_eq!(generate_legal_moves(&position).len(), 20);
    }

    #[test]
    fn perft_start_position_depth_3() {
        let position = Position::new_game();
        assert_eq!(perft(&position, 3), 8902);
    }

    #[test]
    fn perft_kiwipete_depth_2() {
        let position = Position::from_fen(KIWIPETE_FEN).expect("kiwipete FEN should parse");
        assert_eq!(perft(&position, 1), 48);
        assert_eq!(perft(&position, 2), 2039);
    }

    #[test]
    fn perft_position_3_depth_3() {
        let position = Position::from_fen(POSITION_3_FEN).expect("position 3 FEN should parse");
        assert_eq!(perft(&position, 3), 2812);
    }

    #[test]
    fn castling_requires_rook_on_corner() {
        // Rights claim kingside but the h1 rook is missing.
        let position =
            Position::from_fen("4k3/8/8/8/8/8/8/4K3 w K - 0 1").expect("FEN should parse");
        let castles = generate_legal_moves(&position)
            .into_iter()
            .any(|mv| mv.to_string() == "e1g1");
        assert!(!castles);
    }

    #[test]
    fn king_is_never_a_capture_target() {
        let position =
            Position::from_fen("4k3/8/8/8/8/8/8/4KR2 b - - 0 1").expect("FEN should parse");
        let rook_attacks_king = Position::from_fen("4k3/8/8/8/8/8/8/4R1K1 w - - 0 1")
            .expect("FEN should parse")
            .legal_moves()
            .into_iter()
            .any(|mv| mv.to_string() == "e1e8");
        assert!(!rook_attacks_king);
        assert!(!position.legal_moves().is_empty());
    }
}
