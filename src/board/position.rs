//! Position adapter over a bitboard chess position.
//!
//! `Position` is the single authority on piece placement, side to move,
//! castling and en-passant state. Besides legal move application it supports
//! the out-of-band mutations the rules overlay needs (placing clones,
//! resurrecting or respawning pieces, geometric moves that ignore blockers)
//! while keeping its caches and castling rights consistent.

use crate::board::attacks::{
    bishop_attacks, king_attacks, knight_attacks, pawn_attacks, queen_attacks, rook_attacks,
};
use crate::board::fen::{generate_fen, parse_fen};
use crate::board::movegen::generate_legal_moves;
use crate::board::types::{Color, Move, Piece, PieceKind, PositionError, Square};

/// Standard chess starting position in Forsyth-Edwards Notation (FEN).
pub const STARTING_POSITION_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

pub type CastlingRights = u8;

pub const CASTLE_LIGHT_KINGSIDE: CastlingRights = 1 << 0;
pub const CASTLE_LIGHT_QUEENSIDE: CastlingRights = 1 << 1;
pub const CASTLE_DARK_KINGSIDE: CastlingRights = 1 << 2;
pub const CASTLE_DARK_QUEENSIDE: CastlingRights = 1 << 3;

const BACK_RANK: [PieceKind; 8] = [
    PieceKind::Rook,
    PieceKind::Knight,
    PieceKind::Bishop,
    PieceKind::Queen,
    PieceKind::King,
    PieceKind::Bishop,
    PieceKind::Knight,
    PieceKind::Rook,
];

/// What a committed move did to the board, reported back to the overlay so
/// square-keyed bookkeeping can follow the pieces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedMove {
    pub mv: Move,
    /// The moving piece as it stood on the origin square.
    pub piece: Piece,
    /// Captured piece and the square it was removed from (differs from
    /// `mv.to` for en passant).
    pub captured: Option<(Square, Piece)>,
    /// Rook origin and destination when the move castled.
    pub rook_shift: Option<(Square, Square)>,
    pub promoted_to: Option<PieceKind>,
}

impl AppliedMove {
    #[inline]
    pub fn is_capture(&self) -> bool {
        self.captured.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    // [color][piece_kind]
    pub(crate) pieces: [[u64; 6]; 2],
    pub(crate) occupancy_by_color: [u64; 2],
    pub(crate) occupancy_all: u64,

    pub(crate) side_to_move: Color,
    pub(crate) castling_rights: CastlingRights,
    pub(crate) en_passant_square: Option<Square>,

    pub(crate) halfmove_clock: u16,
    pub(crate) fullmove_number: u16,
}

impl Default for Position {
    fn default() -> Self {
        Self {
            pieces: [[0; 6]; 2],
            occupancy_by_color: [0; 2],
            occupancy_all: 0,
            side_to_move: Color::Light,
            castling_rights: 0,
            en_passant_square: None,
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }
}

impl Position {
    #[inline]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Standard starting position.
    pub fn new_game() -> Self {
        let mut position = Self::empty();
        for (file, kind) in BACK_RANK.iter().enumerate() {
            let file = file as i8;
            for (color, back, pawns) in [(Color::Light, 0, 1), (Color::Dark, 7, 6)] {
                if let Some(sq) = Square::from_coords(file, back) {
                    position.set_bit(sq, Piece::new(color, *kind));
                }
                if let Some(sq) = Square::from_coords(file, pawns) {
                    position.set_bit(sq, Piece::new(color, PieceKind::Pawn));
                }
            }
        }
        position.castling_rights = CASTLE_LIGHT_KINGSIDE
            | CASTLE_LIGHT_QUEENSIDE
            | CASTLE_DARK_KINGSIDE
            | CASTLE_DARK_QUEENSIDE;
        position.recalc_occupancy();
        position
    }

    #[inline]
    pub fn from_fen(fen: &str) -> Result<Self, PositionError> {
        parse_fen(fen)
    }

    #[inline]
    pub fn to_fen(&self) -> String {
        generate_fen(self)
    }

    /// Copy of the full position for later `restore`.
    #[inline]
    pub fn snapshot(&self) -> Position {
        self.clone()
    }

    #[inline]
    pub fn restore(&mut self, snapshot: Position) {
        *self = snapshot;
    }

    #[inline]
    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    /// Hand the move to `color` without playing a move. Clears en passant,
    /// which is only valid for the reply immediately after a double push.
    pub fn set_side_to_move(&mut self, color: Color) {
        self.side_to_move = color;
        self.en_passant_square = None;
    }

    #[inline]
    pub fn fullmove_number(&self) -> u16 {
        self.fullmove_number
    }

    #[inline]
    pub fn castling_rights(&self) -> CastlingRights {
        self.castling_rights
    }

    #[inline]
    pub fn en_passant_square(&self) -> Option<Square> {
        self.en_passant_square
    }

    #[inline]
    pub fn occupancy(&self) -> u64 {
        self.occupancy_all
    }

    #[inline]
    pub fn occupancy_of(&self, color: Color) -> u64 {
        self.occupancy_by_color[color.index()]
    }

    #[inline]
    pub fn bitboard(&self, color: Color, kind: PieceKind) -> u64 {
        self.pieces[color.index()][kind.index()]
    }

    #[inline]
    pub fn is_occupied(&self, square: Square) -> bool {
        self.occupancy_all & square.bit() != 0
    }

    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        let mask = square.bit();
        if self.occupancy_all & mask == 0 {
            return None;
        }
        for color in Color::ALL {
            if self.occupancy_by_color[color.index()] & mask == 0 {
                continue;
            }
            for kind in PieceKind::ALL {
                if self.pieces[color.index()][kind.index()] & mask != 0 {
                    return Some(Piece::new(color, kind));
                }
            }
        }
        None
    }

    /// All pieces of `color` with their squares, in square order.
    pub fn pieces_of(&self, color: Color) -> Vec<(Square, Piece)> {
        Square::iter_bits(self.occupancy_by_color[color.index()])
            .filter_map(|sq| self.piece_at(sq).map(|piece| (sq, piece)))
            .collect()
    }

    /// Place `piece` on `square` unconditionally, replacing any occupant.
    /// Returns the displaced piece.
    pub fn put(&mut self, square: Square, piece: Piece) -> Option<Piece> {
        let displaced = self.take(square);
        self.set_bit(square, piece);
        self.recalc_occupancy();
        self.sanitize_castling_rights();
        displaced
    }

    /// Remove whatever stands on `square` without any legality check.
    pub fn remove(&mut self, square: Square) -> Option<Piece> {
        let removed = self.take(square);
        if removed.is_some() {
            self.recalc_occupancy();
            self.sanitize_castling_rights();
        }
        removed
    }

    pub fn king_square(&self, color: Color) -> Option<Square> {
        Square::iter_bits(self.pieces[color.index()][PieceKind::King.index()]).next()
    }

    pub fn is_square_attacked(&self, square: Square, attacker: Color) -> bool {
        let theirs = &self.pieces[attacker.index()];
        let occ = self.occupancy_all;

        // A pawn of `attacker` hits `square` exactly when a defender pawn on
        // `square` would hit the attacker pawn.
        if pawn_attacks(attacker.opposite(), square) & theirs[PieceKind::Pawn.index()] != 0 {
            return true;
        }
        if knight_attacks(square) & theirs[PieceKind::Knight.index()] != 0 {
            return true;
        }
        if king_attacks(square) & theirs[PieceKind::King.index()] != 0 {
            return true;
        }
        let diagonal = theirs[PieceKind::Bishop.index()] | theirs[PieceKind::Queen.index()];
        if bishop_attacks(square, occ) & diagonal != 0 {
            return true;
        }
        let straight = theirs[PieceKind::Rook.index()] | theirs[PieceKind::Queen.index()];
        rook_attacks(square, occ) & straight != 0
    }

    pub fn in_check(&self, color: Color) -> bool {
        match self.king_square(color) {
            Some(king) => self.is_square_attacked(king, color.opposite()),
            None => false,
        }
    }

    /// Squares attacked by the piece standing on `square`.
    pub fn attacks_from(&self, square: Square) -> u64 {
        let Some(piece) = self.piece_at(square) else {
            return 0;
        };
        match piece.kind {
            PieceKind::Pawn => pawn_attacks(piece.color, square),
            PieceKind::Knight => knight_attacks(square),
            PieceKind::Bishop => bishop_attacks(square, self.occupancy_all),
            PieceKind::Rook => rook_attacks(square, self.occupancy_all),
            PieceKind::Queen => queen_attacks(square, self.occupancy_all),
            PieceKind::King => king_attacks(square),
        }
    }

    /// Whether the piece on `square` currently attacks the enemy king.
    pub fn attacks_king_from(&self, square: Square) -> bool {
        let Some(piece) = self.piece_at(square) else {
            return false;
        };
        match self.king_square(piece.color.opposite()) {
            Some(king) => self.attacks_from(square) & king.bit() != 0,
            None => false,
        }
    }

    pub fn legal_moves(&self) -> Vec<Move> {
        generate_legal_moves(self)
    }

    pub fn legal_moves_from(&self, square: Square) -> Vec<Move> {
        self.legal_moves()
            .into_iter()
            .filter(|mv| mv.from == square)
            .collect()
    }

    /// Resolve a requested move against the legal list. A missing promotion
    /// piece defaults to a queen.
    pub fn find_legal(&self, mv: Move) -> Option<Move> {
        let wanted_promotion = mv.promotion.unwrap_or(PieceKind::Queen);
        self.legal_moves().into_iter().find(|candidate| {
            candidate.from == mv.from
                && candidate.to == mv.to
                && candidate
                    .promotion
                    .map_or(true, |promo| promo == wanted_promotion)
        })
    }

    #[inline]
    pub fn is_legal(&self, mv: Move) -> bool {
        self.find_legal(mv).is_some()
    }

    /// Apply a move for the side to move if the rules allow it. An illegal
    /// request leaves the position untouched.
    pub fn apply_legal_move(&mut self, mv: Move) -> Result<AppliedMove, PositionError> {
        let legal = self.find_legal(mv).ok_or(PositionError::IllegalMove(mv))?;
        self.apply_unchecked(legal)
    }

    /// Move a piece from `from` to `to` ignoring movement rules and blockers,
    /// capturing any enemy piece on `to`, then pass the turn to the opponent
    /// of the moved piece. Pawns arriving on their last rank promote.
    pub fn relocate(
        &mut self,
        from: Square,
        to: Square,
        promotion: Option<PieceKind>,
    ) -> Result<AppliedMove, PositionError> {
        let piece = self.piece_at(from).ok_or(PositionError::EmptySquare(from))?;
        let mv = Move::with_promotion(from, to, promotion);
        if from == to {
            return Err(PositionError::IllegalMove(mv));
        }
        if let Some(target) = self.piece_at(to) {
            if target.color == piece.color || target.kind == PieceKind::King {
                return Err(PositionError::IllegalMove(mv));
            }
        }

        let captured = self.take(to).map(|victim| (to, victim));
        self.take(from);
        let placed = self.promoted_kind(piece, to, promotion);
        self.set_bit(to, Piece::new(piece.color, placed));

        self.finish_move(piece, captured.is_some(), None);
        self.sanitize_castling_rights();

        Ok(AppliedMove {
            mv,
            piece,
            captured,
            rook_shift: None,
            promoted_to: (placed != piece.kind).then_some(placed),
        })
    }

    pub fn is_checkmate(&self) -> bool {
        self.in_check(self.side_to_move) && self.legal_moves().is_empty()
    }

    pub fn is_stalemate(&self) -> bool {
        !self.in_check(self.side_to_move) && self.legal_moves().is_empty()
    }

    /// Simulate `mv` (without a legality check) and report whether it leaves
    /// the opponent of the moving piece in check. The position is unchanged.
    pub fn would_move_give_check(&self, mv: Move) -> bool {
        let Some(piece) = self.piece_at(mv.from) else {
            return false;
        };
        let mut scratch = self.clone();
        match scratch.apply_unchecked(mv) {
            Ok(_) => scratch.in_check(piece.color.opposite()),
            Err(_) => false,
        }
    }

    /// The square a move would capture on, if any (en-passant aware).
    pub fn capture_square(&self, mv: Move) -> Option<Square> {
        let mover = self.piece_at(mv.from)?;
        if let Some(target) = self.piece_at(mv.to) {
            return (target.color != mover.color).then_some(mv.to);
        }
        if mover.kind == PieceKind::Pawn
            && mv.from.file() != mv.to.file()
            && self.en_passant_square == Some(mv.to)
        {
            return Square::from_coords(mv.to.file() as i8, mv.from.rank() as i8);
        }
        None
    }

    /// Play `mv` for the piece on `mv.from` with no legality filtering.
    /// Castling, en passant, promotion and right updates are inferred.
    pub(crate) fn apply_unchecked(&mut self, mv: Move) -> Result<AppliedMove, PositionError> {
        let piece = self
            .piece_at(mv.from)
            .ok_or(PositionError::EmptySquare(mv.from))?;

        let captured = match self.capture_square(mv) {
            Some(sq) => self.take(sq).map(|victim| (sq, victim)),
            None => None,
        };

        self.take(mv.from);
        let placed = self.promoted_kind(piece, mv.to, mv.promotion);
        self.set_bit(mv.to, Piece::new(piece.color, placed));

        let mut rook_shift = None;
        if piece.kind == PieceKind::King && mv.from.file().abs_diff(mv.to.file()) == 2 {
            let rank = mv.from.rank() as i8;
            let (rook_file, rook_dest_file) = if mv.to.file() == 6 { (7, 5) } else { (0, 3) };
            if let (Some(rook_from), Some(rook_to)) = (
                Square::from_coords(rook_file, rank),
                Square::from_coords(rook_dest_file, rank),
            ) {
                if let Some(rook) = self.take(rook_from) {
                    self.set_bit(rook_to, rook);
                    rook_shift = Some((rook_from, rook_to));
                }
            }
        }

        self.castling_rights &= !(rights_touching(mv.from) | rights_touching(mv.to));

        let double_push = piece.kind == PieceKind::Pawn && mv.from.rank().abs_diff(mv.to.rank()) == 2;
        let en_passant = if double_push {
            Square::from_coords(mv.from.file() as i8, ((mv.from.rank() + mv.to.rank()) / 2) as i8)
        } else {
            None
        };

        self.finish_move(piece, captured.is_some(), en_passant);

        Ok(AppliedMove {
            mv,
            piece,
            captured,
            rook_shift,
            promoted_to: (placed != piece.kind).then_some(placed),
        })
    }

    fn promoted_kind(&self, piece: Piece, to: Square, promotion: Option<PieceKind>) -> PieceKind {
        if piece.kind == PieceKind::Pawn && to.rank() == piece.color.promotion_rank() {
            match promotion {
                Some(kind) if PieceKind::PROMOTIONS.contains(&kind) => kind,
                _ => PieceKind::Queen,
            }
        } else {
            piece.kind
        }
    }

    fn finish_move(&mut self, piece: Piece, was_capture: bool, en_passant: Option<Square>) {
        self.en_passant_square = en_passant;
        if piece.kind == PieceKind::Pawn || was_capture {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock = self.halfmove_clock.saturating_add(1);
        }
        if piece.color == Color::Dark {
            self.fullmove_number = self.fullmove_number.saturating_add(1);
        }
        self.side_to_move = piece.color.opposite();
        self.recalc_occupancy();
    }

    /// Clear a square's bits without touching caches.
    fn take(&mut self, square: Square) -> Option<Piece> {
        let piece = self.piece_at(square)?;
        self.pieces[piece.color.index()][piece.kind.index()] &= !square.bit();
        self.occupancy_by_color[piece.color.index()] &= !square.bit();
        self.occupancy_all &= !square.bit();
        Some(piece)
    }

    pub(crate) fn set_bit(&mut self, square: Square, piece: Piece) {
        self.pieces[piece.color.index()][piece.kind.index()] |= square.bit();
        self.occupancy_by_color[piece.color.index()] |= square.bit();
        self.occupancy_all |= square.bit();
    }

    pub(crate) fn recalc_occupancy(&mut self) {
        for color in Color::ALL {
            self.occupancy_by_color[color.index()] = self.pieces[color.index()]
                .iter()
                .fold(0u64, |acc, bb| acc | bb);
        }
        self.occupancy_all = self.occupancy_by_color[0] | self.occupancy_by_color[1];
    }

    /// Drop any castling right whose king or rook is no longer on its home
    /// square. Out-of-band edits can otherwise leave stale rights behind.
    fn sanitize_castling_rights(&mut self) {
        for (right, color, rook_file) in [
            (CASTLE_LIGHT_KINGSIDE, Color::Light, 7),
            (CASTLE_LIGHT_QUEENSIDE, Color::Light, 0),
            (CASTLE_DARK_KINGSIDE, Color::Dark, 7),
            (CASTLE_DARK_QUEENSIDE, Color::Dark, 0),
        ] {
            if self.castling_rights & right == 0 {
                continue;
            }
            let rank = if color == Color::Light { 0 } else { 7 };
            let king_home = Square::from_coords(4, rank);
            let rook_home = Square::from_coords(rook_file, rank);
            let intact = king_home.and_then(|sq| self.piece_at(sq))
                == Some(Piece::new(color, PieceKind::King))
                && rook_home.and_then(|sq| self.piece_at(sq))
                    == Some(Piece::new(color, PieceKind::Rook));
            if !intact {
                self.castling_rights &= !right;
            }
        }
    }
}

/// Castling rights lost when a piece leaves or arrives on `square`.
fn rights_touching(square: Square) -> CastlingRights {
    match square.index() {
        0 => CASTLE_LIGHT_QUEENSIDE,
        4 => CASTLE_LIGHT_KINGSIDE | CASTLE_LIGHT_QUEENSIDE,
        7 => CASTLE_LIGHT_KINGSIDE,
        56 => CASTLE_DARK_QUEENSIDE,
        60 => CASTLE_DARK_KINGSIDE | CASTLE_DARK_QUEENSIDE,
        63 => CASTLE_DARK_KINGSIDE,
        _ => 0,
    }
}
