//! Horde life tracking and deferred respawns.
//!
//! Every horde piece gets a stable [`PieceId`] when the game starts. The
//! tracker keeps a square -> id map in step with the board so a capture can
//! always be traced back to the identity that owns the life counter.

use std::collections::BTreeMap;

use crate::board::position::Position;
use crate::board::types::{Color, PieceKind, Square};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PieceId(pub u16);

impl std::fmt::Display for PieceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Extra lives a horde piece starts with.
pub const fn starting_lives(kind: PieceKind) -> u8 {
    match kind {
        PieceKind::Pawn => 3,
        PieceKind::Knight | PieceKind::Bishop => 2,
        PieceKind::Rook => 1,
        PieceKind::Queen | PieceKind::King => 0,
    }
}

/// Back-rank square a non-pawn `kind` of `color` starts on, on the queenside
/// or kingside half of the board.
pub fn canonical_square(kind: PieceKind, color: Color, queenside: bool) -> Option<Square> {
    let file = match (kind, queenside) {
        (PieceKind::Pawn, _) => return None,
        (PieceKind::Rook, true) => 0,
        (PieceKind::Knight, true) => 1,
        (PieceKind::Bishop, true) => 2,
        (PieceKind::Queen, _) => 3,
        (PieceKind::King, _) => 4,
        (PieceKind::Bishop, false) => 5,
        (PieceKind::Knight, false) => 6,
        (PieceKind::Rook, false) => 7,
    };
    let rank = match color {
        Color::Light => 0,
        Color::Dark => 7,
    };
    Square::from_coords(file, rank)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HordeIdentity {
    pub id: PieceId,
    pub home: Square,
    pub starting_kind: PieceKind,
    kind: PieceKind,
    lives: u8,
}

impl HordeIdentity {
    #[inline]
    pub fn lives(&self) -> u8 {
        self.lives
    }

    /// The kind the piece has now, which differs from `starting_kind` after
    /// a promotion.
    #[inline]
    pub fn kind(&self) -> PieceKind {
        self.kind
    }

    #[inline]
    fn queenside(&self) -> bool {
        self.home.file() < 4
    }
}

/// What a capture meant for the captured identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureFate {
    /// A life was spent; the piece comes back later.
    Respawn { id: PieceId, lives_left: u8 },
    /// No lives were left.
    Fallen { id: PieceId },
    /// The square did not hold a tracked piece.
    Untracked,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HordeTracker {
    color: Color,
    identities: Vec<HordeIdentity>,
    by_square: BTreeMap<Square, PieceId>,
    fallen: u32,
}

impl HordeTracker {
    /// Assign ids to every `color` piece on the board in square order.
    pub fn new(position: &Position, color: Color) -> Self {
        let mut identities = Vec::new();
        let mut by_square = BTreeMap::new();
        for (idx, (square, piece)) in position.pieces_of(color).into_iter().enumerate() {
            let id = PieceId(idx as u16);
            identities.push(HordeIdentity {
                id,
                home: square,
                starting_kind: piece.kind,
                kind: piece.kind,
                lives: starting_lives(piece.kind),
            });
            by_square.insert(square, id);
        }
        Self {
            color,
            identities,
            by_square,
            fallen: 0,
        }
    }

    #[inline]
    pub fn color(&self) -> Color {
        self.color
    }

    #[inline]
    pub fn id_at(&self, square: Square) -> Option<PieceId> {
        self.by_square.get(&square).copied()
    }

    pub fn identity(&self, id: PieceId) -> Option<&HordeIdentity> {
        self.identities.get(usize::from(id.0))
    }

    pub fn identities(&self) -> &[HordeIdentity] {
        &self.identities
    }

    /// Identities that ran out of lives and were captured.
    #[inline]
    pub fn fallen_count(&self) -> u32 {
        self.fallen
    }

    pub fn follow_move(&mut self, from: Square, to: Square) {
        if let Some(id) = self.by_square.remove(&from) {
            self.by_square.insert(to, id);
        }
    }

    /// The tracked piece on `square` promoted. Its remaining lives are capped
    /// at what the new kind starts with, so a promoted queen has none.
    pub fn promote(&mut self, square: Square, kind: PieceKind) {
        let Some(id) = self.id_at(square) else {
            return;
        };
        if let Some(identity) = self.identities.get_mut(usize::from(id.0)) {
            identity.kind = kind;
            identity.lives = identity.lives.min(starting_lives(kind));
        }
    }

    pub fn bind(&mut self, square: Square, id: PieceId) {
        self.by_square.insert(square, id);
    }

    /// The tracked piece on `square` was captured.
    pub fn on_capture(&mut self, square: Square) -> CaptureFate {
        let Some(id) = self.by_square.remove(&square) else {
            return CaptureFate::Untracked;
        };
        let Some(identity) = self.identities.get_mut(usize::from(id.0)) else {
            return CaptureFate::Untracked;
        };
        if identity.lives > 0 {
            identity.lives -= 1;
            CaptureFate::Respawn {
                id,
                lives_left: identity.lives,
            }
        } else {
            self.fallen += 1;
            CaptureFate::Fallen { id }
        }
    }

    /// Where a respawning piece of `kind` should reappear. Pawns stay on
    /// their home file (ranks 7, 6, 5 from the horde's side); other pieces try
    /// the canonical back-rank square of their kind on their home half, then
    /// the first empty square scanning the three back ranks.
    pub fn respawn_target(&self, id: PieceId, kind: PieceKind, position: &Position) -> Option<Square> {
        let identity = self.identity(id)?;
        let empty = |sq: &Square| !position.is_occupied(*sq);
        let back = match self.color {
            Color::Light => [0i8, 1, 2],
            Color::Dark => [7i8, 6, 5],
        };

        if kind == PieceKind::Pawn {
            let file = identity.home.file() as i8;
            let pawn_ranks = match self.color {
                Color::Light => [1i8, 2, 3],
                Color::Dark => [6i8, 5, 4],
            };
            return pawn_ranks
                .into_iter()
                .filter_map(|rank| Square::from_coords(file, rank))
                .find(empty);
        }

        if let Some(square) = canonical_square(kind, self.color, identity.queenside()) {
            if empty(&square) {
                return Some(square);
            }
        }
        back.into_iter()
            .flat_map(|rank| (0..8i8).filter_map(move |file| Square::from_coords(file, rank)))
            .find(empty)
    }
}

/// A respawn waiting for its due time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RespawnTask {
    pub id: PieceId,
    pub kind: PieceKind,
    /// Due time on the game's elapsed-time axis, in milliseconds.
    pub due_ms: u64,
    pub session_id: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RespawnQueue {
    tasks: Vec<RespawnTask>,
}

impl RespawnQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, task: RespawnTask) {
        self.tasks.push(task);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn pending(&self) -> &[RespawnTask] {
        &self.tasks
    }

    /// Remove and return tasks due by `now_ms`, oldest first. Tasks tagged
    /// with another session are discarded on the way.
    pub fn take_due(&mut self, now_ms: u64, session_id: u64) -> Vec<RespawnTask> {
        self.tasks.retain(|task| task.session_id == session_id);
        let (mut due, pending): (Vec<_>, Vec<_>) =
            self.tasks.drain(..).partition(|task| task.due_ms <= now_ms);
        self.tasks = pending;
        due.sort_by_key(|task| task.due_ms);
        due
    }

    pub fn purge(&mut self) {
        self.tasks.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::types::Piece;

    fn sq(name: &str) -> Square {
        name.parse().expect("test square should parse")
    }

    #[test]
    fn identities_follow_raster_order_with_lives_by_kind() {
        let tracker = HordeTracker::new(&Position::new_game(), Color::Dark);
        assert_eq!(tracker.identities().len(), 16);
        let a7 = tracker.id_at(sq("a7")).expect("a7 pawn is tracked");
        assert_eq!(a7, PieceId(0));
        let lives = |name: &str| {
            let id = tracker.id_at(sq(name)).expect("square is tracked");
            tracker.identity(id).map(|identity| identity.lives())
        };
        assert_eq!(lives("a7"), Some(3));
        assert_eq!(lives("b8"), Some(2));
        assert_eq!(lives("h8"), Some(1));
        assert_eq!(lives("d8"), Some(0));
    }

    #[test]
    fn captures_spend_lives_then_fall() {
        let mut tracker = HordeTracker::new(&Position::new_game(), Color::Dark);
        let rook = tracker.id_at(sq("a8")).expect("a8 rook is tracked");

        assert_eq!(
            tracker.on_capture(sq("a8")),
            CaptureFate::Respawn {
                id: rook,
                lives_left: 0
            }
        );
        tracker.bind(sq("a8"), rook);
        assert_eq!(tracker.on_capture(sq("a8")), CaptureFate::Fallen { id: rook });
        assert_eq!(tracker.fallen_count(), 1);
        assert_eq!(tracker.on_capture(sq("a8")), CaptureFate::Untracked);
    }

    #[test]
    fn moved_pieces_keep_their_identity() {
        let mut tracker = HordeTracker::new(&Position::new_game(), Color::Dark);
        let knight = tracker.id_at(sq("g8")).expect("g8 knight is tracked");
        tracker.follow_move(sq("g8"), sq("f6"));
        assert_eq!(tracker.id_at(sq("f6")), Some(knight));
        assert_eq!(tracker.id_at(sq("g8")), None);
    }

    #[test]
    fn pawn_respawn_walks_down_its_file() {
        let mut position = Position::new_game();
        let tracker = HordeTracker::new(&position, Color::Dark);
        let e_pawn = tracker.id_at(sq("e7")).expect("e7 pawn is tracked");
        assert_eq!(tracker.respawn_target(e_pawn, PieceKind::Pawn, &position), Some(sq("e6")));
        position.put(sq("e6"), Piece::new(Color::Light, PieceKind::Knight));
        assert_eq!(tracker.respawn_target(e_pawn, PieceKind::Pawn, &position), Some(sq("e5")));
        position.put(sq("e5"), Piece::new(Color::Light, PieceKind::Knight));
        assert_eq!(tracker.respawn_target(e_pawn, PieceKind::Pawn, &position), None);
    }

    #[test]
    fn piece_respawn_prefers_home_then_scans_back_ranks() {
        let mut position = Position::new_game();
        let tracker = HordeTracker::new(&position, Color::Dark);
        let knight = tracker.id_at(sq("b8")).expect("b8 knight is tracked");
        position.remove(sq("b8"));
        assert_eq!(tracker.respawn_target(knight, PieceKind::Knight, &position), Some(sq("b8")));

        position.put(sq("b8"), Piece::new(Color::Light, PieceKind::Queen));
        position.remove(sq("h7"));
        assert_eq!(tracker.respawn_target(knight, PieceKind::Knight, &position), Some(sq("h7")));
    }

    #[test]
    fn piece_respawn_uses_the_canonical_square_of_its_kind() {
        let position =
            Position::from_fen("4k3/8/8/4n3/8/8/8/4K3 w - - 0 1").expect("FEN should parse");
        let tracker = HordeTracker::new(&position, Color::Dark);
        let knight = tracker.id_at(sq("e5")).expect("e5 knight is tracked");
        assert_eq!(tracker.respawn_target(knight, PieceKind::Knight, &position), Some(sq("g8")));
        assert_eq!(canonical_square(PieceKind::Pawn, Color::Dark, true), None);
        assert_eq!(canonical_square(PieceKind::Rook, Color::Light, true), Some(sq("a1")));
    }

    #[test]
    fn promotion_caps_lives_to_the_new_kind() {
        let position =
            Position::from_fen("4k3/8/8/8/8/8/1p5p/4K3 w - - 0 1").expect("FEN should parse");
        let mut tracker = HordeTracker::new(&position, Color::Dark);
        let b_pawn = tracker.id_at(sq("b2")).expect("b2 pawn is tracked");
        let h_pawn = tracker.id_at(sq("h2")).expect("h2 pawn is tracked");

        tracker.follow_move(sq("b2"), sq("b1"));
        tracker.promote(sq("b1"), PieceKind::Knight);
        let knight = tracker.identity(b_pawn).expect("identity");
        assert_eq!((knight.kind(), knight.lives()), (PieceKind::Knight, 2));
        assert_eq!(knight.starting_kind, PieceKind::Pawn);
        let mut board = position.clone();
        board.remove(sq("b2"));
        assert_eq!(tracker.respawn_target(b_pawn, PieceKind::Knight, &board), Some(sq("b8")));

        tracker.follow_move(sq("h2"), sq("h1"));
        tracker.promote(sq("h1"), PieceKind::Queen);
        assert_eq!(tracker.on_capture(sq("h1")), CaptureFate::Fallen { id: h_pawn });
    }

    #[test]
    fn queue_releases_due_tasks_and_drops_stale_sessions() {
        let mut queue = RespawnQueue::new();
        let task = |due_ms, session_id| RespawnTask {
            id: PieceId(1),
            kind: PieceKind::Pawn,
            due_ms,
            session_id,
        };
        queue.schedule(task(3000, 1));
        queue.schedule(task(2000, 1));
        queue.schedule(task(1000, 0));

        let due = queue.take_due(2500, 1);
        assert_eq!(due, vec![task(2000, 1)]);
        assert_eq!(queue.pending(), &[task(3000, 1)]);

        queue.purge();
        assert!(queue.is_empty());
    }
}
