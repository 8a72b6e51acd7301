//! Zone registry: placed tiles, their reach, and their lifetimes.

use crate::board::position::Position;
use crate::board::types::{Color, Square};
use crate::rules::catalog::PowerId;

/// Three full turns, counted in plies.
pub const TILE_PLY_BUDGET: u8 = 6;

/// Every on-board square within Chebyshev distance `radius` of `center`,
/// file-major.
pub fn squares_in_radius(center: Square, radius: u8) -> Vec<Square> {
    let r = radius as i8;
    let (cf, cr) = (center.file() as i8, center.rank() as i8);
    let mut out = Vec::with_capacity(((2 * r + 1) * (2 * r + 1)) as usize);
    for file in (cf - r)..=(cf + r) {
        for rank in (cr - r)..=(cr + r) {
            if let Some(sq) = Square::from_coords(file, rank) {
                out.push(sq);
            }
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    pub anchor: Square,
    pub power: PowerId,
    pub radius: u8,
    plies_left: u8,
    activated: [bool; 2],
    activated_piece: [Option<Square>; 2],
}

impl Tile {
    pub fn new(anchor: Square, power: PowerId, radius: u8) -> Self {
        Self {
            anchor,
            power,
            radius,
            plies_left: TILE_PLY_BUDGET,
            activated: [false; 2],
            activated_piece: [None; 2],
        }
    }

    /// Remaining lifetime in full turns (half a turn per ply).
    #[inline]
    pub fn turns_remaining(&self) -> f32 {
        f32::from(self.plies_left) / 2.0
    }

    #[inline]
    pub fn plies_left(&self) -> u8 {
        self.plies_left
    }

    #[inline]
    pub fn is_activated(&self, color: Color) -> bool {
        self.activated[color.index()]
    }

    /// Square of the piece that activated this tile for `color`, while that
    /// piece is still standing on it.
    #[inline]
    pub fn activated_piece(&self, color: Color) -> Option<Square> {
        self.activated_piece[color.index()]
    }

    #[inline]
    pub fn covers(&self, square: Square) -> bool {
        self.anchor.chebyshev(square) <= self.radius
    }

    pub fn squares(&self) -> Vec<Square> {
        squares_in_radius(self.anchor, self.radius)
    }

    #[inline]
    pub fn is_spent(&self) -> bool {
        self.plies_left == 0 || (self.activated[0] && self.activated[1])
    }
}

/// A piece that may activate a tile this turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivationCandidate {
    pub square: Square,
    pub tile_anchor: Square,
    pub power: PowerId,
}

/// A tile activation that has been committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Activation {
    pub power: PowerId,
    pub anchor: Square,
    pub radius: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZoneRegistry {
    tiles: Vec<Tile>,
}

impl ZoneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn place(&mut self, anchor: Square, power: PowerId, radius: u8) {
        self.tiles.push(Tile::new(anchor, power, radius));
    }

    pub fn covers(&self, square: Square) -> bool {
        self.tiles.iter().any(|tile| tile.covers(square))
    }

    /// First tile (in placement order) reaching `square` that `color` has not
    /// activated yet.
    pub fn first_activatable(&self, square: Square, color: Color) -> Option<&Tile> {
        self.tiles
            .iter()
            .find(|tile| tile.covers(square) && !tile.is_activated(color))
    }

    /// Mark the first activatable tile for `color` at `square`. A tile both
    /// sides have now triggered is dropped at once.
    pub fn activate(&mut self, square: Square, color: Color) -> Option<Activation> {
        let tile = self
            .tiles
            .iter_mut()
            .find(|tile| tile.covers(square) && !tile.is_activated(color))?;
        tile.activated[color.index()] = true;
        tile.activated_piece[color.index()] = Some(square);
        let activation = Activation {
            power: tile.power,
            anchor: tile.anchor,
            radius: tile.radius,
        };
        self.tiles.retain(|tile| !tile.is_spent());
        Some(activation)
    }

    /// Pieces of `color` standing in a live tile they have not triggered yet.
    /// `excluded` filters squares that may not take a power (already powered,
    /// mirages).
    pub fn eligible_pieces<F>(
        &self,
        position: &Position,
        color: Color,
        excluded: F,
    ) -> Vec<ActivationCandidate>
    where
        F: Fn(Square) -> bool,
    {
        let mut out = Vec::new();
        for tile in self.tiles.iter().filter(|tile| !tile.is_activated(color)) {
            for square in tile.squares() {
                let owned = position
                    .piece_at(square)
                    .is_some_and(|piece| piece.color == color);
                if owned && !excluded(square) {
                    out.push(ActivationCandidate {
                        square,
                        tile_anchor: tile.anchor,
                        power: tile.power,
                    });
                }
            }
        }
        out
    }

    /// Forget activation bindings whose piece has left its square. The
    /// activated flags stay set.
    pub fn clear_stale_bindings(&mut self, position: &Position) {
        for tile in &mut self.tiles {
            for color in Color::ALL {
                let slot = &mut tile.activated_piece[color.index()];
                let still_there = slot
                    .and_then(|sq| position.piece_at(sq))
                    .is_some_and(|piece| piece.color == color);
                if !still_there {
                    *slot = None;
                }
            }
        }
    }

    /// Follow a bound piece that moved without a committed move.
    pub fn shift_binding(&mut self, from: Square, to: Square) {
        for tile in &mut self.tiles {
            for slot in &mut tile.activated_piece {
                if *slot == Some(from) {
                    *slot = Some(to);
                }
            }
        }
    }

    /// One ply elapsed. Returns how many tiles expired.
    pub fn tick(&mut self) -> usize {
        let before = self.tiles.len();
        for tile in &mut self.tiles {
            tile.plies_left = tile.plies_left.saturating_sub(1);
        }
        self.tiles.retain(|tile| !tile.is_spent());
        before - self.tiles.len()
    }
}
