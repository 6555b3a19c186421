/// Board: the read-only view the movement rules query.
///
/// ## Architecture
///
/// Two distinct concepts:
///   1. TERRAIN: what tile a cell resolves to (`TileSource`)
///   2. PLAYER:  where the player is and what energy it carries
///
/// Every rule predicate is phrased relative to the player position, so the
/// rules never see absolute coordinates.
///
/// ## Support
///
/// The player has SUPPORT (will not fall) iff the cell directly below is
/// not open. Open cells are listed in `Tile::is_open`; spikes and items are
/// open, so they never hold the player up.

use super::entity::Player;
use super::point::Point;
use super::tile::Tile;

/// Anything that can answer "what tile is at this point".
///
/// Total over the whole integer grid: implementations decide what lies
/// outside designed content (`Empty` for layer stacks, generated terrain
/// for the chunk cache).
pub trait TileSource {
    fn tile_at(&self, p: Point) -> Tile;
}

pub struct Board<'a> {
    pub player: &'a Player,
    pub tiles: &'a dyn TileSource,
}

impl<'a> Board<'a> {
    pub fn new(player: &'a Player, tiles: &'a dyn TileSource) -> Self {
        Board { player, tiles }
    }

    #[inline]
    pub fn impetus(&self) -> i32 {
        self.player.impetus
    }

    /// Tile at player position + (dx, dy).
    #[inline]
    pub fn rtile(&self, dx: i32, dy: i32) -> Tile {
        self.tiles.tile_at(self.player.pos + Point::new(dx, dy))
    }

    #[inline]
    pub fn ropen(&self, dx: i32, dy: i32) -> bool {
        self.rtile(dx, dy).is_open()
    }

    #[inline]
    pub fn rgrabbable(&self, dx: i32, dy: i32) -> bool {
        self.rtile(dx, dy).is_grabbable()
    }

    /// Is the player standing on something?
    #[inline]
    pub fn supported(&self) -> bool {
        !self.ropen(0, 1)
    }
}
