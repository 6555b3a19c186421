/// Procedural terrain for the infinite-world variant.
///
/// The world is cut into `CHUNK_SIZE`×`CHUNK_SIZE` chunks keyed by chunk
/// coordinates. A chunk is generated from a seeded hash of world
/// coordinates the first time any of its cells is asked for, then cached
/// until `retain_visible` finds it outside the viewport.
///
/// Generation depends only on (seed, x, y), so an evicted chunk comes back
/// identical.

use std::cell::RefCell;
use std::collections::HashMap;

use tracing::debug;

use super::layer::{DynamicTile, LayerLookup};
use super::physics::TileSource;
use super::point::{Point, Rect};
use super::tile::{ItemKind, Tile};

pub const CHUNK_SIZE: i32 = 16;

/// Cells within this distance of the origin are always open (spawn room).
const SPAWN_CLEARANCE: i32 = 2;

struct Chunk {
    tiles: Vec<Tile>,
}

pub struct ChunkCache {
    seed: u64,
    chunks: RefCell<HashMap<Point, Chunk>>,
    log_chunks: bool,
}

impl ChunkCache {
    pub fn new(seed: u64, log_chunks: bool) -> Self {
        ChunkCache {
            seed,
            chunks: RefCell::new(HashMap::new()),
            log_chunks,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Number of chunks currently held.
    pub fn cached_chunks(&self) -> usize {
        self.chunks.borrow().len()
    }

    /// Drop every chunk whose bounds no longer touch `view`.
    /// Returns how many were evicted.
    pub fn retain_visible(&self, view: Rect) -> usize {
        let mut chunks = self.chunks.borrow_mut();
        let before = chunks.len();
        chunks.retain(|cp, _| chunk_bounds(*cp).intersects(&view));
        let evicted = before - chunks.len();
        if self.log_chunks && evicted > 0 {
            debug!(evicted, remaining = chunks.len(), "evicted off-screen chunks");
        }
        evicted
    }

    /// Tile the generator places at `p`, bypassing the cache.
    pub fn generated_tile(&self, p: Point) -> Tile {
        if p.x.abs() <= SPAWN_CLEARANCE && p.y.abs() <= SPAWN_CLEARANCE {
            return Tile::Empty;
        }
        match cell_hash(self.seed, p) % 100 {
            0..=11 => Tile::Box,
            12..=13 => Tile::FragileBox,
            14 => Tile::GripWall,
            15 => Tile::UpBox,
            16 => Tile::Item { kind: ItemKind::Coin },
            _ => Tile::Empty,
        }
    }

    fn generate(&self, cp: Point) -> Chunk {
        let origin = cp.scale(CHUNK_SIZE);
        let mut tiles = Vec::with_capacity((CHUNK_SIZE * CHUNK_SIZE) as usize);
        for ly in 0..CHUNK_SIZE {
            for lx in 0..CHUNK_SIZE {
                tiles.push(self.generated_tile(origin + Point::new(lx, ly)));
            }
        }
        if self.log_chunks {
            debug!(chunk = %cp, "generated chunk");
        }
        Chunk { tiles }
    }
}

impl TileSource for ChunkCache {
    fn tile_at(&self, p: Point) -> Tile {
        let (cp, idx) = split(p);
        let mut chunks = self.chunks.borrow_mut();
        let chunk = chunks.entry(cp).or_insert_with(|| self.generate(cp));
        chunk.tiles[idx].clone()
    }
}

impl LayerLookup for ChunkCache {
    fn dynamic_at(&self, p: Point) -> Option<DynamicTile> {
        Some(DynamicTile::from(self.tile_at(p)))
    }
}

/// World point → (chunk coordinate, index inside the chunk).
fn split(p: Point) -> (Point, usize) {
    let cp = Point::new(p.x.div_euclid(CHUNK_SIZE), p.y.div_euclid(CHUNK_SIZE));
    let lx = p.x.rem_euclid(CHUNK_SIZE);
    let ly = p.y.rem_euclid(CHUNK_SIZE);
    (cp, (ly * CHUNK_SIZE + lx) as usize)
}

fn chunk_bounds(cp: Point) -> Rect {
    Rect::new(cp.scale(CHUNK_SIZE), Point::new(CHUNK_SIZE, CHUNK_SIZE))
}

/// SplitMix64 finalizer over (seed, x, y).
fn cell_hash(seed: u64, p: Point) -> u64 {
    let mut z = seed
        ^ (p.x as u32 as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ (p.y as u32 as u64).wrapping_mul(0xC2B2_AE3D_27D4_EB4F).rotate_left(31);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_handles_negative_coordinates() {
        assert_eq!(split(Point::new(0, 0)), (Point::new(0, 0), 0));
        assert_eq!(split(Point::new(-1, 0)), (Point::new(-1, 0), 15));
        assert_eq!(split(Point::new(17, -17)), (Point::new(1, -2), (15 * 16 + 1) as usize));
    }

    #[test]
    fn lookups_fill_cache_lazily() {
        let cache = ChunkCache::new(7, false);
        assert_eq!(cache.cached_chunks(), 0);
        cache.tile_at(Point::new(3, 3));
        cache.tile_at(Point::new(15, 15));
        assert_eq!(cache.cached_chunks(), 1);
        cache.tile_at(Point::new(-1, 3));
        assert_eq!(cache.cached_chunks(), 2);
    }

    #[test]
    fn cached_tiles_match_generator() {
        let cache = ChunkCache::new(42, false);
        for y in -20..20 {
            for x in -20..20 {
                let p = Point::new(x, y);
                assert_eq!(cache.tile_at(p), cache.generated_tile(p));
            }
        }
    }

    #[test]
    fn same_seed_same_world() {
        let a = ChunkCache::new(99, false);
        let b = ChunkCache::new(99, false);
        let c = ChunkCache::new(100, false);
        let pts: Vec<Point> = (0..200).map(|i| Point::new(i * 7 - 300, i * 3 - 100)).collect();
        let ta: Vec<Tile> = pts.iter().map(|p| a.tile_at(*p)).collect();
        let tb: Vec<Tile> = pts.iter().map(|p| b.tile_at(*p)).collect();
        let tc: Vec<Tile> = pts.iter().map(|p| c.tile_at(*p)).collect();
        assert_eq!(ta, tb);
        assert_ne!(ta, tc);
    }

    #[test]
    fn spawn_room_is_open() {
        let cache = ChunkCache::new(1, false);
        for y in -SPAWN_CLEARANCE..=SPAWN_CLEARANCE {
            for x in -SPAWN_CLEARANCE..=SPAWN_CLEARANCE {
                assert!(cache.tile_at(Point::new(x, y)).is_open());
            }
        }
    }

    #[test]
    fn eviction_keeps_only_visible_chunks() {
        let cache = ChunkCache::new(3, false);
        cache.tile_at(Point::new(0, 0));
        cache.tile_at(Point::new(40, 0));
        cache.tile_at(Point::new(-40, -40));
        assert_eq!(cache.cached_chunks(), 3);
        let evicted = cache.retain_visible(Rect::new(Point::new(-4, -4), Point::new(10, 10)));
        assert_eq!(evicted, 2);
        assert_eq!(cache.cached_chunks(), 1);
        // Evicted chunk regenerates identically.
        let p = Point::new(40, 0);
        assert_eq!(cache.tile_at(p), cache.generated_tile(p));
    }
}
