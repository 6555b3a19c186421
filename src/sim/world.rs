/// GameState: the complete authoritative snapshot of a running game.
///
/// ## Tile Architecture
///
/// Two tile sources, composed at query time:
///   - `terrain`: the level as designed (a shared layer stack) or the
///     procedural chunk cache. **Never mutated** during play.
///   - `overlay`: session-local changes (melted boxes, picked-up items,
///     put-tile edits). Cleared on reset.
///
/// All queries go through `LayerLookup` for this struct: overlay first,
/// then terrain. All writes go through `put_tile()`.
///
/// ## Viewport
///
/// `viewport.origin` is the world cell drawn at the top-left of the
/// screen. It only changes through viewport animations and resets.

use std::fmt;
use std::rc::Rc;

use crate::domain::chunk::ChunkCache;
use crate::domain::entity::{Inventory, Player};
use crate::domain::layer::{BusState, DynamicTile, Intent, Layer, LayerLookup, LayerStack, TileResolutionContext};
use crate::domain::physics::TileSource;
use crate::domain::point::{Point, Rect};
use crate::domain::tile::{Bus, Tile};

/// Where the designed world comes from.
#[derive(Clone)]
pub enum Terrain {
    Level(Rc<LayerStack>),
    Procedural(Rc<ChunkCache>),
}

impl LayerLookup for Terrain {
    fn dynamic_at(&self, p: Point) -> Option<DynamicTile> {
        match self {
            Terrain::Level(stack) => stack.dynamic_at(p),
            Terrain::Procedural(cache) => cache.dynamic_at(p),
        }
    }
}

impl PartialEq for Terrain {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Terrain::Level(a), Terrain::Level(b)) => Rc::ptr_eq(a, b) || a == b,
            (Terrain::Procedural(a), Terrain::Procedural(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Terrain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Terrain::Level(stack) => write!(f, "Level({} top entries)", stack.top().len()),
            Terrain::Procedural(cache) => write!(f, "Procedural(seed {})", cache.seed()),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Viewport {
    /// World cell at the top-left corner.
    pub origin: Point,
    /// Visible cells.
    pub size: Point,
    /// Scroll when the player gets this close to an edge.
    pub margin: i32,
}

impl Viewport {
    pub fn new(size: Point, margin: i32) -> Self {
        Viewport { origin: Point::ZERO, size, margin }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.origin, self.size)
    }

    /// Origin that puts `p` in the middle of the view.
    pub fn centered_on(&self, p: Point) -> Point {
        Point::new(p.x - self.size.x / 2, p.y - self.size.y / 2)
    }
}

#[derive(Clone, PartialEq, Debug)]
pub struct GameState {
    pub player: Player,
    pub inventory: Inventory,
    pub last_save: Point,
    /// Completed moves since the last reset; drives timed tiles.
    pub time: u64,
    pub buses: BusState,
    pub viewport: Viewport,
    pub terrain: Terrain,
    pub overlay: Layer,
}

// ── Construction ──

impl GameState {
    pub fn new(terrain: Terrain, spawn: Point, viewport: Viewport) -> Self {
        let mut viewport = viewport;
        viewport.origin = viewport.centered_on(spawn);
        GameState {
            player: Player::new(spawn),
            inventory: Inventory::default(),
            last_save: spawn,
            time: 0,
            buses: BusState::default(),
            viewport,
            terrain,
            overlay: Layer::new(),
        }
    }

    /// Return to the last save point: fresh player, session overlay
    /// dropped, view recentered, clock zeroed.
    pub fn reset_to_save(&mut self) {
        self.player = Player::new(self.last_save);
        self.overlay = Layer::new();
        self.viewport.origin = self.viewport.centered_on(self.last_save);
        self.time = 0;
    }
}

// ── Tile query / mutation API ──

impl GameState {
    pub fn resolution_context(&self, intent: Intent) -> TileResolutionContext<'_> {
        TileResolutionContext {
            time: self.time,
            player_pos: self.player.pos,
            buses: self.buses,
            intent,
            layers: self,
        }
    }

    /// Concrete tile at `p` as gameplay sees it.
    pub fn tile_at(&self, p: Point) -> Tile {
        self.resolution_context(Intent::Play).tile_at(p)
    }

    /// Write into the session overlay.
    pub fn put_tile(&mut self, p: Point, tile: impl Into<DynamicTile>) {
        self.overlay.put(p, tile);
    }

    pub fn set_bus(&mut self, bus: Bus, on: bool) {
        self.buses.set(bus, on);
    }
}

impl LayerLookup for GameState {
    fn dynamic_at(&self, p: Point) -> Option<DynamicTile> {
        match self.overlay.get(p) {
            Some(t) => Some(t.clone()),
            None => self.terrain.dynamic_at(p),
        }
    }
}
