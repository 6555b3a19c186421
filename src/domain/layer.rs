/// Layers, layer stacks, and dynamic tile resolution.
///
/// ## Storage
///
/// A `Layer` is a sparse map from grid point to `DynamicTile`. A missing
/// entry means `Empty`; absence is meaningful, never an error.
///
/// A `LayerStack` is either a single base layer or an overlay sitting on
/// top of a shared (reference-counted) rest-of-stack. Lookups take the
/// topmost entry. Writes only ever touch the topmost layer, so a level's
/// designed data can be shared by any number of play sessions.
///
/// ## Resolution
///
/// Stored tiles are *intensions*. `TileResolutionContext` turns them into
/// the concrete `Tile` the physics sees:
///
/// ```text
///   Static(t)              → t
///   Timed(phase,on,off)    → TimedWall while (time+phase) mod (on+off) < on,
///                            Empty otherwise, Empty under the player
///   Buttoned(source)       → ButtonedWall iff tile at source == ButtonOn
///   BusBlock(bus)          → BusBlock{bus, on = bus state}
///   BusButton(bus)         → BusButton{bus, on = bus state}
/// ```
///
/// Under `Intent::Edit` every dynamic tile shows its "present" form.

use std::collections::BTreeMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use super::physics::TileSource;
use super::point::Point;
use super::tile::{Bus, Tile};

/// Longest button-to-button chain followed before giving up.
const MAX_BUTTON_DEPTH: u32 = 16;

#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DynamicTile {
    Static { tile: Tile },
    Timed { phase: u32, on_for: u32, off_for: u32 },
    Buttoned { source: Point },
    BusBlock { bus: Bus },
    BusButton { bus: Bus },
}

impl DynamicTile {
    pub fn is_static_empty(&self) -> bool {
        matches!(self, DynamicTile::Static { tile: Tile::Empty })
    }
}

impl From<Tile> for DynamicTile {
    fn from(tile: Tile) -> Self {
        DynamicTile::Static { tile }
    }
}

/// On/off state for every bus.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct BusState([bool; 3]);

impl BusState {
    pub fn is_on(&self, bus: Bus) -> bool {
        self.0[bus.index()]
    }

    pub fn set(&mut self, bus: Bus, on: bool) {
        self.0[bus.index()] = on;
    }
}

// ══════════════════════════════════════════════════════════════
// Layer
// ══════════════════════════════════════════════════════════════

#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct Layer {
    tiles: BTreeMap<Point, DynamicTile>,
}

impl Layer {
    pub fn new() -> Self {
        Layer::default()
    }

    pub fn get(&self, p: Point) -> Option<&DynamicTile> {
        self.tiles.get(&p)
    }

    /// Overwrite the entry at `p`. Entries are never removed; writing
    /// `Empty` records an explicit hole that masks lower layers.
    pub fn put(&mut self, p: Point, tile: impl Into<DynamicTile>) {
        self.tiles.insert(p, tile.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (Point, &DynamicTile)> {
        self.tiles.iter().map(|(p, t)| (*p, t))
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}

// ══════════════════════════════════════════════════════════════
// LayerStack
// ══════════════════════════════════════════════════════════════

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum LayerStack {
    Base(Layer),
    Overlay { top: Layer, rest: Rc<LayerStack> },
}

impl LayerStack {
    pub fn base(layer: Layer) -> Self {
        LayerStack::Base(layer)
    }

    /// Put an empty overlay over `rest`.
    pub fn over(rest: Rc<LayerStack>) -> Self {
        LayerStack::Overlay { top: Layer::new(), rest }
    }

    pub fn get(&self, p: Point) -> Option<&DynamicTile> {
        match self {
            LayerStack::Base(layer) => layer.get(p),
            LayerStack::Overlay { top, rest } => top.get(p).or_else(|| rest.get(p)),
        }
    }

    pub fn top(&self) -> &Layer {
        match self {
            LayerStack::Base(layer) => layer,
            LayerStack::Overlay { top, .. } => top,
        }
    }

    /// Write into the topmost layer only.
    pub fn put(&mut self, p: Point, tile: impl Into<DynamicTile>) {
        match self {
            LayerStack::Base(layer) => layer.put(p, tile),
            LayerStack::Overlay { top, .. } => top.put(p, tile),
        }
    }

    /// Collapse the stack into one layer, upper entries winning.
    pub fn flatten(&self) -> Layer {
        match self {
            LayerStack::Base(layer) => layer.clone(),
            LayerStack::Overlay { top, rest } => {
                let mut flat = rest.flatten();
                for (p, t) in top.iter() {
                    flat.put(p, t.clone());
                }
                flat
            }
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Lookup capability
// ══════════════════════════════════════════════════════════════

/// Anything that stores dynamic tiles by point.
pub trait LayerLookup {
    fn dynamic_at(&self, p: Point) -> Option<DynamicTile>;
}

impl LayerLookup for Layer {
    fn dynamic_at(&self, p: Point) -> Option<DynamicTile> {
        self.get(p).cloned()
    }
}

impl LayerLookup for LayerStack {
    fn dynamic_at(&self, p: Point) -> Option<DynamicTile> {
        self.get(p).cloned()
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Intent {
    #[default]
    Play,
    /// Editor preview: dynamic tiles always show as present.
    Edit,
}

/// Everything dynamic tiles may depend on.
pub struct TileResolutionContext<'a> {
    pub time: u64,
    pub player_pos: Point,
    pub buses: BusState,
    pub intent: Intent,
    pub layers: &'a dyn LayerLookup,
}

impl<'a> TileResolutionContext<'a> {
    pub fn resolve(&self, tile: &DynamicTile, at: Point) -> Tile {
        self.resolve_depth(tile, at, 0)
    }

    fn resolve_at(&self, at: Point, depth: u32) -> Tile {
        match self.layers.dynamic_at(at) {
            Some(t) => self.resolve_depth(&t, at, depth),
            None => Tile::Empty,
        }
    }

    fn resolve_depth(&self, tile: &DynamicTile, at: Point, depth: u32) -> Tile {
        let edit = self.intent == Intent::Edit;
        match tile {
            DynamicTile::Static { tile } => tile.clone(),
            DynamicTile::Timed { phase, on_for, off_for } => {
                if edit {
                    return Tile::TimedWall;
                }
                // The wall never closes on the player.
                if at == self.player_pos {
                    return Tile::Empty;
                }
                let cycle = u64::from(*on_for) + u64::from(*off_for);
                if cycle == 0 {
                    return Tile::Empty;
                }
                if (self.time + u64::from(*phase)) % cycle < u64::from(*on_for) {
                    Tile::TimedWall
                } else {
                    Tile::Empty
                }
            }
            DynamicTile::Buttoned { source } => {
                if edit {
                    return Tile::ButtonedWall;
                }
                if depth >= MAX_BUTTON_DEPTH {
                    return Tile::Empty;
                }
                if self.resolve_at(*source, depth + 1) == Tile::ButtonOn {
                    Tile::ButtonedWall
                } else {
                    Tile::Empty
                }
            }
            DynamicTile::BusBlock { bus } => Tile::BusBlock {
                bus: *bus,
                on: edit || self.buses.is_on(*bus),
            },
            DynamicTile::BusButton { bus } => Tile::BusButton {
                bus: *bus,
                on: edit || self.buses.is_on(*bus),
            },
        }
    }
}

impl TileSource for TileResolutionContext<'_> {
    fn tile_at(&self, p: Point) -> Tile {
        self.resolve_at(p, 0)
    }
}
