/// Tile kinds and their properties.
/// Properties are queried via methods, not stored as flags,
/// so tile semantics are centralized here.

use serde::{Deserialize, Serialize};

/// Jump energy granted by landing on an ordinary solid tile.
pub const FULL_IMPETUS: i32 = 4;

/// Jump energy granted by landing on an `UpBox`.
pub const UP_BOX_IMPETUS: i32 = 6;

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dir {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Coin,
    /// Held fruit: +1 impetus on every landing.
    ImpetusFruit,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bus {
    Red,
    Green,
    Blue,
}

impl Bus {
    pub const ALL: [Bus; 3] = [Bus::Red, Bus::Green, Bus::Blue];

    pub fn index(self) -> usize {
        match self {
            Bus::Red => 0,
            Bus::Green => 1,
            Bus::Blue => 2,
        }
    }
}

#[derive(Clone, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum Tile {
    #[default]
    Empty,
    Box,
    Box3,
    FragileBox,    // Melts when forced
    BrokenBox,     // Mid-melt visual
    UpBox,         // Extra-high jump when landed on
    Spike { dir: Dir },
    Item { kind: ItemKind },
    SavePoint,
    GripWall,      // Can be clung to from the side
    CoinWall,      // Opens for one coin
    ButtonOn,
    ButtonOff,
    TimedWall,
    ButtonedWall,
    BusBlock { bus: Bus, on: bool },
    BusButton { bus: Bus, on: bool },
    MotionBlock { bus: Bus, on: bool },
    Door { dest: String },
    Ladder,
}

impl Tile {
    /// Can the player occupy this cell?
    pub fn is_open(&self) -> bool {
        match self {
            Tile::Empty
            | Tile::SavePoint
            | Tile::Item { .. }
            | Tile::Spike { .. }
            | Tile::Door { .. }
            | Tile::Ladder => true,
            Tile::BusBlock { on, .. } | Tile::MotionBlock { on, .. } => !on,
            _ => false,
        }
    }

    /// Can the player cling to this tile from the side?
    pub fn is_grabbable(&self) -> bool {
        matches!(self, Tile::GripWall)
    }

    /// Does entering this cell kill the player?
    pub fn is_deadly(&self) -> bool {
        matches!(self, Tile::Spike { .. })
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Tile::Empty)
    }

    /// The collectible held by this cell, if any.
    pub fn item(&self) -> Option<ItemKind> {
        match self {
            Tile::Item { kind } => Some(*kind),
            _ => None,
        }
    }
}

/// Impetus a player receives when standing on `tile`.
pub fn gen_impetus(tile: &Tile) -> i32 {
    match tile {
        Tile::UpBox => UP_BOX_IMPETUS,
        Tile::Empty => 0,
        _ => FULL_IMPETUS,
    }
}
