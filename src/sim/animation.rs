/// Animation: one visual/state transition of a move.
///
/// A move produces a list of these; they all play concurrently and the
/// move lasts as long as the longest one. Each variant knows its own
/// length in frames. How a variant changes the state at a given fraction
/// lives in `playback`.

use crate::domain::entity::{FlipState, Posture, Sprite};
use crate::domain::point::Point;
use crate::domain::tile::ItemKind;

// ── Frame counts ──

pub const PLAYER_FRAMES: u32 = 4;
pub const VIEWPORT_FRAMES: u32 = 4;
pub const MELT_FRAMES: u32 = 6;
pub const SAVE_POINT_FRAMES: u32 = 4;
pub const COIN_FRAMES: u32 = 6;
pub const ITEM_FRAMES: u32 = 4;
pub const RESET_FRAMES: u32 = 24;

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Animation {
    /// Move the player to `pos` and take on the given pose.
    Player {
        pos: Point,
        anim_state: Sprite,
        impetus: i32,
        flip_state: FlipState,
        posture: Posture,
        dead: bool,
    },
    /// Scroll the viewport from `from` by `dpos` (one axis per animation,
    /// both for a recenter).
    ViewPort { from: Point, dpos: Point },
    /// A fragile box crumbles.
    Melt { pos: Point },
    SavePointChange { pos: Point },
    /// A coin wall opens for one coin.
    CoinSpend { pos: Point },
    ItemGet { pos: Point, item: ItemKind },
    /// Fade out, return to the last save point, fade in.
    Reset,
}

impl Animation {
    pub fn duration(&self) -> u32 {
        match self {
            Animation::Player { .. } => PLAYER_FRAMES,
            Animation::ViewPort { .. } => VIEWPORT_FRAMES,
            Animation::Melt { .. } => MELT_FRAMES,
            Animation::SavePointChange { .. } => SAVE_POINT_FRAMES,
            Animation::CoinSpend { .. } => COIN_FRAMES,
            Animation::ItemGet { .. } => ITEM_FRAMES,
            Animation::Reset => RESET_FRAMES,
        }
    }

    /// Short tag for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Animation::Player { .. } => "player",
            Animation::ViewPort { .. } => "viewport",
            Animation::Melt { .. } => "melt",
            Animation::SavePointChange { .. } => "save_point",
            Animation::CoinSpend { .. } => "coin_spend",
            Animation::ItemGet { .. } => "item_get",
            Animation::Reset => "reset",
        }
    }
}

/// Length of a concurrent group: the longest member, 0 when empty.
pub fn total_duration(anims: &[Animation]) -> u32 {
    anims.iter().map(Animation::duration).max().unwrap_or(0)
}
