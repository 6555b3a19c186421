/// Pure game rules: tiles, layers, the player, and move resolution.
/// Nothing in here knows about frames, timers, or the terminal.

pub mod chunk;
pub mod entity;
pub mod layer;
pub mod physics;
pub mod point;
pub mod rules;
pub mod tile;
