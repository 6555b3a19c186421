//! Jumpgrid: a deterministic grid puzzle-platformer core.
//!
//! - `domain` holds the pure rules: tiles, layered and procedural
//!   terrain, the player, and move resolution.
//! - `sim` turns moves into animations, plays them frame by frame and
//!   commits the result; it also loads levels and writes layer saves.
//! - `config` reads `config.toml`.
//!
//! The terminal front end lives in the binary.

pub mod config;
pub mod domain;
pub mod sim;

pub use config::GameConfig;
pub use domain::entity::Move;
pub use sim::step::{Advance, Engine, EngineError};
pub use sim::world::GameState;
