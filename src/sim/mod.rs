/// Time and state: the running game, move animation and playback,
/// levels and saves.

pub mod animation;
pub mod animator;
pub mod event;
pub mod level;
pub mod playback;
pub mod save;
pub mod step;
pub mod world;
