/// Player state and the moves that drive it.
/// The player is replaced wholesale by the animation pipeline; nothing
/// else writes to it.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use super::point::Point;
use super::tile::ItemKind;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum FlipState {
    Left,
    #[default]
    Right,
}

/// Physical stance; steers sprite choice and a few rule branches.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Posture {
    #[default]
    Stand,
    AttachWall,
    Crouch,
    Dead,
}

/// Sprite tag drawn for the player.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Sprite {
    #[default]
    Player,
    PlayerRise,
    PlayerFall,
    PlayerWall,
    PlayerCrouch,
}

impl Sprite {
    pub fn name(self) -> &'static str {
        match self {
            Sprite::Player => "player",
            Sprite::PlayerRise => "player_rise",
            Sprite::PlayerFall => "player_fall",
            Sprite::PlayerWall => "player_wall",
            Sprite::PlayerCrouch => "player_crouch",
        }
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Player {
    pub pos: Point,
    /// Stored vertical energy. Never negative.
    pub impetus: i32,
    pub flip_state: FlipState,
    pub anim_state: Sprite,
    pub posture: Posture,
    pub dead: bool,
}

impl Player {
    pub fn new(pos: Point) -> Self {
        Player {
            pos,
            impetus: 0,
            flip_state: FlipState::Right,
            anim_state: Sprite::Player,
            posture: Posture::Stand,
            dead: false,
        }
    }

    pub fn with_impetus(mut self, impetus: i32) -> Self {
        self.impetus = impetus;
        self
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Inventory {
    pub coins: u32,
    pub impetus_fruit: bool,
}

impl Inventory {
    /// Bonus added to every landing impetus.
    pub fn extra_impetus(&self) -> i32 {
        if self.impetus_fruit { 1 } else { 0 }
    }

    pub fn add(&mut self, item: ItemKind) {
        match item {
            ItemKind::Coin => self.coins += 1,
            ItemKind::ImpetusFruit => self.impetus_fruit = true,
        }
    }
}

// ── Moves ──

/// Moves that go through the physics rules.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum MotiveMove {
    Up,
    Down,
    Left,
    Right,
    UpLeft,
    UpRight,
}

impl MotiveMove {
    pub const ALL: [MotiveMove; 6] = [
        MotiveMove::Up, MotiveMove::Down, MotiveMove::Left,
        MotiveMove::Right, MotiveMove::UpLeft, MotiveMove::UpRight,
    ];

    /// Horizontal component, if any.
    pub fn dx(self) -> i32 {
        match self {
            MotiveMove::Left | MotiveMove::UpLeft => -1,
            MotiveMove::Right | MotiveMove::UpRight => 1,
            MotiveMove::Up | MotiveMove::Down => 0,
        }
    }

    /// Facing after this move, or `current` for pure vertical moves.
    pub fn flip(self, current: FlipState) -> FlipState {
        match self.dx() {
            d if d < 0 => FlipState::Left,
            d if d > 0 => FlipState::Right,
            _ => current,
        }
    }
}

/// Everything the input collaborator may request.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Move {
    Motive(MotiveMove),
    Reset,
    Recenter,
}

impl Move {
    pub const UP: Move = Move::Motive(MotiveMove::Up);
    pub const DOWN: Move = Move::Motive(MotiveMove::Down);
    pub const LEFT: Move = Move::Motive(MotiveMove::Left);
    pub const RIGHT: Move = Move::Motive(MotiveMove::Right);
    pub const UP_LEFT: Move = Move::Motive(MotiveMove::UpLeft);
    pub const UP_RIGHT: Move = Move::Motive(MotiveMove::UpRight);
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown move {0:?}")]
pub struct MoveParseError(pub String);

impl FromStr for Move {
    type Err = MoveParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "up" => Move::UP,
            "down" => Move::DOWN,
            "left" => Move::LEFT,
            "right" => Move::RIGHT,
            "up-left" => Move::UP_LEFT,
            "up-right" => Move::UP_RIGHT,
            "reset" => Move::Reset,
            "recenter" => Move::Recenter,
            other => return Err(MoveParseError(other.to_string())),
        })
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Move::Motive(MotiveMove::Up) => "up",
            Move::Motive(MotiveMove::Down) => "down",
            Move::Motive(MotiveMove::Left) => "left",
            Move::Motive(MotiveMove::Right) => "right",
            Move::Motive(MotiveMove::UpLeft) => "up-left",
            Move::Motive(MotiveMove::UpRight) => "up-right",
            Move::Reset => "reset",
            Move::Recenter => "recenter",
        };
        f.pad(s)
    }
}
