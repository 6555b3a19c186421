/// Animation player: folds a group of animations into a state at a
/// point in time.
///
/// `apply` never touches its input. The result is a `Frame`: the state as
/// it stands at that instant plus the fractional positions a renderer
/// needs for smooth motion. At `AnimTime::Complete` the frame's state is
/// the committed outcome of the move, and applying the same group to that
/// outcome again changes nothing.
///
/// ### Thresholds
/// ┌──────────────────┬────────────────────────────────────────────┐
/// │ Animation         │ Takes effect                                │
/// ├──────────────────┼────────────────────────────────────────────┤
/// │ Player            │ pose at once, death at t ≥ 0.75, cell at 1  │
/// │ ViewPort          │ continuous                                  │
/// │ Melt              │ broken box until 0.5, then empty            │
/// │ SavePointChange   │ t > 0.5                                     │
/// │ CoinSpend         │ t > 0.5, if the wall is still there         │
/// │ ItemGet           │ t > 0.5, if the item is still there         │
/// │ Reset             │ t ≥ 1/3 (darkest point)                     │
/// └──────────────────┴────────────────────────────────────────────┘

use crate::domain::entity::Posture;
use crate::domain::point::FPoint;
use crate::domain::tile::Tile;

use super::animation::Animation;
use super::world::GameState;

pub const DEATH_AT: f32 = 0.75;
pub const EFFECT_AT: f32 = 0.5;
pub const RESET_AT: f32 = 1.0 / 3.0;

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum AnimTime {
    Frac(f32),
    Complete,
}

impl AnimTime {
    /// Fraction of `frame` through an animation `duration` frames long.
    pub fn at_frame(frame: u32, duration: u32) -> Self {
        if duration == 0 || frame >= duration {
            AnimTime::Complete
        } else {
            AnimTime::Frac(frame as f32 / duration as f32)
        }
    }

    pub fn t(self) -> f32 {
        match self {
            AnimTime::Frac(t) => t.clamp(0.0, 1.0),
            AnimTime::Complete => 1.0,
        }
    }
}

/// One drawable instant.
#[derive(Clone, PartialEq, Debug)]
pub struct Frame {
    pub state: GameState,
    pub player_pos: FPoint,
    pub viewport: FPoint,
    /// 0 = fully visible, 1 = black.
    pub blackout: f32,
}

impl Frame {
    /// A frame with nothing in motion.
    pub fn still(state: GameState) -> Self {
        Frame {
            player_pos: FPoint::from(state.player.pos),
            viewport: FPoint::from(state.viewport.origin),
            blackout: 0.0,
            state,
        }
    }
}

/// Every animation at the same time.
pub fn apply(state: &GameState, anims: &[Animation], time: AnimTime) -> Frame {
    fold(state, anims, |_| time)
}

/// Every animation at its own fraction of a shared frame counter.
pub fn apply_at_frame(state: &GameState, anims: &[Animation], frame: u32) -> Frame {
    fold(state, anims, |a| AnimTime::at_frame(frame, a.duration()))
}

/// The committed outcome of a move.
pub fn complete(state: &GameState, anims: &[Animation]) -> GameState {
    apply(state, anims, AnimTime::Complete).state
}

fn fold(base: &GameState, anims: &[Animation], time_of: impl Fn(&Animation) -> AnimTime) -> Frame {
    let mut frame = Frame::still(base.clone());
    for anim in anims {
        let t = time_of(anim).t();
        apply_one(&mut frame, base, anim, t);
    }
    frame
}

fn apply_one(frame: &mut Frame, base: &GameState, anim: &Animation, t: f32) {
    let s = &mut frame.state;
    match anim {
        Animation::Player { pos, anim_state, impetus, flip_state, posture, dead } => {
            frame.player_pos = FPoint::lerp(base.player.pos, *pos, t);
            s.player.anim_state = *anim_state;
            s.player.impetus = *impetus;
            s.player.flip_state = *flip_state;
            s.player.posture = *posture;
            if *dead && t >= DEATH_AT {
                s.player.dead = true;
                s.player.posture = Posture::Dead;
            }
            if t >= 1.0 {
                s.player.pos = *pos;
            }
        }
        Animation::ViewPort { from, dpos } => {
            if dpos.x != 0 {
                frame.viewport.x = from.x as f32 + dpos.x as f32 * t;
            }
            if dpos.y != 0 {
                frame.viewport.y = from.y as f32 + dpos.y as f32 * t;
            }
            if t >= 1.0 {
                let to = *from + *dpos;
                if dpos.x != 0 {
                    s.viewport.origin.x = to.x;
                }
                if dpos.y != 0 {
                    s.viewport.origin.y = to.y;
                }
            }
        }
        Animation::Melt { pos } => {
            let tile = if t > EFFECT_AT { Tile::Empty } else { Tile::BrokenBox };
            s.put_tile(*pos, tile);
        }
        Animation::SavePointChange { pos } => {
            if t > EFFECT_AT {
                s.last_save = *pos;
            }
        }
        Animation::CoinSpend { pos } => {
            if t > EFFECT_AT && s.inventory.coins > 0 && s.tile_at(*pos) == Tile::CoinWall {
                s.put_tile(*pos, Tile::Empty);
                s.inventory.coins -= 1;
            }
        }
        Animation::ItemGet { pos, item } => {
            if t > EFFECT_AT && s.tile_at(*pos).item() == Some(*item) {
                s.put_tile(*pos, Tile::Empty);
                s.inventory.add(*item);
            }
        }
        Animation::Reset => {
            frame.blackout = blackout(t);
            if t >= RESET_AT {
                s.reset_to_save();
                frame.player_pos = FPoint::from(s.player.pos);
                frame.viewport = FPoint::from(s.viewport.origin);
            }
        }
    }
}

/// Up over the first third, held, down over the last third.
fn blackout(t: f32) -> f32 {
    if t < RESET_AT {
        t * 3.0
    } else if t < 2.0 * RESET_AT {
        1.0
    } else {
        ((1.0 - t) * 3.0).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    use crate::domain::entity::{FlipState, Move, Sprite};
    use crate::domain::layer::LayerStack;
    use crate::domain::physics::tests::Diagram;
    use crate::domain::point::Point;
    use crate::domain::tile::ItemKind;
    use crate::sim::animator::animate;
    use crate::sim::world::{Terrain, Viewport};

    fn state(rows: &[&str]) -> GameState {
        let layer = Diagram::parse(rows).into_layer();
        let terrain = Terrain::Level(Rc::new(LayerStack::base(layer)));
        GameState::new(terrain, Point::ZERO, Viewport::new(Point::new(9, 7), 1))
    }

    fn pt(x: i32, y: i32) -> Point {
        Point::new(x, y)
    }

    fn walk_right() -> Animation {
        Animation::Player {
            pos: pt(1, 0),
            anim_state: Sprite::Player,
            impetus: 4,
            flip_state: FlipState::Right,
            posture: Posture::Stand,
            dead: false,
        }
    }

    #[test]
    fn player_interpolates_then_snaps() {
        let s = state(&["@ ", "##"]);
        let half = apply(&s, &[walk_right()], AnimTime::Frac(0.5));
        assert_eq!(half.player_pos, FPoint { x: 0.5, y: 0.0 });
        assert_eq!(half.state.player.pos, Point::ZERO);
        assert_eq!(half.state.player.impetus, 4);

        let done = apply(&s, &[walk_right()], AnimTime::Complete);
        assert_eq!(done.state.player.pos, pt(1, 0));
        assert_eq!(done.player_pos, FPoint { x: 1.0, y: 0.0 });
    }

    #[test]
    fn death_lands_late() {
        let s = state(&["@"]);
        let die = Animation::Player {
            pos: pt(0, 1),
            anim_state: Sprite::PlayerFall,
            impetus: 0,
            flip_state: FlipState::Right,
            posture: Posture::Stand,
            dead: true,
        };
        assert!(!apply(&s, &[die.clone()], AnimTime::Frac(0.5)).state.player.dead);
        let late = apply(&s, &[die], AnimTime::Frac(0.75)).state;
        assert!(late.player.dead);
        assert_eq!(late.player.posture, Posture::Dead);
    }

    #[test]
    fn melt_shows_broken_box_first() {
        let s = state(&["@", "%"]);
        let melt = [Animation::Melt { pos: pt(0, 1) }];
        assert_eq!(apply(&s, &melt, AnimTime::Frac(0.25)).state.tile_at(pt(0, 1)), Tile::BrokenBox);
        assert_eq!(apply(&s, &melt, AnimTime::Frac(0.75)).state.tile_at(pt(0, 1)), Tile::Empty);
        assert_eq!(s.tile_at(pt(0, 1)), Tile::FragileBox);
    }

    #[test]
    fn item_is_collected_once() {
        let s = state(&["@o", "##"]);
        let get = [Animation::ItemGet { pos: pt(1, 0), item: ItemKind::Coin }];
        let once = complete(&s, &get);
        assert_eq!(once.inventory.coins, 1);
        assert_eq!(once.tile_at(pt(1, 0)), Tile::Empty);
        assert_eq!(complete(&once, &get), once);
    }

    #[test]
    fn coin_spend_needs_a_coin_and_a_wall() {
        let mut s = state(&["@$"]);
        let spend = [Animation::CoinSpend { pos: pt(1, 0) }];
        assert_eq!(complete(&s, &spend), s);
        s.inventory.coins = 2;
        let spent = complete(&s, &spend);
        assert_eq!(spent.inventory.coins, 1);
        assert_eq!(spent.tile_at(pt(1, 0)), Tile::Empty);
        assert_eq!(complete(&spent, &spend), spent);
    }

    #[test]
    fn viewport_moves_only_its_own_axis() {
        let s = state(&["@"]);
        let from = s.viewport.origin;
        let scroll = [Animation::ViewPort { from, dpos: pt(0, 1) }];
        let half = apply(&s, &scroll, AnimTime::Frac(0.5));
        assert_eq!(half.viewport.x, from.x as f32);
        assert_eq!(half.viewport.y, from.y as f32 + 0.5);
        assert_eq!(complete(&s, &scroll).viewport.origin, from + pt(0, 1));
    }

    #[test]
    fn reset_happens_at_darkest_point() {
        let mut s = state(&["@"]);
        s.last_save = pt(2, 2);
        s.player.pos = pt(5, 5);
        s.time = 9;
        let early = apply(&s, &[Animation::Reset], AnimTime::Frac(0.2));
        assert_eq!(early.state.player.pos, pt(5, 5));
        assert!(early.blackout > 0.5 && early.blackout < 0.7);

        let dark = apply(&s, &[Animation::Reset], AnimTime::Frac(0.5));
        assert_eq!(dark.blackout, 1.0);
        assert_eq!(dark.state.player.pos, pt(2, 2));
        assert_eq!(dark.state.time, 0);

        let done = apply(&s, &[Animation::Reset], AnimTime::Complete);
        assert_eq!(done.blackout, 0.0);
    }

    #[test]
    fn per_animation_fractions() {
        // A 4-frame walk is finished while a 6-frame melt is still going.
        let s = state(&["@ ", "%#"]);
        let anims = [walk_right(), Animation::Melt { pos: pt(0, 1) }];
        let f = apply_at_frame(&s, &anims, 4);
        assert_eq!(f.state.player.pos, pt(1, 0));
        assert_eq!(f.state.tile_at(pt(0, 1)), Tile::Empty);
        let f = apply_at_frame(&s, &anims, 2);
        assert_eq!(f.state.tile_at(pt(0, 1)), Tile::BrokenBox);
    }

    #[test]
    fn complete_move_is_idempotent() {
        let s = state(&["  o", "@  ", "%##"]);
        let anims = animate(&s, Move::RIGHT);
        let once = complete(&s, &anims);
        assert_eq!(complete(&once, &anims), once);
    }

    #[test]
    fn blackout_curve() {
        assert_eq!(blackout(0.0), 0.0);
        assert_eq!(blackout(0.5), 1.0);
        assert_eq!(blackout(1.0), 0.0);
    }
}
