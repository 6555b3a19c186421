/// Events reported when a move commits.
/// The front end consumes these for status lines and logs.

use crate::domain::point::Point;
use crate::domain::tile::ItemKind;

use super::animation::Animation;
use super::world::GameState;

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum GameEvent {
    PlayerDied { pos: Point },
    SavePointReached { pos: Point },
    ItemCollected { pos: Point, item: ItemKind },
    BlockMelted { pos: Point },
    CoinSpent { pos: Point },
    LevelReset,
}

/// What a committed group of animations did, judged by comparing the
/// states on either side of it.
pub fn events_for(anims: &[Animation], before: &GameState, after: &GameState) -> Vec<GameEvent> {
    let mut events = Vec::new();
    for anim in anims {
        match anim {
            Animation::Player { pos, dead: true, .. } if !before.player.dead && after.player.dead => {
                events.push(GameEvent::PlayerDied { pos: *pos });
            }
            Animation::SavePointChange { pos } if before.last_save != *pos => {
                events.push(GameEvent::SavePointReached { pos: *pos });
            }
            Animation::ItemGet { pos, item } if before.tile_at(*pos) != after.tile_at(*pos) => {
                events.push(GameEvent::ItemCollected { pos: *pos, item: *item });
            }
            Animation::Melt { pos } => events.push(GameEvent::BlockMelted { pos: *pos }),
            Animation::CoinSpend { pos } if after.inventory.coins < before.inventory.coins => {
                events.push(GameEvent::CoinSpent { pos: *pos });
            }
            Animation::Reset => events.push(GameEvent::LevelReset),
            _ => {}
        }
    }
    events
}
