/// Move animator: turns a move into the list of animations that carry it
/// out. Pure: reads the state, never writes it.
///
/// ## Pipeline for a motive move
///
/// 1. Resolve the `Motion` on a pre-move `Board`.
/// 2. Standing on something? Push against the cell below as well.
/// 3. Forced cells become side effects (melt, coin spend).
/// 4. Work out impetus, sprite and death at the destination.
/// 5. Emit the player animation, then pickups at the destination.
/// 6. Scroll the viewport if the destination nears an edge.
///
/// ## Impetus precedence
///
/// ┌──────────────────────────────┬──────────────────────────────────┐
/// │ Situation after the move      │ Impetus                           │
/// ├──────────────────────────────┼──────────────────────────────────┤
/// │ supported                     │ gen_impetus(below) + fruit bonus  │
/// │ Motion sets it                │ that value                        │
/// │ hanging on a wall             │ unchanged                         │
/// │ airborne                      │ previous - 1, floored at 0        │
/// └──────────────────────────────┴──────────────────────────────────┘

use crate::domain::entity::{Move, MotiveMove, Player, Posture, Sprite};
use crate::domain::layer::{Intent, TileResolutionContext};
use crate::domain::physics::{Board, TileSource};
use crate::domain::point::Point;
use crate::domain::rules::resolve_motion;
use crate::domain::tile::{gen_impetus, Tile};

use super::animation::Animation;
use super::world::{GameState, Viewport};

/// Everything a move animates: game state first, then the viewport.
/// A dead player's move is the reset alone; the reset recenters on its own.
pub fn animate(state: &GameState, mv: Move) -> Vec<Animation> {
    let mut anims = animate_move(state, mv);
    if state.player.dead {
        return anims;
    }
    match mv {
        Move::Recenter => anims.extend(animate_recenter(state)),
        _ => {
            let dest = anims.iter().find_map(|a| match a {
                Animation::Player { pos, .. } => Some(*pos),
                _ => None,
            });
            if let Some(dest) = dest {
                anims.extend(animate_viewport(&state.viewport, dest));
            }
        }
    }
    anims
}

/// Game-state animations for `mv`. A dead player can only reset.
pub fn animate_move(state: &GameState, mv: Move) -> Vec<Animation> {
    if state.player.dead {
        return vec![Animation::Reset];
    }
    match mv {
        Move::Reset => vec![Animation::Reset],
        Move::Recenter => Vec::new(),
        Move::Motive(m) => animate_motive(state, m),
    }
}

fn animate_motive(state: &GameState, mv: MotiveMove) -> Vec<Animation> {
    let ctx = state.resolution_context(Intent::Play);
    let player = &state.player;
    let board = Board::new(player, &ctx);

    let motion = resolve_motion(&board, mv);
    let mut forced = motion.forced.clone();
    if board.supported() {
        forced.push(Point::new(0, 1));
    }

    let mut anims = Vec::new();
    let effects = force_blocks(state, &ctx, &forced);

    let dest = player.pos + motion.dpos;
    let below = ctx.tile_at(dest.below());
    let supported_after = !below.is_open();
    let posture = motion.posture.unwrap_or(Posture::Stand);

    let impetus = if supported_after {
        gen_impetus(&below) + state.inventory.extra_impetus()
    } else if let Some(i) = motion.impetus {
        i
    } else if posture == Posture::AttachWall {
        player.impetus
    } else {
        (player.impetus - 1).max(0)
    };

    let dest_tile = ctx.tile_at(dest);
    anims.push(Animation::Player {
        pos: dest,
        anim_state: sprite_for(posture, supported_after, impetus),
        impetus,
        flip_state: mv.flip(player.flip_state),
        posture,
        dead: dest_tile.is_deadly(),
    });
    anims.extend(effects);

    if dest_tile == Tile::SavePoint {
        anims.push(Animation::SavePointChange { pos: dest });
    }
    if let Some(item) = dest_tile.item() {
        anims.push(Animation::ItemGet { pos: dest, item });
    }
    anims
}

/// Side effects of pushing against `forced` (offsets from the player).
/// Each cell acts at most once; coin walls open only while coins last.
fn force_blocks(state: &GameState, ctx: &TileResolutionContext, forced: &[Point]) -> Vec<Animation> {
    let mut out = Vec::new();
    let mut seen: Vec<Point> = Vec::with_capacity(forced.len());
    let mut coins = state.inventory.coins;
    for off in forced {
        if seen.contains(off) {
            continue;
        }
        seen.push(*off);
        let pos = state.player.pos + *off;
        match ctx.tile_at(pos) {
            Tile::FragileBox => out.push(Animation::Melt { pos }),
            Tile::CoinWall if coins > 0 => {
                coins -= 1;
                out.push(Animation::CoinSpend { pos });
            }
            _ => {}
        }
    }
    out
}

pub fn sprite_for(posture: Posture, supported: bool, impetus: i32) -> Sprite {
    match posture {
        Posture::AttachWall => Sprite::PlayerWall,
        Posture::Crouch => Sprite::PlayerCrouch,
        _ if supported => Sprite::Player,
        _ if impetus > 0 => Sprite::PlayerRise,
        _ => Sprite::PlayerFall,
    }
}

// ── Viewport ──

/// Scroll one cell per axis when `dest` comes within the margin of an edge.
pub fn animate_viewport(viewport: &Viewport, dest: Point) -> Vec<Animation> {
    let rel = dest - viewport.origin;
    let dx = scroll_axis(rel.x, viewport.size.x, viewport.margin);
    let dy = scroll_axis(rel.y, viewport.size.y, viewport.margin);
    let mut anims = Vec::new();
    if dx != 0 {
        anims.push(Animation::ViewPort { from: viewport.origin, dpos: Point::new(dx, 0) });
    }
    if dy != 0 {
        anims.push(Animation::ViewPort { from: viewport.origin, dpos: Point::new(0, dy) });
    }
    anims
}

fn scroll_axis(rel: i32, size: i32, margin: i32) -> i32 {
    let margin = margin.min((size - 3) / 2).max(0);
    if rel >= size - 1 - margin {
        1
    } else if rel <= margin {
        -1
    } else {
        0
    }
}

/// Slide the view so the player sits in the middle.
pub fn animate_recenter(state: &GameState) -> Vec<Animation> {
    let vp = &state.viewport;
    let dpos = vp.centered_on(state.player.pos) - vp.origin;
    if dpos == Point::ZERO {
        Vec::new()
    } else {
        vec![Animation::ViewPort { from: vp.origin, dpos }]
    }
}

/// The pose a player would have after `anims` complete, if they move it.
pub fn landing_pose(anims: &[Animation], player: &Player) -> Player {
    let mut p = player.clone();
    for a in anims {
        if let Animation::Player { pos, anim_state, impetus, flip_state, posture, dead } = a {
            p.pos = *pos;
            p.anim_state = *anim_state;
            p.impetus = *impetus;
            p.flip_state = *flip_state;
            p.posture = *posture;
            p.dead = p.dead || *dead;
        }
    }
    p
}
