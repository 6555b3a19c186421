/// Engine: owns the authoritative state and plays moves out frame by frame.
///
/// Lifecycle of a move:
///   1. `begin(mv)` asks the animator for the move's animations.
///   2. `next_frame()` advances a shared frame counter; each animation sees
///      its own fraction `min(1, frame / duration)`.
///   3. When the longest animation finishes, the complete state is
///      committed, elapsed time ticks (motive moves only), the revision
///      counter bumps if anything changed, and events are reported.
///
/// While a move is in flight the committed state is untouched; renderers
/// read `frame()` for the in-between picture. Only one move at a time:
/// `begin` while animating is `EngineError::Busy`.

use thiserror::Error;
use tracing::{debug, error};

use crate::config::DebugConfig;
use crate::domain::entity::Move;
use crate::domain::layer::DynamicTile;
use crate::domain::point::Point;
use crate::domain::tile::Bus;

use super::animation::{total_duration, Animation};
use super::animator::animate;
use super::event::{events_for, GameEvent};
use super::playback::{apply_at_frame, complete, Frame};
use super::world::{GameState, Terrain};

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum EngineError {
    #[error("a move is still animating")]
    Busy,
    #[error("no animation is active")]
    NoActiveAnimation,
}

/// Outcome of pushing the clock forward.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Advance {
    Playing,
    Finished(Vec<GameEvent>),
}

struct ActiveMove {
    mv: Move,
    animations: Vec<Animation>,
    frame: u32,
    duration: u32,
}

pub struct Engine {
    state: GameState,
    frame: Frame,
    active: Option<ActiveMove>,
    revision: u64,
    debug: DebugConfig,
}

// ══════════════════════════════════════════════════════════════
// Read-only accessors
// ══════════════════════════════════════════════════════════════

impl Engine {
    pub fn new(state: GameState, debug: DebugConfig) -> Self {
        Engine {
            frame: Frame::still(state.clone()),
            state,
            active: None,
            revision: 0,
            debug,
        }
    }

    /// Last committed state.
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// What to draw right now.
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    /// Bumps whenever the committed state changes.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_animating(&self) -> bool {
        self.active.is_some()
    }
}

// ══════════════════════════════════════════════════════════════
// Move playback
// ══════════════════════════════════════════════════════════════

impl Engine {
    pub fn begin(&mut self, mv: Move) -> Result<Advance, EngineError> {
        if self.active.is_some() {
            return Err(EngineError::Busy);
        }
        let animations = animate(&self.state, mv);
        let duration = total_duration(&animations);
        if self.debug.log_moves {
            debug!(%mv, pos = %self.state.player.pos, impetus = self.state.player.impetus, frames = duration, "move begins");
        }
        if self.debug.log_animations {
            for a in &animations {
                debug!(anim = a.name(), frames = a.duration(), "animation queued");
            }
        }

        let active = ActiveMove { mv, animations, frame: 0, duration };
        if duration == 0 {
            return Ok(Advance::Finished(self.commit(active)));
        }
        self.active = Some(active);
        Ok(Advance::Playing)
    }

    pub fn next_frame(&mut self) -> Result<Advance, EngineError> {
        let Some(active) = self.active.as_mut() else {
            error!("next_frame called with no active animation");
            return Err(EngineError::NoActiveAnimation);
        };
        active.frame += 1;
        if active.frame < active.duration {
            self.frame = apply_at_frame(&self.state, &active.animations, active.frame);
            return Ok(Advance::Playing);
        }
        match self.active.take() {
            Some(active) => Ok(Advance::Finished(self.commit(active))),
            None => Err(EngineError::NoActiveAnimation),
        }
    }

    /// Begin `mv` and run it to the end without drawing.
    pub fn play_out(&mut self, mv: Move) -> Result<Vec<GameEvent>, EngineError> {
        let mut advance = self.begin(mv)?;
        loop {
            match advance {
                Advance::Finished(events) => return Ok(events),
                Advance::Playing => advance = self.next_frame()?,
            }
        }
    }

    fn commit(&mut self, active: ActiveMove) -> Vec<GameEvent> {
        let mut next = complete(&self.state, &active.animations);
        let reset = active.animations.contains(&Animation::Reset);
        if matches!(active.mv, Move::Motive(_)) && !reset {
            next.time += 1;
        }
        let events = events_for(&active.animations, &self.state, &next);

        if let Terrain::Procedural(cache) = &next.terrain {
            cache.retain_visible(next.viewport.rect());
        }
        if self.debug.log_moves {
            debug!(mv = %active.mv, pos = %next.player.pos, impetus = next.player.impetus, time = next.time, "move committed");
        }
        for e in &events {
            debug!(event = ?e, "game event");
        }
        self.replace_state(next);
        events
    }

    fn replace_state(&mut self, next: GameState) {
        if next != self.state {
            self.revision += 1;
        }
        self.frame = Frame::still(next.clone());
        self.state = next;
    }
}

// ══════════════════════════════════════════════════════════════
// Direct edits (editor / scripting)
// ══════════════════════════════════════════════════════════════

impl Engine {
    pub fn put_tile(&mut self, p: Point, tile: impl Into<DynamicTile>) -> Result<(), EngineError> {
        if self.active.is_some() {
            return Err(EngineError::Busy);
        }
        let mut next = self.state.clone();
        next.put_tile(p, tile);
        self.replace_state(next);
        Ok(())
    }

    pub fn set_bus(&mut self, bus: Bus, on: bool) -> Result<(), EngineError> {
        if self.active.is_some() {
            return Err(EngineError::Busy);
        }
        let mut next = self.state.clone();
        next.set_bus(bus, on);
        self.replace_state(next);
        Ok(())
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    use proptest::prelude::*;

    use crate::domain::chunk::ChunkCache;
    use crate::domain::layer::LayerStack;
    use crate::domain::physics::tests::Diagram;
    use crate::domain::tile::{Tile, FULL_IMPETUS};
    use crate::sim::animation::{PLAYER_FRAMES, RESET_FRAMES};
    use crate::sim::animator::animate;
    use crate::sim::world::Viewport;

    fn state(rows: &[&str]) -> GameState {
        let layer = Diagram::parse(rows).into_layer();
        let terrain = Terrain::Level(Rc::new(LayerStack::base(layer)));
        GameState::new(terrain, Point::ZERO, Viewport::new(Point::new(15, 11), 1))
    }

    fn engine(rows: &[&str]) -> Engine {
        Engine::new(state(rows), DebugConfig::default())
    }

    #[test]
    fn move_plays_over_frames_then_commits() {
        let mut e = engine(&["@ ", "##"]);
        assert_eq!(e.begin(Move::RIGHT), Ok(Advance::Playing));
        assert!(e.is_animating());
        for _ in 1..PLAYER_FRAMES {
            assert_eq!(e.next_frame(), Ok(Advance::Playing));
            assert_eq!(e.state().player.pos, Point::ZERO);
        }
        assert_eq!(e.next_frame(), Ok(Advance::Finished(vec![])));
        assert!(!e.is_animating());
        assert_eq!(e.state().player.pos, Point::new(1, 0));
        assert_eq!(e.state().time, 1);
        assert_eq!(e.revision(), 1);
    }

    #[test]
    fn frame_shows_partial_motion() {
        let mut e = engine(&["@ ", "##"]);
        e.begin(Move::RIGHT).unwrap();
        e.next_frame().unwrap();
        assert_eq!(e.frame().player_pos.x, 1.0 / PLAYER_FRAMES as f32);
    }

    #[test]
    fn busy_while_animating() {
        let mut e = engine(&["@"]);
        e.begin(Move::DOWN).unwrap();
        assert_eq!(e.begin(Move::UP), Err(EngineError::Busy));
        assert_eq!(e.put_tile(Point::ZERO, Tile::Box), Err(EngineError::Busy));
    }

    #[test]
    fn next_frame_without_a_move() {
        let mut e = engine(&["@"]);
        assert_eq!(e.next_frame(), Err(EngineError::NoActiveAnimation));
    }

    #[test]
    fn zero_length_move_commits_at_once() {
        let mut e = engine(&["@"]);
        assert_eq!(e.begin(Move::Recenter), Ok(Advance::Finished(vec![])));
        assert!(!e.is_animating());
        assert_eq!(e.state().time, 0);
        assert_eq!(e.revision(), 0);
    }

    #[test]
    fn reset_zeroes_time_and_takes_full_length() {
        let mut e = engine(&["@ ", "##"]);
        e.play_out(Move::RIGHT).unwrap();
        e.begin(Move::Reset).unwrap();
        let mut frames = 1;
        while e.next_frame().unwrap() == Advance::Playing {
            frames += 1;
        }
        assert_eq!(frames, RESET_FRAMES);
        assert_eq!(e.state().time, 0);
        assert_eq!(e.state().player.pos, Point::ZERO);
    }

    #[test]
    fn fragile_ceiling_breaks_on_fourth_jump() {
        let mut e = engine(&["%", " ", " ", " ", "@"]);
        let mut s = e.state().clone();
        s.player.impetus = FULL_IMPETUS;
        e = Engine::new(s, DebugConfig::default());
        for _ in 0..3 {
            assert!(e.play_out(Move::UP).unwrap().is_empty());
        }
        let events = e.play_out(Move::UP).unwrap();
        assert_eq!(events, vec![GameEvent::BlockMelted { pos: Point::new(0, -4) }]);
        assert_eq!(e.state().tile_at(Point::new(0, -4)), Tile::Empty);
    }

    #[test]
    fn fragile_ceiling_out_of_reach_survives() {
        let mut s = state(&["%", " ", " ", " ", " ", "@"]);
        s.player.impetus = FULL_IMPETUS;
        let mut e = Engine::new(s, DebugConfig::default());
        for _ in 0..4 {
            assert!(e.play_out(Move::UP).unwrap().is_empty());
        }
        assert_eq!(e.state().player.pos, Point::new(0, -4));
        assert_eq!(e.state().tile_at(Point::new(0, -FULL_IMPETUS - 1)), Tile::FragileBox);
    }

    #[test]
    fn put_tile_bumps_revision() {
        let mut e = engine(&["@"]);
        e.put_tile(Point::new(0, 1), Tile::Box).unwrap();
        assert_eq!(e.revision(), 1);
        assert_eq!(e.state().tile_at(Point::new(0, 1)), Tile::Box);
        e.set_bus(Bus::Red, true).unwrap();
        assert_eq!(e.revision(), 2);
    }

    #[test]
    fn procedural_world_evicts_offscreen_chunks() {
        let cache = Rc::new(ChunkCache::new(11, false));
        let s = GameState::new(Terrain::Procedural(cache.clone()), Point::ZERO, Viewport::new(Point::new(15, 11), 1));
        // Touch a far-away chunk; it must be gone after the next commit.
        s.tile_at(Point::new(500, 500));
        assert_eq!(cache.cached_chunks(), 1);
        let mut e = Engine::new(s, DebugConfig::default());
        e.play_out(Move::DOWN).unwrap();
        assert!(cache.cached_chunks() >= 1);
        // Nothing left outside the view for a second sweep to drop.
        assert_eq!(cache.retain_visible(e.state().viewport.rect()), 0);
    }

    // ── Properties ──

    const LEGEND: [char; 10] = [' ', ' ', '#', '%', 'U', 'W', '^', '$', 'o', 'f'];

    fn arb_rows() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec(prop::sample::select(LEGEND.to_vec()), 49).prop_map(|cells| {
            cells
                .chunks(7)
                .enumerate()
                .map(|(y, row)| {
                    row.iter()
                        .enumerate()
                        .map(|(x, &c)| if x == 3 && y == 3 { '@' } else { c })
                        .collect()
                })
                .collect()
        })
    }

    fn arb_move() -> impl Strategy<Value = Move> {
        prop::sample::select(vec![
            Move::UP,
            Move::DOWN,
            Move::LEFT,
            Move::RIGHT,
            Move::UP_LEFT,
            Move::UP_RIGHT,
            Move::Reset,
            Move::Recenter,
        ])
    }

    fn state_from(rows: &[String], impetus: i32, coins: u32) -> GameState {
        let refs: Vec<&str> = rows.iter().map(String::as_str).collect();
        let mut s = state(&refs);
        s.player.impetus = impetus;
        s.inventory.coins = coins;
        s
    }

    proptest! {
        #[test]
        fn prop_complete_application_is_idempotent(
            rows in arb_rows(),
            moves in prop::collection::vec(arb_move(), 0..12),
            impetus in 0i32..7,
            coins in 0u32..3,
        ) {
            let mut s = state_from(&rows, impetus, coins);
            for mv in moves {
                let anims = animate(&s, mv);
                let once = complete(&s, &anims);
                prop_assert_eq!(&complete(&once, &anims), &once);
                s = once;
            }
        }
    }

    proptest! {
        #[test]
        fn prop_engines_agree_on_the_same_moves(
            rows in arb_rows(),
            moves in prop::collection::vec(arb_move(), 0..12),
            impetus in 0i32..7,
        ) {
            let s = state_from(&rows, impetus, 1);
            let mut a = Engine::new(s.clone(), DebugConfig::default());
            let mut b = Engine::new(s, DebugConfig::default());
            for mv in moves {
                prop_assert_eq!(a.play_out(mv), b.play_out(mv));
            }
            prop_assert_eq!(a.state(), b.state());
            prop_assert_eq!(a.revision(), b.revision());
        }
    }

    proptest! {
        #[test]
        fn prop_airborne_up_decays_impetus_by_one(impetus in 0i32..12, jumps in 1usize..6) {
            let mut e = Engine::new(
                GameState { player: state(&["@"]).player.with_impetus(impetus), ..state(&["@"]) },
                DebugConfig::default(),
            );
            let mut expected = impetus;
            for _ in 0..jumps {
                e.play_out(Move::UP).unwrap();
                expected = (expected - 1).max(0);
                prop_assert_eq!(e.state().player.impetus, expected);
                prop_assert!(e.state().player.impetus >= 0);
            }
        }
    }
}
