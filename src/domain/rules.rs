/// Move resolution: truth-table driven.
///
/// Pure functions over a `Board`: no side effects, no clock, no randomness.
/// They decide what discrete transition a move produces; the animator turns
/// that into state changes.
///
/// `P` is the player position, `I` its impetus, `dx` the horizontal
/// direction of the move. "open" and "grab" are `Board::ropen` and
/// `Board::rgrabbable`. First matching row wins.
///
/// ### Down
/// ┌──────────────────────┬─────────┬─────────┬────────────────────────┐
/// │ Condition             │ dpos    │ impetus │ posture                │
/// ├──────────────────────┼─────────┼─────────┼────────────────────────┤
/// │ open(0,1)             │ (0,1)   │ 0       │ Stand                  │
/// │ otherwise             │ (0,0)   │ 0       │ Crouch (Stand if quiet)│
/// └──────────────────────┴─────────┴─────────┴────────────────────────┘
///
/// ### Up
/// ┌──────────────────────┬──────────────────────────────┬────────────┐
/// │ Condition             │ Result                        │ Forced     │
/// ├──────────────────────┼──────────────────────────────┼────────────┤
/// │ I>0, open(0,-1)       │ (0,-1), Stand, I kept         │            │
/// │ I>0                   │ quiet Down                    │ (0,-1)     │
/// │ I=0                   │ quiet Down                    │            │
/// └──────────────────────┴──────────────────────────────┴────────────┘
///
/// ### Horizontal (Left / Right)
/// ┌──────────────────────────┬──────────────────────────┬──────────┐
/// │ Condition                 │ Result                    │ Forced   │
/// ├──────────────────────────┼──────────────────────────┼──────────┤
/// │ grab(dx,0)                │ (0,0), I=1, AttachWall    │          │
/// │ I>0, !open(0,1), open(dx,0)│ (dx,0), I=0, Stand       │          │
/// │ I>0, !open(0,1)           │ (0,0), I=0, Stand         │ (dx,0)   │
/// │ open(dx,0), open(dx,1)    │ (dx,1), I=0, Stand        │          │
/// │ open(dx,0)                │ (dx,0), I=0, Stand        │          │
/// │ otherwise                 │ quiet Down                │ (dx,0)   │
/// └──────────────────────────┴──────────────────────────┴──────────┘
///
/// ### Diagonal up (UpLeft / UpRight)
/// ┌──────────────────────┬───────────────────────────┬──────────┐
/// │ Condition             │ Result                     │ Forced   │
/// ├──────────────────────┼───────────────────────────┼──────────┤
/// │ I=0                   │ Horizontal                 │          │
/// │ !open(0,-1)           │ Horizontal                 │ + (0,-1) │
/// │ grab(dx,-1)           │ (0,-1), AttachWall, I kept │ (dx,0)   │
/// │ open(dx,-1)           │ (dx,-1), Stand, I kept     │          │
/// │ otherwise             │ quiet Down                 │ (dx,-1)  │
/// └──────────────────────┴───────────────────────────┴──────────┘
///
/// "quiet Down" is the Down rule with crouching suppressed.

use super::entity::{MotiveMove, Posture};
use super::physics::Board;
use super::point::Point;

/// The transition a move proposes, before side effects and animation.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct Motion {
    pub dpos: Point,
    /// Cells (relative to the pre-move position) the player pushes against.
    pub forced: Vec<Point>,
    /// Explicit impetus; `None` means "carry".
    pub impetus: Option<i32>,
    pub posture: Option<Posture>,
}

impl Motion {
    fn to(dx: i32, dy: i32) -> Self {
        Motion { dpos: Point::new(dx, dy), ..Motion::default() }
    }

    fn stay() -> Self {
        Motion::default()
    }

    fn impetus(mut self, impetus: i32) -> Self {
        self.impetus = Some(impetus);
        self
    }

    fn posture(mut self, posture: Posture) -> Self {
        self.posture = Some(posture);
        self
    }

    fn forcing(mut self, dx: i32, dy: i32) -> Self {
        self.forced.push(Point::new(dx, dy));
        self
    }
}

/// Resolve a motive move against the board.
pub fn resolve_motion(board: &Board, mv: MotiveMove) -> Motion {
    match mv {
        MotiveMove::Down => down(board, true),
        MotiveMove::Up => up(board),
        MotiveMove::Left | MotiveMove::Right => horizontal(board, mv.dx()),
        MotiveMove::UpLeft | MotiveMove::UpRight => diagonal_up(board, mv.dx()),
    }
}

fn down(b: &Board, crouch: bool) -> Motion {
    if b.ropen(0, 1) {
        return Motion::to(0, 1).impetus(0).posture(Posture::Stand);
    }
    let posture = if crouch { Posture::Crouch } else { Posture::Stand };
    Motion::stay().impetus(0).posture(posture)
}

fn up(b: &Board) -> Motion {
    if b.impetus() <= 0 {
        return down(b, false);
    }
    if b.ropen(0, -1) {
        Motion::to(0, -1).posture(Posture::Stand)
    } else {
        down(b, false).forcing(0, -1)
    }
}

fn horizontal(b: &Board, dx: i32) -> Motion {
    if b.rgrabbable(dx, 0) {
        return Motion::stay().impetus(1).posture(Posture::AttachWall);
    }

    // Running: grounded with energy left
    if b.impetus() > 0 && !b.ropen(0, 1) {
        return if b.ropen(dx, 0) {
            Motion::to(dx, 0).impetus(0).posture(Posture::Stand)
        } else {
            Motion::stay().forcing(dx, 0).impetus(0).posture(Posture::Stand)
        };
    }

    if b.ropen(dx, 0) {
        let dy = if b.ropen(dx, 1) { 1 } else { 0 };
        Motion::to(dx, dy).impetus(0).posture(Posture::Stand)
    } else {
        down(b, false).forcing(dx, 0)
    }
}

fn diagonal_up(b: &Board, dx: i32) -> Motion {
    if b.impetus() <= 0 {
        return horizontal(b, dx);
    }
    if !b.ropen(0, -1) {
        return horizontal(b, dx).forcing(0, -1);
    }
    if b.rgrabbable(dx, -1) {
        return Motion::to(0, -1).posture(Posture::AttachWall).forcing(dx, 0);
    }
    if b.ropen(dx, -1) {
        return Motion::to(dx, -1).posture(Posture::Stand);
    }
    down(b, false).forcing(dx, -1)
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::Player;
    use crate::domain::physics::tests::Diagram;

    fn motion(rows: &[&str], impetus: i32, mv: MotiveMove) -> Motion {
        let d = Diagram::parse(rows);
        let p = Player::new(Point::ZERO).with_impetus(impetus);
        resolve_motion(&Board::new(&p, &d), mv)
    }

    fn pt(x: i32, y: i32) -> Point {
        Point::new(x, y)
    }

    // ── Down ──

    #[test]
    fn down_into_open_cell() {
        let m = motion(&["@"], 3, MotiveMove::Down);
        assert_eq!(m.dpos, pt(0, 1));
        assert_eq!(m.impetus, Some(0));
        assert_eq!(m.posture, Some(Posture::Stand));
        assert!(m.forced.is_empty());
    }

    #[test]
    fn down_on_floor_crouches() {
        let m = motion(&["@", "#"], 4, MotiveMove::Down);
        assert_eq!(m.dpos, Point::ZERO);
        assert_eq!(m.impetus, Some(0));
        assert_eq!(m.posture, Some(Posture::Crouch));
    }

    // ── Up ──

    #[test]
    fn up_with_impetus_rises_and_keeps_energy() {
        let m = motion(&["@"], 4, MotiveMove::Up);
        assert_eq!(m.dpos, pt(0, -1));
        assert_eq!(m.impetus, None);
        assert_eq!(m.posture, Some(Posture::Stand));
    }

    #[test]
    fn up_into_ceiling_forces_it_and_stands() {
        let m = motion(&["#", "@", "#"], 4, MotiveMove::Up);
        assert_eq!(m.dpos, Point::ZERO);
        assert_eq!(m.forced, vec![pt(0, -1)]);
        assert_eq!(m.posture, Some(Posture::Stand));
    }

    #[test]
    fn up_into_ceiling_while_airborne_drops() {
        let m = motion(&["#", "@"], 2, MotiveMove::Up);
        assert_eq!(m.dpos, pt(0, 1));
        assert_eq!(m.forced, vec![pt(0, -1)]);
    }

    #[test]
    fn up_without_impetus_drops() {
        let m = motion(&["@"], 0, MotiveMove::Up);
        assert_eq!(m.dpos, pt(0, 1));
        assert_eq!(m.impetus, Some(0));
        let m = motion(&["@", "#"], 0, MotiveMove::Up);
        assert_eq!(m.dpos, Point::ZERO);
        assert_eq!(m.posture, Some(Posture::Stand));
    }

    // ── Horizontal ──

    #[test]
    fn grip_wall_attaches_in_place() {
        let m = motion(&["W@"], 0, MotiveMove::Left);
        assert_eq!(m.dpos, Point::ZERO);
        assert_eq!(m.impetus, Some(1));
        assert_eq!(m.posture, Some(Posture::AttachWall));
    }

    #[test]
    fn running_moves_straight_even_over_a_gap() {
        let m = motion(&[" @", " #"], 4, MotiveMove::Left);
        assert_eq!(m.dpos, pt(-1, 0));
        assert_eq!(m.impetus, Some(0));
    }

    #[test]
    fn running_into_wall_forces_it() {
        let m = motion(&["@%", "##"], 4, MotiveMove::Right);
        assert_eq!(m.dpos, Point::ZERO);
        assert_eq!(m.forced, vec![pt(1, 0)]);
        assert_eq!(m.posture, Some(Posture::Stand));
    }

    #[test]
    fn airborne_sideways_drifts_down() {
        let m = motion(&["@ "], 0, MotiveMove::Right);
        assert_eq!(m.dpos, pt(1, 1));
        let m = motion(&["@ ", " #"], 2, MotiveMove::Right);
        assert_eq!(m.dpos, pt(1, 0));
        assert_eq!(m.impetus, Some(0));
    }

    #[test]
    fn airborne_into_wall_falls_and_forces() {
        let m = motion(&["#@"], 2, MotiveMove::Left);
        assert_eq!(m.dpos, pt(0, 1));
        assert_eq!(m.forced, vec![pt(-1, 0)]);
        assert_eq!(m.impetus, Some(0));
    }

    // ── Diagonal up ──

    #[test]
    fn diagonal_without_impetus_is_horizontal() {
        let m = motion(&[" @", "##"], 0, MotiveMove::UpLeft);
        assert_eq!(m, motion(&[" @", "##"], 0, MotiveMove::Left));
    }

    #[test]
    fn diagonal_under_ceiling_degrades_and_forces_ceiling() {
        let m = motion(&[" #", " @", " #"], 4, MotiveMove::UpLeft);
        assert_eq!(m.dpos, pt(-1, 0));
        assert_eq!(m.forced, vec![pt(0, -1)]);
        assert_eq!(m.impetus, Some(0));
    }

    #[test]
    fn diagonal_onto_grip_wall_attaches() {
        let m = motion(&["W ", " @"], 3, MotiveMove::UpLeft);
        assert_eq!(m.dpos, pt(0, -1));
        assert_eq!(m.posture, Some(Posture::AttachWall));
        assert_eq!(m.forced, vec![pt(-1, 0)]);
        assert_eq!(m.impetus, None);
    }

    #[test]
    fn diagonal_open_climbs() {
        let m = motion(&["  ", " @"], 3, MotiveMove::UpRight);
        assert_eq!(m.dpos, pt(1, -1));
        assert_eq!(m.impetus, None);
    }

    #[test]
    fn diagonal_blocked_forward_drops_and_forces() {
        let m = motion(&[" #", "@ "], 3, MotiveMove::UpRight);
        assert_eq!(m.dpos, pt(0, 1));
        assert_eq!(m.forced, vec![pt(1, -1)]);
    }

    #[test]
    fn every_move_defines_a_displacement_of_at_most_one() {
        let rows = ["% W", "#@ ", " U#"];
        for mv in MotiveMove::ALL {
            for imp in 0..=6 {
                let m = motion(&rows, imp, mv);
                assert!(m.dpos.x.abs() <= 1 && m.dpos.y.abs() <= 1, "{mv:?} {imp}");
            }
        }
    }
}
