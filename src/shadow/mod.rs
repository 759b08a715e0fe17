//! the engine stripped of bomb knowledge: a read-only replica driven by an
//! [`Update`] stream rather than by applying [`Action`]s against ground
//! truth. any shadow observer (the solver, a remote client maintaining its
//! own board) sees a [`Cell`] view identical to the authority's, without
//! ever touching [`Cell::bomb`].

use crate::board::{Board, Cell, CellState};
use crate::engine::Update;
use crate::geometry::Point;

/// a client-side board replica. construction mirrors [`crate::board::Board::new`]
/// exactly, so neighbor counts agree with the authority from the first
/// update; every subsequent [`ShadowEngine::apply`] call keeps `cleared`,
/// `marked`, and `state` in lockstep with whatever the authority emitted.
#[derive(Debug, Clone)]
pub struct ShadowEngine {
    board: Board,
}

impl ShadowEngine {
    pub fn new(dims: Point<i32>) -> Self {
        Self {
            board: Board::new(dims),
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// apply one authoritative update, replaying onto this cell the same
    /// `cleared`/`marked` bookkeeping the engine performed on its neighbors.
    /// the promotion/demotion of a neighbor's own state to/from `SCORE_*`
    /// arrives as its own separate `Update` in the stream, so this never
    /// needs to transition anything but the cell the update names.
    pub fn apply(&mut self, update: Update) {
        if !self.board.contains(update.point) {
            return;
        }
        let prev = self.board.get(update.point).state;
        let cell = self.board.get_mut(update.point);
        cell.state = update.state;
        cell.user = update.user;

        match (prev, update.state) {
            (CellState::HIDDEN, s) if s == CellState::MARKED || s == CellState::BOMB => {
                self.bump_marked(update.point, 1);
            }
            (CellState::MARKED, CellState::HIDDEN) => {
                self.bump_marked(update.point, -1);
            }
            (CellState::HIDDEN, s) if s.is_numeric_or_scored() => {
                self.bump_cleared(update.point);
            }
            _ => {
                // a promotion/demotion of this cell's own completeness, or a
                // re-mark by a different user: no neighbor bookkeeping to do.
            }
        }
    }

    fn bump_cleared(&mut self, point: Point<i32>) {
        for n in self.board.neighbors(point, false) {
            self.board.get_mut(n).cleared += 1;
        }
    }

    fn bump_marked(&mut self, point: Point<i32>, delta: i8) {
        for n in self.board.neighbors(point, false) {
            let cell = self.board.get_mut(n);
            if delta > 0 {
                cell.marked += 1;
            } else {
                cell.marked -= 1;
            }
        }
    }

    /// true if every cell-by-cell field (`state`, `neighbors`, `cleared`,
    /// `marked`, `hidden`, `user`) matches between this shadow and an
    /// authoritative board. used by the shadow-equivalence test.
    pub fn matches(&self, other: &Board) -> bool {
        self.board.dims() == other.dims()
            && self
                .board
                .iter()
                .zip(other.iter())
                .all(|((_, a), (_, b))| Self::cells_equal(a, b))
    }

    fn cells_equal(a: &Cell, b: &Cell) -> bool {
        a.state == b.state
            && a.neighbors == b.neighbors
            && a.cleared == b.cleared
            && a.marked == b.marked
            && a.hidden() == b.hidden()
            && a.user == b.user
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Action, ActionKind, Engine};

    #[test]
    fn shadow_tracks_a_single_agent_stream_exactly() {
        let mut engine = Engine::new(Point::new(20, 15), 0.12, 11);
        let mut shadow = ShadowEngine::new(Point::new(20, 15));

        for u in engine.reset() {
            shadow.apply(u);
        }
        assert!(shadow.matches(engine.board()));

        for act in [
            Action::new(ActionKind::Open, Point::new(3, 3), 1),
            Action::new(ActionKind::Mark, Point::new(0, 0), 1),
            Action::new(ActionKind::Unmark, Point::new(0, 0), 1),
        ] {
            for u in engine.apply(act) {
                shadow.apply(u);
            }
            assert!(shadow.matches(engine.board()), "diverged after {act:?}");
        }
    }

    #[test]
    fn shadow_ignores_updates_outside_its_bounds() {
        let mut shadow = ShadowEngine::new(Point::new(5, 5));
        shadow.apply(Update {
            state: CellState::ONE,
            point: Point::new(50, 50),
            user: 1,
        });
        assert!(shadow.board().iter().all(|(_, c)| c.state == CellState::HIDDEN));
    }
}
