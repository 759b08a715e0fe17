//! the deductive agent: consumes an [`Update`] stream through a
//! [`ShadowEngine`], derives provably-safe `OPEN`/`MARK` actions by
//! single-cell constraint propagation, and picks which one to emit next
//! using a spatial priority structure so a player's action stream reads as
//! spatially coherent rather than random.

use crate::UserId;
use crate::board::CellState;
use crate::engine::{Action, ActionKind, Update};
use crate::geometry::Point;
use crate::shadow::ShadowEngine;
use crate::spatial::{KdTree, Value};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// how the solver picks among several provably-safe pending actions.
/// `Nearest` is the production behavior (spatially coherent action
/// streams); `Random` exists for benchmarking against it — same
/// bookkeeping, a cheaper but spatially incoherent pop rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Nearest,
    Random,
}

/// the pending-action store, varying by [`Strategy`]: a k-d tree keyed by
/// point for nearest-to-target lookup, or a flat vector popped by
/// random swap-and-pop.
#[derive(Debug)]
enum Pending {
    Nearest(KdTree),
    Random(Vec<Value>),
}

impl Pending {
    fn new(strategy: Strategy) -> Self {
        match strategy {
            Strategy::Nearest => Pending::Nearest(KdTree::new()),
            Strategy::Random => Pending::Random(Vec::new()),
        }
    }

    fn insert(&mut self, value: Value) {
        match self {
            Pending::Nearest(tree) => {
                tree.insert(value);
            }
            Pending::Random(vec) => {
                if !vec.iter().any(|v| v.point == value.point) {
                    vec.push(value);
                }
            }
        }
    }

    fn remove(&mut self, point: Point<i32>) {
        match self {
            Pending::Nearest(tree) => {
                tree.remove(point);
            }
            Pending::Random(vec) => vec.retain(|v| v.point != point),
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            Pending::Nearest(tree) => tree.is_empty(),
            Pending::Random(vec) => vec.is_empty(),
        }
    }

    /// remove and return one pending value: nearest to `target` by
    /// Manhattan distance for `Nearest`, an arbitrary one via
    /// swap-and-pop for `Random`.
    fn pop_next(&mut self, target: Point<i32>, rng: &mut SmallRng) -> Option<Value> {
        match self {
            Pending::Nearest(tree) => tree.pop_closest(target),
            Pending::Random(vec) => {
                if vec.is_empty() {
                    None
                } else {
                    let i = rng.random_range(0..vec.len());
                    let last = vec.len() - 1;
                    vec.swap(i, last);
                    vec.pop()
                }
            }
        }
    }
}

fn tag_of(kind: ActionKind) -> i32 {
    match kind {
        ActionKind::Open => 0,
        ActionKind::Mark => 1,
        _ => unreachable!("only OPEN/MARK are ever queued as pending actions"),
    }
}

fn kind_of(tag: i32) -> ActionKind {
    match tag {
        0 => ActionKind::Open,
        1 => ActionKind::Mark,
        _ => unreachable!("pending action tags are only ever 0 (open) or 1 (mark)"),
    }
}

/// a deductive solver: owns a [`ShadowEngine`] replica and a [`Pending`]
/// action store, and emits one `OPEN`/`MARK` action per call to [`Solver::step`].
#[derive(Debug)]
pub struct Solver {
    user: UserId,
    shadow: ShadowEngine,
    pending: Pending,
    rolling: Point<f32>,
    rng: SmallRng,
}

impl Solver {
    /// the rolling target is seeded to a uniformly random point within
    /// board bounds — this is what makes several concurrent solvers diverge
    /// instead of starting in the same region. `seed == 0` draws a fresh
    /// seed from the clock, matching [`crate::engine::Engine::new`].
    pub fn new(dims: Point<i32>, user: UserId, strategy: Strategy, seed: u64) -> Self {
        let seed = if seed == 0 { crate::engine::clock_seed() } else { seed };
        let mut rng = SmallRng::seed_from_u64(seed);
        let rolling = Point::new(
            rng.random_range(0.0..dims.x as f32),
            rng.random_range(0.0..dims.y as f32),
        );
        Self {
            user,
            shadow: ShadowEngine::new(dims),
            pending: Pending::new(strategy),
            rolling,
            rng,
        }
    }

    pub fn shadow(&self) -> &ShadowEngine {
        &self.shadow
    }

    /// how fast the rolling target chases this solver's own last action.
    const DECAY: f32 = 0.05;

    /// consume a batch of updates and return the next action: `PASS` if
    /// nothing is currently provably safe.
    pub fn step(&mut self, updates: &[Update], paused: bool) -> Action {
        for &u in updates {
            self.shadow.apply(u);
            if u.user == self.user {
                let p: Point<f32> = u.point.into();
                self.rolling.x = self.rolling.x * (1.0 - Self::DECAY) + p.x * Self::DECAY;
                self.rolling.y = self.rolling.y * (1.0 - Self::DECAY) + p.y * Self::DECAY;
            }
            self.pending.remove(u.point);
        }

        for &u in updates {
            for n in self.shadow.board().neighbors(u.point, true) {
                self.deduce_around(n);
            }
        }

        if !paused {
            while !self.pending.is_empty() {
                let target: Point<i32> = self.rolling.into();
                let Some(value) = self.pending.pop_next(target, &mut self.rng) else {
                    break;
                };
                if self.shadow.board().get(value.point).state == CellState::HIDDEN {
                    return Action::new(kind_of(value.value), value.point, self.user);
                }
            }
        }

        Action::new(ActionKind::Pass, Point::new(0, 0), self.user)
    }

    /// single-cell constraint propagation around a revealed numeral `n`:
    /// if its marked neighbors already match its number, every hidden
    /// neighbor is safe to `OPEN`; if marked-plus-hidden matches, every
    /// hidden neighbor is a bomb and should be `MARK`ed.
    fn deduce_around(&mut self, n: Point<i32>) {
        let cell = *self.shadow.board().get(n);
        if !cell.state.is_numeric() || cell.hidden() == 0 {
            return;
        }
        let count = cell.state.low_count();
        let kind = if count == cell.marked {
            ActionKind::Open
        } else if count == cell.marked + cell.hidden() {
            ActionKind::Mark
        } else {
            return;
        };
        let tag = tag_of(kind);
        for nn in self.shadow.board().neighbors(n, false) {
            if self.shadow.board().get(nn).state == CellState::HIDDEN {
                self.pending.insert(Value::new(tag, nn));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Engine;

    fn run_to_completion(
        engine: &mut Engine,
        solver: &mut Solver,
        initial: Vec<Update>,
        cap: usize,
    ) -> usize {
        let mut updates = initial;
        let mut steps = 0;
        loop {
            let action = solver.step(&updates, false);
            if action.kind == ActionKind::Pass {
                break;
            }
            assert!(matches!(action.kind, ActionKind::Open | ActionKind::Mark));
            updates = engine.apply(action);
            assert!(engine.validate());
            steps += 1;
            assert!(steps < cap, "solver did not converge within {cap} steps");
        }
        steps
    }

    #[test]
    fn solver_only_ever_opens_cells_it_has_deduced_safe() {
        // a single solver's own deductions are provably safe: it should
        // never trigger a BOMB update against its own actions.
        let mut engine = Engine::new(Point::new(35, 20), 0.1, 42);
        let initial = engine.reset();
        let mut solver = Solver::new(
            Point::new(35, 20),
            1,
            Strategy::Nearest,
            42,
        );

        let mut updates = initial;
        for _ in 0..4000 {
            let action = solver.step(&updates, false);
            if action.kind == ActionKind::Pass {
                break;
            }
            updates = engine.apply(action);
            assert!(
                !updates.iter().any(|u| u.state == CellState::BOMB && u.user == 1),
                "solver detonated a bomb via its own deduced action"
            );
            assert!(engine.validate());
        }
    }

    #[test]
    fn solver_terminates_and_leaves_a_valid_board() {
        // a lone deductive solver doesn't always fully clear a board —
        // genuine 50/50 guesses can remain — but it must always terminate
        // and never leave the board in an invalid state.
        let mut engine = Engine::new(Point::new(35, 20), 0.1, 7);
        let initial = engine.reset();
        let mut solver = Solver::new(
            Point::new(35, 20),
            1,
            Strategy::Nearest,
            7,
        );
        run_to_completion(&mut engine, &mut solver, initial, 10_000);
        assert!(engine.validate());
    }

    #[test]
    fn random_strategy_also_terminates() {
        let mut engine = Engine::new(Point::new(20, 20), 0.12, 99);
        let initial = engine.reset();
        let mut solver = Solver::new(
            Point::new(20, 20),
            1,
            Strategy::Random,
            99,
        );
        run_to_completion(&mut engine, &mut solver, initial, 10_000);
        assert!(engine.validate());
    }

    #[test]
    fn pending_actions_are_cleared_by_intervening_updates() {
        // if another update reveals a pending point isn't HIDDEN anymore,
        // the solver must discard rather than replay it.
        let mut engine = Engine::new(Point::new(10, 10), 0.1, 3);
        let initial = engine.reset();
        let mut solver = Solver::new(Point::new(10, 10), 1, Strategy::Nearest, 3);
        let _ = solver.step(&initial, false);
        // stepping repeatedly should never panic or return an action on a
        // non-hidden cell, regardless of how many intervening updates arrive.
        let mut updates = initial;
        for _ in 0..200 {
            let action = solver.step(&updates, false);
            if action.kind == ActionKind::Pass {
                break;
            }
            assert_eq!(engine.board().get(action.point).state, CellState::HIDDEN);
            updates = engine.apply(action);
        }
    }
}
