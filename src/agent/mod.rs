//! the original source's virtual `Agent` base class with three concrete
//! implementations (SFML UI, WebSocket, deductive) collapses here into one
//! tagged variant exposing a single [`Agent::step`] operation; a simulation
//! composes a `Vec<Agent>` instead of a `Vec<Box<dyn Agent>>`.
//!
//! the UI and network variants are thin: rendering and transport are out of
//! scope (§1), so both are just an opaque channel of externally-produced
//! [`Action`]s, matching "we treat the UI as a source of `Action` events and
//! a sink of `Update` events" — they differ only in what a caller logs them
//! as, not in behavior.

use crate::engine::{Action, ActionKind, Update};
use crate::geometry::Point;
use crate::solver::Solver;
use std::sync::mpsc::{Receiver, TryRecvError};

/// a channel-backed stand-in for an externally driven agent (a human at a
/// UI, or a remote player over the network). `step` never blocks: it drains
/// at most one already-queued action, passing `PASS` through otherwise.
#[derive(Debug)]
pub struct ExternalAgent {
    user: crate::UserId,
    actions: Receiver<Action>,
}

impl ExternalAgent {
    pub fn new(user: crate::UserId, actions: Receiver<Action>) -> Self {
        Self { user, actions }
    }

    fn step(&mut self, _updates: &[Update], paused: bool) -> Action {
        if paused {
            return Action::new(ActionKind::Pass, Point::new(0, 0), self.user);
        }
        match self.actions.try_recv() {
            Ok(action) => action,
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => {
                Action::new(ActionKind::Pass, Point::new(0, 0), self.user)
            }
        }
    }
}

/// one participant in a standalone simulation: a deductive [`Solver`], or
/// an externally driven UI/network player.
#[derive(Debug)]
pub enum Agent {
    Solver(Solver),
    Ui(ExternalAgent),
    Net(ExternalAgent),
}

impl Agent {
    /// hand the agent this frame's updates and get back the one action it
    /// wants applied next.
    pub fn step(&mut self, updates: &[Update], paused: bool) -> Action {
        match self {
            Agent::Solver(solver) => solver.step(updates, paused),
            Agent::Ui(ext) | Agent::Net(ext) => ext.step(updates, paused),
        }
    }
}
