use crate::UserId;
use crate::board::CellState;
use crate::geometry::Point;

/// a user intent. the first three mutate the board; the rest are
/// session-level controls the server/runner interpret directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Pass,
    Open,
    Mark,
    Unmark,
    Reset,
    Pause,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Action {
    pub kind: ActionKind,
    pub point: Point<i32>,
    pub user: UserId,
}

impl Action {
    pub fn new(kind: ActionKind, point: Point<i32>, user: UserId) -> Self {
        Self { kind, point, user }
    }

    pub fn pass() -> Self {
        Self::new(ActionKind::Pass, Point::new(0, 0), 0)
    }
}

/// a broadcastable record of one cell's state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Update {
    pub state: CellState,
    pub point: Point<i32>,
    pub user: UserId,
}
